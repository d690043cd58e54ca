//! Bounded time-series storage backing the live charts.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer of `(label, value)` samples with strict FIFO eviction.
///
/// Appends are serialized by the owning chart entry, so at most one sample
/// is evicted per append. Out-of-range values (negative, NaN) are stored
/// as-is; clamping is a presentation concern of the renderer.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    capacity: usize,
    points: VecDeque<(String, f64)>,
}

/// Owned copy of a series for export and diagnostics. Shares no storage
/// with the live buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl TimeSeriesBuffer {
    /// Create a buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "series capacity must be positive");
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, evicting the oldest entry once past capacity.
    pub fn append(&mut self, label: impl Into<String>, value: f64) {
        self.points.push_back((label.into(), value));
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended sample, if any.
    pub fn latest(&self) -> Option<(&str, f64)> {
        self.points.back().map(|(label, value)| (label.as_str(), *value))
    }

    /// Values in append order, for renderers that only need the numbers.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, value)| *value)
    }

    /// Copy-on-read export of the buffer contents.
    pub fn snapshot(&self) -> SeriesSnapshot {
        SeriesSnapshot {
            labels: self.points.iter().map(|(label, _)| label.clone()).collect(),
            values: self.points.iter().map(|(_, value)| *value).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_within_capacity() {
        let mut series = TimeSeriesBuffer::new(5);
        for i in 0..3 {
            series.append(i.to_string(), i as f64);
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.latest(), Some(("2", 2.0)));
    }

    #[test]
    fn test_fifo_eviction_holds_after_every_append() {
        let mut series = TimeSeriesBuffer::new(4);
        for i in 0..20 {
            series.append(i.to_string(), i as f64);
            assert!(series.len() <= 4, "length bound violated at append {i}");
        }
        let snapshot = series.snapshot();
        assert_eq!(snapshot.labels, vec!["16", "17", "18", "19"]);
        assert_eq!(snapshot.values, vec![16.0, 17.0, 18.0, 19.0]);
    }

    #[test]
    fn test_capacity_24_retains_last_24_of_30() {
        let mut series = TimeSeriesBuffer::new(24);
        for i in 0..30 {
            series.append(i.to_string(), i as f64);
        }
        let snapshot = series.snapshot();
        assert_eq!(snapshot.labels.len(), 24);
        let expected: Vec<String> = (6..30).map(|i| i.to_string()).collect();
        assert_eq!(snapshot.labels, expected);
    }

    #[test]
    fn test_snapshot_is_detached_from_live_buffer() {
        let mut series = TimeSeriesBuffer::new(3);
        series.append("a", 1.0);
        let snapshot = series.snapshot();
        series.append("b", 2.0);
        assert_eq!(snapshot.labels, vec!["a"]);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_out_of_range_values_accepted() {
        let mut series = TimeSeriesBuffer::new(3);
        series.append("neg", -5.0);
        series.append("nan", f64::NAN);
        assert_eq!(series.len(), 2);
        let snapshot = series.snapshot();
        assert_eq!(snapshot.values[0], -5.0);
        assert!(snapshot.values[1].is_nan());
    }
}
