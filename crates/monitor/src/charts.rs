//! Chart registry: owns per-panel chart state and coordinates redraws.
//!
//! The registry holds one entry per dashboard chart, keyed by panel id.
//! Time-series charts are fed point-by-point through
//! [`TimeSeriesBuffer`] appends; breakdown charts (bandwidth, protocol mix)
//! are recomputed wholesale each tick. Drawing itself is delegated to a
//! [`ChartRenderer`], so the same registry drives the terminal frontend and
//! the recording renderer used in tests.

use crate::error::MonitorError;
use crate::series::{SeriesSnapshot, TimeSeriesBuffer};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Visual form of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
    Pie,
}

/// How a redraw should be presented.
///
/// High-frequency ticks use [`RedrawMode::Instant`] to avoid animation jank;
/// full reloads animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawMode {
    Animated,
    Instant,
}

/// Rendering backend for the registry.
pub trait ChartRenderer: Send + Sync {
    /// Whether the panel with this id is present in the active frontend.
    fn is_mounted(&self, id: &str) -> bool;
    /// Request a redraw of one chart.
    fn redraw(&self, id: &str, mode: RedrawMode);
    /// Propagate a viewport resize to one chart.
    fn resize(&self, id: &str);
    /// Release any renderer-side resource for a destroyed chart.
    fn release(&self, id: &str);
}

/// Renderer for headless operation: every panel counts as mounted and all
/// drawing requests are dropped.
#[derive(Debug, Default)]
pub struct HeadlessRenderer;

impl ChartRenderer for HeadlessRenderer {
    fn is_mounted(&self, _id: &str) -> bool {
        true
    }
    fn redraw(&self, _id: &str, _mode: RedrawMode) {}
    fn resize(&self, _id: &str) {}
    fn release(&self, _id: &str) {}
}

/// Handle to a successfully created chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartId(String);

impl ChartId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
struct ChartEntry {
    kind: ChartKind,
    /// Named series in declaration order; each backed by its own buffer.
    series: Vec<(String, TimeSeriesBuffer)>,
    /// Whole-dataset slices for breakdown charts.
    slices: Vec<(String, f64)>,
}

/// Exported copy of one chart's full state.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub kind: ChartKind,
    pub series: Vec<(String, SeriesSnapshot)>,
    pub slices: Vec<(String, f64)>,
}

/// Registry of live charts, shared by the refresh loops and the realtime
/// channel.
pub struct ChartRegistry {
    charts: DashMap<String, ChartEntry>,
    renderer: Arc<dyn ChartRenderer>,
}

impl ChartRegistry {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            charts: DashMap::new(),
            renderer,
        }
    }

    /// Create a chart bound to the panel `id`.
    ///
    /// Returns `None` when the panel is not mounted: panels are rendered
    /// conditionally per visible section, so this is a recoverable
    /// condition, not an error.
    pub fn create(
        &self,
        id: &str,
        kind: ChartKind,
        series_names: &[&str],
        capacity: usize,
    ) -> Option<ChartId> {
        if !self.renderer.is_mounted(id) {
            warn!(
                "skipping chart creation: {}",
                MonitorError::MountPointMissing(id.to_string())
            );
            return None;
        }
        let entry = ChartEntry {
            kind,
            series: series_names
                .iter()
                .map(|name| (name.to_string(), TimeSeriesBuffer::new(capacity)))
                .collect(),
            slices: Vec::new(),
        };
        self.charts.insert(id.to_string(), entry);
        Some(ChartId(id.to_string()))
    }

    /// Push one new point into each of the chart's series, then request an
    /// instant (no-animation) redraw.
    ///
    /// `values` pairs up with the chart's series in declaration order; a
    /// missing chart means the panel is not visible and the update is
    /// skipped.
    pub fn update_in_place(&self, id: &str, label: &str, values: &[f64]) {
        let Some(mut entry) = self.charts.get_mut(id) else {
            return;
        };
        for ((_, buffer), value) in entry.series.iter_mut().zip(values) {
            buffer.append(label, *value);
        }
        drop(entry);
        self.renderer.redraw(id, RedrawMode::Instant);
    }

    /// Swap the whole dataset of a breakdown chart and animate the redraw.
    pub fn replace(&self, id: &str, slices: Vec<(String, f64)>) {
        let Some(mut entry) = self.charts.get_mut(id) else {
            return;
        };
        entry.slices = slices;
        drop(entry);
        self.renderer.redraw(id, RedrawMode::Animated);
    }

    /// Destroy a chart and release its renderer resource. Destroying an
    /// unknown id is a no-op.
    pub fn destroy(&self, id: &str) {
        if self.charts.remove(id).is_some() {
            self.renderer.release(id);
        }
    }

    /// Propagate a viewport resize to every live chart.
    pub fn resize_all(&self) {
        for entry in self.charts.iter() {
            self.renderer.resize(entry.key());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.charts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    /// Latest value of the first series of a chart, if any.
    pub fn latest_value(&self, id: &str) -> Option<f64> {
        let entry = self.charts.get(id)?;
        let (_, buffer) = entry.series.first()?;
        buffer.latest().map(|(_, value)| value)
    }

    /// Exported copy of one chart's state for diagnostics and reports.
    pub fn snapshot(&self, id: &str) -> Option<ChartSnapshot> {
        let entry = self.charts.get(id)?;
        Some(ChartSnapshot {
            kind: entry.kind,
            series: entry
                .series
                .iter()
                .map(|(name, buffer)| (name.clone(), buffer.snapshot()))
                .collect(),
            slices: entry.slices.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Renderer that records every call, with a configurable mount set.
    #[derive(Default)]
    struct RecordingRenderer {
        unmounted: Vec<String>,
        redraws: Mutex<Vec<(String, RedrawMode)>>,
        resizes: Mutex<Vec<String>>,
        releases: Mutex<Vec<String>>,
    }

    impl RecordingRenderer {
        fn without(ids: &[&str]) -> Self {
            Self {
                unmounted: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl ChartRenderer for RecordingRenderer {
        fn is_mounted(&self, id: &str) -> bool {
            !self.unmounted.iter().any(|u| u == id)
        }
        fn redraw(&self, id: &str, mode: RedrawMode) {
            self.redraws.lock().unwrap().push((id.to_string(), mode));
        }
        fn resize(&self, id: &str) {
            self.resizes.lock().unwrap().push(id.to_string());
        }
        fn release(&self, id: &str) {
            self.releases.lock().unwrap().push(id.to_string());
        }
    }

    fn registry_with(renderer: RecordingRenderer) -> (ChartRegistry, Arc<RecordingRenderer>) {
        let renderer = Arc::new(renderer);
        (ChartRegistry::new(renderer.clone()), renderer)
    }

    #[test]
    fn test_create_fails_without_mount_point() {
        let (registry, _) = registry_with(RecordingRenderer::without(&["hidden-panel"]));
        let handle = registry.create("hidden-panel", ChartKind::Line, &["latency"], 20);
        assert!(handle.is_none());
        assert!(!registry.contains("hidden-panel"));
    }

    #[test]
    fn test_update_in_place_appends_and_redraws_instantly() {
        let (registry, renderer) = registry_with(RecordingRenderer::default());
        registry
            .create("traffic", ChartKind::Line, &["download", "upload"], 24)
            .expect("mounted");

        registry.update_in_place("traffic", "10:00", &[21.5, 8.2]);

        let snapshot = registry.snapshot("traffic").expect("chart exists");
        assert_eq!(snapshot.series.len(), 2);
        assert_eq!(snapshot.series[0].1.values, vec![21.5]);
        assert_eq!(snapshot.series[1].1.values, vec![8.2]);
        assert_eq!(
            renderer.redraws.lock().unwrap().as_slice(),
            &[("traffic".to_string(), RedrawMode::Instant)]
        );
    }

    #[test]
    fn test_replace_swaps_slices_and_animates() {
        let (registry, renderer) = registry_with(RecordingRenderer::default());
        registry
            .create("bandwidth", ChartKind::Doughnut, &[], 1)
            .expect("mounted");

        registry.replace(
            "bandwidth",
            vec![("Used".to_string(), 42.0), ("Available".to_string(), 58.0)],
        );

        let snapshot = registry.snapshot("bandwidth").expect("chart exists");
        assert_eq!(snapshot.slices[0], ("Used".to_string(), 42.0));
        assert_eq!(
            renderer.redraws.lock().unwrap().as_slice(),
            &[("bandwidth".to_string(), RedrawMode::Animated)]
        );
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (registry, renderer) = registry_with(RecordingRenderer::default());
        registry
            .create("uptime", ChartKind::Bar, &["uptime"], 30)
            .expect("mounted");

        registry.destroy("uptime");
        registry.destroy("uptime");
        registry.destroy("never-existed");

        assert!(!registry.contains("uptime"));
        // The renderer resource is released exactly once.
        assert_eq!(renderer.releases.lock().unwrap().as_slice(), &["uptime".to_string()]);
    }

    #[test]
    fn test_update_on_unknown_chart_is_skipped() {
        let (registry, renderer) = registry_with(RecordingRenderer::default());
        registry.update_in_place("missing", "x", &[1.0]);
        assert!(renderer.redraws.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resize_all_touches_every_chart() {
        let (registry, renderer) = registry_with(RecordingRenderer::default());
        registry.create("a", ChartKind::Line, &["s"], 4).unwrap();
        registry.create("b", ChartKind::Pie, &[], 1).unwrap();

        registry.resize_all();

        let mut resizes = renderer.resizes.lock().unwrap().clone();
        resizes.sort();
        assert_eq!(resizes, vec!["a".to_string(), "b".to_string()]);
    }
}
