//! Security event log and the monitor's outbound event stream.
//!
//! The [`EventLog`] keeps the 50 most recent security events, newest first.
//! [`MonitorEvent`] is the collaborator-facing interface: everything the
//! rendering layer needs arrives as one of its variants over a bounded
//! channel, so a slow frontend can never stall a scan loop.

use crate::model::{
    DeviceRecord, OverviewMetrics, PingOutcome, PingTarget, PortObservation, SecurityEvent,
    Severity,
};
use crate::realtime::ConnectionState;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// Default retention of the security event log.
pub const DEFAULT_EVENT_CAPACITY: usize = 50;

/// Bounded, most-recent-first log of security events.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    events: Mutex<VecDeque<SecurityEvent>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Record an event at the head of the log, discarding the oldest entry
    /// once past capacity.
    pub fn push(&self, event: SecurityEvent) {
        let mut events = self.events.lock().expect("event log lock poisoned");
        events.push_front(event);
        events.truncate(self.capacity);
    }

    /// The `n` most recent events, newest first.
    pub fn recent(&self, n: usize) -> Vec<SecurityEvent> {
        let events = self.events.lock().expect("event log lock poisoned");
        events.iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("event log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Events pushed from the monitor core to the rendering layer.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// One new point appended to a chart series.
    Tick {
        series: String,
        label: String,
        value: f64,
    },
    /// A ping probe completed for one target.
    PingUpdate {
        target: PingTarget,
        outcome: PingOutcome,
    },
    /// Full device scan result for the grid.
    DeviceScan(Vec<DeviceRecord>),
    /// Single device refresh from the realtime feed.
    DeviceUpdate(DeviceRecord),
    /// A security event was recorded.
    SecurityEvent(SecurityEvent),
    /// Port monitoring table refresh.
    PortScan(Vec<PortObservation>),
    /// Overview metrics refresh.
    Overview(OverviewMetrics),
    /// Realtime channel state transition.
    ConnectionState(ConnectionState),
    /// Transient status banner (scan progress, degraded mode, alerts).
    Status { message: String, severity: Severity },
}

/// Short name of the event kind, for drop logging.
fn event_name(event: &MonitorEvent) -> &'static str {
    match event {
        MonitorEvent::Tick { .. } => "Tick",
        MonitorEvent::PingUpdate { .. } => "PingUpdate",
        MonitorEvent::DeviceScan(_) => "DeviceScan",
        MonitorEvent::DeviceUpdate(_) => "DeviceUpdate",
        MonitorEvent::SecurityEvent(_) => "SecurityEvent",
        MonitorEvent::PortScan(_) => "PortScan",
        MonitorEvent::Overview(_) => "Overview",
        MonitorEvent::ConnectionState(_) => "ConnectionState",
        MonitorEvent::Status { .. } => "Status",
    }
}

/// Send a monitor event without blocking the producing loop.
///
/// A full channel drops the event with a warning; a closed channel means
/// the frontend is gone (shutdown), which is not worth logging.
pub fn send_event(tx: &mpsc::Sender<MonitorEvent>, event: MonitorEvent) {
    if let Err(err) = tx.try_send(event) {
        match err {
            mpsc::error::TrySendError::Full(ev) => {
                warn!("monitor event channel full, dropping {}", event_name(&ev));
            }
            mpsc::error::TrySendError::Closed(_) => {}
        }
    }
}

/// Record a security event: log it, notify the frontend, and raise a status
/// banner for warning and critical severities.
pub fn record_event(log: &EventLog, tx: &mpsc::Sender<MonitorEvent>, event: SecurityEvent) {
    log.push(event.clone());
    if event.severity >= Severity::Warning {
        send_event(
            tx,
            MonitorEvent::Status {
                message: event.message.clone(),
                severity: event.severity,
            },
        );
    }
    send_event(tx, MonitorEvent::SecurityEvent(event));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_retains_50_most_recent_of_60() {
        let log = EventLog::new(50);
        for i in 0..60 {
            log.push(SecurityEvent::new(Severity::Info, format!("event {i}")));
        }
        assert_eq!(log.len(), 50);
        let recent = log.recent(50);
        assert_eq!(recent.len(), 50);
        // Newest first: 59 down to 10.
        assert_eq!(recent[0].message, "event 59");
        assert_eq!(recent[49].message, "event 10");
    }

    #[test]
    fn test_event_log_recent_subset() {
        let log = EventLog::default();
        log.push(SecurityEvent::new(Severity::Info, "first"));
        log.push(SecurityEvent::new(Severity::Warning, "second"));
        let recent = log.recent(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "second");
    }

    #[tokio::test]
    async fn test_record_event_banners_only_warnings() {
        let log = EventLog::default();
        let (tx, mut rx) = mpsc::channel(16);

        record_event(&log, &tx, SecurityEvent::new(Severity::Info, "quiet"));
        record_event(&log, &tx, SecurityEvent::new(Severity::Warning, "loud"));

        let mut banners = 0;
        let mut events = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                MonitorEvent::Status { .. } => banners += 1,
                MonitorEvent::SecurityEvent(_) => events += 1,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert_eq!(events, 2);
        assert_eq!(banners, 1);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_send_event_tolerates_full_channel() {
        let (tx, rx) = mpsc::channel(1);
        send_event(
            &tx,
            MonitorEvent::Status {
                message: "one".to_string(),
                severity: Severity::Info,
            },
        );
        // Second send hits a full channel and must not panic.
        send_event(
            &tx,
            MonitorEvent::Status {
                message: "two".to_string(),
                severity: Severity::Info,
            },
        );
        drop(rx);
        // Closed channel is silently ignored.
        send_event(
            &tx,
            MonitorEvent::Status {
                message: "three".to_string(),
                severity: Severity::Info,
            },
        );
    }
}
