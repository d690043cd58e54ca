//! TUI application state and event handling.
//!
//! [`App`] mirrors the monitor's outbound events into displayable state;
//! drawing reads it immutably each frame.

use crate::events::MonitorEvent;
use crate::model::{
    DashboardSection, DeviceRecord, OverviewMetrics, PingOutcome, PingTarget, PortObservation,
    SecurityEvent, Severity, TrafficStats,
};
use crate::realtime::ConnectionState;
use std::time::{Duration, Instant};

/// Events kept in the local alert mirror.
const EVENT_MIRROR_CAPACITY: usize = 50;

/// Application running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Quitting,
}

/// Frontend state fed by [`MonitorEvent`]s.
#[derive(Debug)]
pub struct App {
    pub state: AppState,
    /// Visible dashboard section (tab).
    pub section: DashboardSection,
    /// Realtime channel state for the header badge.
    pub connection: ConnectionState,
    /// Latest probe result per target, in first-seen order.
    pub ping_rows: Vec<(PingTarget, PingOutcome)>,
    pub devices: Vec<DeviceRecord>,
    pub ports: Vec<PortObservation>,
    /// Local mirror of the security event log, newest first.
    pub events: Vec<SecurityEvent>,
    pub overview: Option<OverviewMetrics>,
    pub traffic: TrafficStats,
    /// Transient status banner with the instant it was raised.
    pub banner: Option<(String, Severity, Instant)>,
    pub last_update: Option<Instant>,
}

impl App {
    pub fn new() -> Self {
        Self {
            state: AppState::Running,
            section: DashboardSection::default(),
            connection: ConnectionState::Connecting,
            ping_rows: Vec::new(),
            devices: Vec::new(),
            ports: Vec::new(),
            events: Vec::new(),
            overview: None,
            traffic: TrafficStats::default(),
            banner: None,
            last_update: None,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.state == AppState::Quitting
    }

    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    /// Cycle to the next section tab.
    pub fn next_section(&mut self) {
        let all = DashboardSection::ALL;
        let index = all.iter().position(|s| *s == self.section).unwrap_or(0);
        self.section = all[(index + 1) % all.len()];
    }

    /// Cycle to the previous section tab.
    pub fn prev_section(&mut self) {
        let all = DashboardSection::ALL;
        let index = all.iter().position(|s| *s == self.section).unwrap_or(0);
        self.section = all[(index + all.len() - 1) % all.len()];
    }

    pub fn select_section(&mut self, index: usize) {
        if let Some(section) = DashboardSection::ALL.get(index) {
            self.section = *section;
        }
    }

    /// Fold one monitor event into display state.
    pub fn handle_event(&mut self, event: MonitorEvent) {
        self.last_update = Some(Instant::now());
        match event {
            MonitorEvent::Tick { .. } => {}
            MonitorEvent::PingUpdate { target, outcome } => {
                if let Some(row) = self.ping_rows.iter_mut().find(|(t, _)| t.host == target.host) {
                    row.1 = outcome;
                } else {
                    self.ping_rows.push((target, outcome));
                }
            }
            MonitorEvent::DeviceScan(devices) => {
                self.devices = devices;
            }
            MonitorEvent::DeviceUpdate(device) => {
                if let Some(existing) = self.devices.iter_mut().find(|d| d.mac == device.mac) {
                    existing.status = device.status;
                    existing.last_seen = device.last_seen;
                }
            }
            MonitorEvent::SecurityEvent(event) => {
                self.events.insert(0, event);
                self.events.truncate(EVENT_MIRROR_CAPACITY);
            }
            MonitorEvent::PortScan(ports) => {
                self.ports = ports;
            }
            MonitorEvent::Overview(metrics) => {
                self.overview = Some(metrics);
            }
            MonitorEvent::ConnectionState(state) => {
                self.connection = state;
            }
            MonitorEvent::Status { message, severity } => {
                self.banner = Some((message, severity, Instant::now()));
            }
        }
    }

    /// Drop the banner once it has been on screen long enough.
    pub fn clear_stale_banner(&mut self, ttl: Duration) {
        if let Some((_, _, raised_at)) = &self.banner {
            if raised_at.elapsed() >= ttl {
                self.banner = None;
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProbeStatus;

    fn outcome(latency: u64) -> PingOutcome {
        PingOutcome {
            latency_ms: Some(latency),
            status: ProbeStatus::Online,
        }
    }

    #[test]
    fn test_ping_rows_upsert_by_host() {
        let mut app = App::new();
        let target = PingTarget::new("8.8.8.8", "Public DNS");

        app.handle_event(MonitorEvent::PingUpdate {
            target: target.clone(),
            outcome: outcome(20),
        });
        app.handle_event(MonitorEvent::PingUpdate {
            target,
            outcome: outcome(35),
        });

        assert_eq!(app.ping_rows.len(), 1);
        assert_eq!(app.ping_rows[0].1.latency_ms, Some(35));
    }

    #[test]
    fn test_event_mirror_is_bounded() {
        let mut app = App::new();
        for i in 0..60 {
            app.handle_event(MonitorEvent::SecurityEvent(SecurityEvent::new(
                Severity::Info,
                format!("event {i}"),
            )));
        }
        assert_eq!(app.events.len(), 50);
        assert_eq!(app.events[0].message, "event 59");
    }

    #[test]
    fn test_section_cycling_wraps() {
        let mut app = App::new();
        assert_eq!(app.section, DashboardSection::Overview);
        app.prev_section();
        assert_eq!(app.section, DashboardSection::Reports);
        app.next_section();
        assert_eq!(app.section, DashboardSection::Overview);
    }

    #[test]
    fn test_stale_banner_cleared() {
        let mut app = App::new();
        app.handle_event(MonitorEvent::Status {
            message: "scan complete".to_string(),
            severity: Severity::Info,
        });
        app.clear_stale_banner(Duration::from_secs(60));
        assert!(app.banner.is_some());
        app.clear_stale_banner(Duration::ZERO);
        assert!(app.banner.is_none());
    }
}
