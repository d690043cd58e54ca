//! Periodic refresh loops: ping, device discovery, security scan, the
//! coarse per-section refresh and the live chart tick.
//!
//! Each loop checks the global monitoring-active flag at the top of every
//! tick and arms its next tick only after the current cycle's work has
//! completed, so clearing the flag lets in-flight schedules lapse without
//! racing a cancellation. Handles are still kept and aborted on stop so a
//! sleeping loop dies immediately.

use crate::events::{MonitorEvent, record_event, send_event};
use crate::model::{CheckStatus, DashboardSection, DeviceRecord, PortState, SecurityEvent, Severity};
use crate::monitor::{CHART_BANDWIDTH, CHART_LATENCY, CHART_TRAFFIC, MonitorState};
use crate::source::synthetic;
use chrono::{Timelike, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// Assumed link capacity for the traffic-anomaly threshold check.
const TRAFFIC_CAPACITY_MBPS: f64 = 100.0;
/// Percentage of capacity above which a traffic anomaly event fires.
const TRAFFIC_ANOMALY_PCT: f64 = 80.0;

/// Orchestrates the monitor's repeating tasks.
pub struct RefreshScheduler {
    state: Arc<MonitorState>,
    /// Global "monitoring active" flag, checked at the top of every tick.
    active: AtomicBool,
    /// Guards against starting the scan loops twice.
    polling_started: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
    /// When each loop last fired, keyed by loop name.
    last_fired: Mutex<HashMap<&'static str, Instant>>,
}

impl RefreshScheduler {
    pub fn new(state: Arc<MonitorState>) -> Arc<Self> {
        Arc::new(Self {
            state,
            active: AtomicBool::new(false),
            polling_started: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
            last_fired: Mutex::new(HashMap::new()),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn polling_started(&self) -> bool {
        self.polling_started.load(Ordering::SeqCst)
    }

    /// Start the three scan loops (ping, device discovery, security).
    ///
    /// Idempotent: returns `false` without side effects when the loops are
    /// already running, which is what makes the realtime channel's fallback
    /// activation safe to call from multiple paths.
    pub fn start_polling(self: &Arc<Self>) -> bool {
        if self.polling_started.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.active.store(true, Ordering::SeqCst);

        let ping = self.spawn_loop(self.state.config.ping_interval, LoopKind::Ping);
        let devices = self.spawn_loop(self.state.config.device_scan_interval, LoopKind::Devices);
        let security = self.spawn_loop(self.state.config.security_scan_interval, LoopKind::Security);

        let mut handles = self.handles.lock().expect("scheduler handle lock poisoned");
        handles.extend([ping, devices, security]);
        true
    }

    /// Start the coarse auto-refresh for the visible section.
    pub fn start_auto_refresh(self: &Arc<Self>) {
        self.active.store(true, Ordering::SeqCst);
        let handle = self.spawn_loop(self.state.config.refresh_interval, LoopKind::SectionRefresh);
        self.handles
            .lock()
            .expect("scheduler handle lock poisoned")
            .push(handle);
    }

    /// Start the live chart tick.
    pub fn start_chart_ticks(self: &Arc<Self>) {
        self.active.store(true, Ordering::SeqCst);
        let handle = self.spawn_loop(self.state.config.chart_tick_interval, LoopKind::ChartTick);
        self.handles
            .lock()
            .expect("scheduler handle lock poisoned")
            .push(handle);
    }

    /// Stop monitoring: clear the active flag and abort every pending loop.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        let handles: Vec<JoinHandle<()>> = self
            .handles
            .lock()
            .expect("scheduler handle lock poisoned")
            .drain(..)
            .collect();
        for handle in handles {
            handle.abort();
        }
    }

    /// When the named loop (`"ping"`, `"devices"`, `"security"`,
    /// `"section-refresh"`, `"chart-tick"`) last started a cycle.
    pub fn last_fired(&self, loop_name: &str) -> Option<Instant> {
        self.last_fired
            .lock()
            .expect("scheduler tick lock poisoned")
            .get(loop_name)
            .copied()
    }

    fn record_fired(&self, kind: LoopKind) {
        self.last_fired
            .lock()
            .expect("scheduler tick lock poisoned")
            .insert(kind.name(), Instant::now());
    }

    fn spawn_loop(self: &Arc<Self>, interval: Duration, kind: LoopKind) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if !scheduler.active.load(Ordering::SeqCst) {
                    debug!(?kind, "monitoring inactive, loop lapsing");
                    break;
                }
                scheduler.record_fired(kind);
                match kind {
                    LoopKind::Ping => ping_cycle(&scheduler.state).await,
                    LoopKind::Devices => {
                        device_cycle(&scheduler.state).await;
                    }
                    LoopKind::Security => security_cycle(&scheduler.state).await,
                    LoopKind::SectionRefresh => refresh_section(&scheduler.state).await,
                    LoopKind::ChartTick => chart_tick(&scheduler.state),
                }
                tokio::time::sleep(interval).await;
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum LoopKind {
    Ping,
    Devices,
    Security,
    SectionRefresh,
    ChartTick,
}

impl LoopKind {
    fn name(&self) -> &'static str {
        match self {
            LoopKind::Ping => "ping",
            LoopKind::Devices => "devices",
            LoopKind::Security => "security",
            LoopKind::SectionRefresh => "section-refresh",
            LoopKind::ChartTick => "chart-tick",
        }
    }
}

/// One ping cycle: probe each target in order, publishing every result as
/// it arrives. A slow or failed target delays but never aborts the rest of
/// the cycle; the cycle's mean latency feeds the realtime latency chart.
pub async fn ping_cycle(state: &MonitorState) {
    let mut latencies = Vec::new();
    for target in &state.config.ping_targets {
        let outcome = state.source.ping(target).await;
        if let Some(latency) = outcome.latency_ms {
            latencies.push(latency as f64);
        }
        send_event(
            &state.tx,
            MonitorEvent::PingUpdate {
                target: target.clone(),
                outcome,
            },
        );
    }

    if !latencies.is_empty() {
        let mean = latencies.iter().sum::<f64>() / latencies.len() as f64;
        let label = Utc::now().format("%H:%M:%S").to_string();
        state.charts.update_in_place(CHART_LATENCY, &label, &[mean]);
        send_event(
            &state.tx,
            MonitorEvent::Tick {
                series: CHART_LATENCY.to_string(),
                label,
                value: mean,
            },
        );
    }
}

/// One device discovery cycle: fetch the inventory, publish the grid
/// update, then run new-device detection.
pub async fn device_cycle(state: &MonitorState) -> Vec<DeviceRecord> {
    let scan = state.source.devices().await;
    send_event(&state.tx, MonitorEvent::DeviceScan(scan.clone()));
    for event in state.inventory.reconcile(&scan) {
        record_event(&state.events, &state.tx, event);
    }
    scan
}

/// One security cycle: three sequential checks, each isolated so one
/// check's findings never suppress the others.
pub async fn security_cycle(state: &MonitorState) {
    service_status_check(state).await;
    traffic_anomaly_check(state);
    open_ports_check(state).await;
}

async fn service_status_check(state: &MonitorState) {
    for check in state.source.security_scan().await {
        if check.status == CheckStatus::Warn {
            record_event(
                &state.events,
                &state.tx,
                SecurityEvent::new(
                    Severity::Warning,
                    format!("Attention required on {}: review configuration", check.name),
                ),
            );
        }
    }
}

fn traffic_anomaly_check(state: &MonitorState) {
    let throughput = state.last_traffic().throughput;
    let current_pct = if throughput > 0.0 {
        (throughput / TRAFFIC_CAPACITY_MBPS * 100.0).min(100.0)
    } else {
        // No live counters yet; sample the synthetic load curve instead.
        synthetic::bandwidth_usage()
    };
    if current_pct > TRAFFIC_ANOMALY_PCT {
        record_event(
            &state.events,
            &state.tx,
            SecurityEvent::new(
                Severity::Warning,
                format!("Elevated network traffic: {current_pct:.1}% of limit"),
            ),
        );
    }
}

async fn open_ports_check(state: &MonitorState) {
    let ports = state.source.ports().await;
    for observation in ports.iter().filter(|p| p.unexpected()) {
        let (severity, actual) = match observation.actual {
            PortState::Open => (Severity::Warning, "open"),
            PortState::Closed => (Severity::Info, "closed"),
        };
        record_event(
            &state.events,
            &state.tx,
            SecurityEvent::new(
                severity,
                format!(
                    "Port {} ({}) in unexpected state: {actual}",
                    observation.port, observation.name
                ),
            ),
        );
    }
    send_event(&state.tx, MonitorEvent::PortScan(ports));
}

/// Reload the data backing whichever section is currently visible.
pub async fn refresh_section(state: &MonitorState) {
    match state.section() {
        DashboardSection::Overview => {
            let metrics = state.source.overview().await;
            state.set_overview(metrics.clone());
            send_event(&state.tx, MonitorEvent::Overview(metrics));
        }
        DashboardSection::Network => {
            ping_cycle(state).await;
            let ports = state.source.ports().await;
            send_event(&state.tx, MonitorEvent::PortScan(ports));
        }
        DashboardSection::Security => service_status_check(state).await,
        DashboardSection::Devices => {
            device_cycle(state).await;
        }
        // Alerts and reports render from already-collected state.
        DashboardSection::Alerts | DashboardSection::Reports => {}
    }
}

/// Append a live sample to the traffic chart and swap the bandwidth
/// breakdown. Runs on its own cadence so the charts keep moving even when
/// the realtime feed is down.
pub fn chart_tick(state: &MonitorState) {
    let now = Utc::now();
    let hour = now.hour() as f64 + now.minute() as f64 / 60.0;
    let (download, upload) = synthetic::traffic_sample(hour);
    let label = now.format("%H:%M").to_string();
    state
        .charts
        .update_in_place(CHART_TRAFFIC, &label, &[download, upload]);
    send_event(
        &state.tx,
        MonitorEvent::Tick {
            series: CHART_TRAFFIC.to_string(),
            label,
            value: download,
        },
    );

    let usage = synthetic::bandwidth_usage();
    state.charts.replace(
        CHART_BANDWIDTH,
        vec![
            ("Used".to_string(), usage),
            ("Available".to_string(), 100.0 - usage),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartKind, HeadlessRenderer};
    use crate::config::MonitorConfig;
    use crate::model::{
        DeviceCategory, DeviceStatus, OverviewMetrics, PingOutcome, PingTarget, PortObservation,
        ProbeStatus, SecurityCheck, TrafficStats,
    };
    use crate::source::DataSource;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    /// Fixed-output source so cycles are deterministic.
    struct StubSource;

    #[async_trait]
    impl DataSource for StubSource {
        async fn ping(&self, _target: &PingTarget) -> PingOutcome {
            PingOutcome {
                latency_ms: Some(25),
                status: ProbeStatus::Online,
            }
        }

        async fn devices(&self) -> Vec<DeviceRecord> {
            vec![
                DeviceRecord {
                    mac: "aa".to_string(),
                    ip: "10.0.0.1".to_string(),
                    name: "Gateway".to_string(),
                    category: DeviceCategory::Router,
                    status: DeviceStatus::Online,
                    last_seen: Utc::now(),
                    manufacturer: None,
                },
                DeviceRecord {
                    mac: "bb".to_string(),
                    ip: "10.0.0.2".to_string(),
                    name: "Workstation".to_string(),
                    category: DeviceCategory::Computer,
                    status: DeviceStatus::Online,
                    last_seen: Utc::now(),
                    manufacturer: None,
                },
            ]
        }

        async fn security_scan(&self) -> Vec<SecurityCheck> {
            vec![
                SecurityCheck {
                    name: "Firewall Status".to_string(),
                    status: CheckStatus::Pass,
                },
                SecurityCheck {
                    name: "VPN Tunnels".to_string(),
                    status: CheckStatus::Warn,
                },
            ]
        }

        async fn ports(&self) -> Vec<PortObservation> {
            vec![PortObservation {
                port: 23,
                name: "Telnet".to_string(),
                expected: PortState::Closed,
                actual: PortState::Open,
            }]
        }

        async fn overview(&self) -> OverviewMetrics {
            OverviewMetrics {
                threats_blocked: 42,
                ..Default::default()
            }
        }
    }

    fn state() -> (Arc<MonitorState>, mpsc::Receiver<MonitorEvent>) {
        let (tx, rx) = mpsc::channel(256);
        let state = Arc::new(MonitorState::new(
            MonitorConfig::default(),
            Arc::new(StubSource),
            Arc::new(HeadlessRenderer),
            tx,
        ));
        let _ = state
            .charts
            .create(CHART_LATENCY, ChartKind::Line, &["latency"], 20);
        let _ = state
            .charts
            .create(CHART_TRAFFIC, ChartKind::Line, &["download", "upload"], 24);
        let _ = state.charts.create(CHART_BANDWIDTH, ChartKind::Doughnut, &[], 1);
        (state, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_ping_cycle_publishes_each_target() {
        let (state, mut rx) = state();
        ping_cycle(&state).await;

        let events = drain(&mut rx);
        let updates = events
            .iter()
            .filter(|e| matches!(e, MonitorEvent::PingUpdate { .. }))
            .count();
        assert_eq!(updates, state.config.ping_targets.len());

        // The cycle mean landed on the latency chart.
        assert_eq!(state.charts.latest_value(CHART_LATENCY), Some(25.0));
    }

    #[tokio::test]
    async fn test_device_cycle_records_new_devices_once() {
        let (state, mut rx) = state();

        device_cycle(&state).await;
        assert_eq!(state.inventory.len(), 2);
        assert_eq!(state.events.len(), 2);

        drain(&mut rx);
        // Second scan of the same devices adds no events.
        device_cycle(&state).await;
        assert_eq!(state.events.len(), 2);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, MonitorEvent::DeviceScan(_))));
        assert!(!events.iter().any(|e| matches!(e, MonitorEvent::SecurityEvent(_))));
    }

    #[tokio::test]
    async fn test_security_cycle_emits_check_and_port_findings() {
        let (state, mut rx) = state();
        // A live throughput below the threshold keeps the anomaly check quiet.
        state.record_traffic(TrafficStats {
            throughput: 10.0,
            ..Default::default()
        });

        security_cycle(&state).await;

        let recent = state.events.recent(50);
        assert!(recent.iter().any(|e| e.message.contains("VPN Tunnels")));
        assert!(recent.iter().any(|e| e.message.contains("Port 23")));
        // The unexpectedly open port is warning-severity.
        assert!(
            recent
                .iter()
                .any(|e| e.message.contains("Port 23") && e.severity == Severity::Warning)
        );

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, MonitorEvent::PortScan(_))));
    }

    #[tokio::test]
    async fn test_traffic_anomaly_fires_above_threshold() {
        let (state, _rx) = state();
        state.record_traffic(TrafficStats {
            throughput: 95.0,
            ..Default::default()
        });

        traffic_anomaly_check(&state);

        let recent = state.events.recent(10);
        assert!(recent.iter().any(|e| e.message.contains("Elevated network traffic")));
    }

    #[tokio::test]
    async fn test_refresh_section_overview_stores_metrics() {
        let (state, mut rx) = state();
        refresh_section(&state).await;

        assert_eq!(state.last_overview().expect("stored").threats_blocked, 42);
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, MonitorEvent::Overview(_))));
    }

    #[tokio::test]
    async fn test_chart_tick_feeds_traffic_and_bandwidth() {
        let (state, mut rx) = state();
        chart_tick(&state);

        let traffic = state.charts.snapshot(CHART_TRAFFIC).expect("chart");
        assert_eq!(traffic.series[0].1.values.len(), 1);
        assert_eq!(traffic.series[1].1.values.len(), 1);

        let bandwidth = state.charts.snapshot(CHART_BANDWIDTH).expect("chart");
        assert_eq!(bandwidth.slices.len(), 2);

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, MonitorEvent::Tick { .. })));
    }

    #[tokio::test]
    async fn test_start_polling_is_idempotent() {
        let (state, _rx) = state();
        let scheduler = RefreshScheduler::new(state);

        assert!(scheduler.start_polling());
        assert!(!scheduler.start_polling());
        assert!(scheduler.is_active());

        scheduler.stop();
        assert!(!scheduler.is_active());
    }

    #[tokio::test]
    async fn test_loops_record_last_fired() {
        let (state, _rx) = state();
        let scheduler = RefreshScheduler::new(state);
        assert!(scheduler.last_fired("ping").is_none());

        scheduler.start_polling();
        // Loops fire their first cycle immediately after spawn.
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(scheduler.last_fired("ping").is_some());
        assert!(scheduler.last_fired("devices").is_some());
        scheduler.stop();
    }
}
