//! Application root for the network monitor.
//!
//! [`NetworkMonitor`] owns every long-lived piece (data source, device
//! inventory, event log, chart registry, refresh scheduler and realtime
//! channel) with a defined construction and teardown order, replacing the
//! page-global singletons of a browser dashboard with one injected root.
//!
//! # Architecture
//!
//! ```text
//!            ┌────────────────────────────────────────────┐
//!            │              NetworkMonitor                │
//!            │                                            │
//!            │  RefreshScheduler          RealtimeChannel │
//!            │   ping 10s ─┐               ws /ws/network │
//!            │   devices 60s │    both feed    │ fallback │
//!            │   security 30s│       ▼         ▼          │
//!            │   refresh 30s ┴─► DataSource (HTTP + synth)│
//!            │   charts 5s          │                     │
//!            │                      ▼                     │
//!            │   DeviceInventory  EventLog  ChartRegistry │
//!            └──────────────────────┬─────────────────────┘
//!                                   │ MonitorEvent (mpsc)
//!                                   ▼
//!                           rendering frontend
//! ```

use crate::charts::{ChartKind, ChartRegistry, ChartRenderer};
use crate::config::MonitorConfig;
use crate::events::{EventLog, MonitorEvent, send_event};
use crate::inventory::DeviceInventory;
use crate::model::{
    DashboardSection, DeviceRecord, OverviewMetrics, PingOutcome, PingTarget, Severity,
    TrafficStats,
};
use crate::realtime::RealtimeChannel;
use crate::report::{self, StatusReport};
use crate::scheduler::{self, RefreshScheduler};
use crate::source::{DataSource, HttpDataSource, synthetic};
use chrono::{Timelike, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::info;

/// Panel id of the 24h download/upload traffic chart.
pub const CHART_TRAFFIC: &str = "network-traffic";
/// Panel id of the bandwidth used/available breakdown.
pub const CHART_BANDWIDTH: &str = "bandwidth";
/// Panel id of the 30-day uptime history.
pub const CHART_UPTIME: &str = "uptime-history";
/// Panel id of the protocol mix breakdown.
pub const CHART_PROTOCOLS: &str = "traffic-protocols";
/// Panel id of the realtime ping latency chart.
pub const CHART_LATENCY: &str = "ping-latency";

/// Every chart panel the dashboard can mount.
pub const ALL_CHART_PANELS: [&str; 5] = [
    CHART_TRAFFIC,
    CHART_BANDWIDTH,
    CHART_UPTIME,
    CHART_PROTOCOLS,
    CHART_LATENCY,
];

/// Shared state behind the scheduler, the realtime channel and the
/// frontend. Each mutable resource carries its own lock or is a concurrent
/// map, so the independent loops never serialize against each other.
pub struct MonitorState {
    pub config: MonitorConfig,
    pub source: Arc<dyn DataSource>,
    pub inventory: DeviceInventory,
    pub events: EventLog,
    pub charts: ChartRegistry,
    pub tx: mpsc::Sender<MonitorEvent>,
    section: RwLock<DashboardSection>,
    last_overview: Mutex<Option<OverviewMetrics>>,
    traffic: Mutex<TrafficStats>,
    started_at: Instant,
}

impl MonitorState {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn DataSource>,
        renderer: Arc<dyn ChartRenderer>,
        tx: mpsc::Sender<MonitorEvent>,
    ) -> Self {
        Self {
            inventory: DeviceInventory::new(),
            events: EventLog::new(config.event_capacity),
            charts: ChartRegistry::new(renderer),
            section: RwLock::new(DashboardSection::default()),
            last_overview: Mutex::new(None),
            traffic: Mutex::new(TrafficStats::default()),
            started_at: Instant::now(),
            config,
            source,
            tx,
        }
    }

    /// Section currently visible in the frontend.
    pub fn section(&self) -> DashboardSection {
        *self.section.read().expect("section lock poisoned")
    }

    pub fn set_section(&self, section: DashboardSection) {
        *self.section.write().expect("section lock poisoned") = section;
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Store the latest traffic counters from the realtime feed.
    pub fn record_traffic(&self, stats: TrafficStats) {
        *self.traffic.lock().expect("traffic lock poisoned") = stats;
    }

    pub fn last_traffic(&self) -> TrafficStats {
        *self.traffic.lock().expect("traffic lock poisoned")
    }

    pub fn set_overview(&self, metrics: OverviewMetrics) {
        *self.last_overview.lock().expect("overview lock poisoned") = Some(metrics);
    }

    pub fn last_overview(&self) -> Option<OverviewMetrics> {
        self.last_overview
            .lock()
            .expect("overview lock poisoned")
            .clone()
    }

    pub fn statistics(&self) -> MonitorStatistics {
        MonitorStatistics {
            devices: self.inventory.len(),
            events: self.events.len(),
            uptime_secs: self.uptime_secs(),
            traffic: self.last_traffic(),
        }
    }
}

/// Summary counters for external consumers and the report exporter.
#[derive(Debug, Clone)]
pub struct MonitorStatistics {
    pub devices: usize,
    pub events: usize,
    pub uptime_secs: u64,
    pub traffic: TrafficStats,
}

/// Result of a manual diagnostics pass.
#[derive(Debug, Clone)]
pub struct DiagnosticsReport {
    pub ping: PingOutcome,
    pub devices_found: usize,
    pub checks_run: usize,
}

/// The monitor root. Construct with [`NetworkMonitor::new`], seed the
/// charts with [`init_charts`](Self::init_charts), then [`start`](Self::start).
pub struct NetworkMonitor {
    state: Arc<MonitorState>,
    scheduler: Arc<RefreshScheduler>,
    channel: Arc<RealtimeChannel>,
}

impl NetworkMonitor {
    /// Build a monitor backed by the HTTP data source.
    pub fn new(
        config: MonitorConfig,
        renderer: Arc<dyn ChartRenderer>,
    ) -> (Self, mpsc::Receiver<MonitorEvent>) {
        let source = Arc::new(HttpDataSource::new(&config));
        Self::with_source(config, source, renderer)
    }

    /// Build a monitor with an injected data source (used by tests and any
    /// embedder that brings its own transport).
    pub fn with_source(
        config: MonitorConfig,
        source: Arc<dyn DataSource>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> (Self, mpsc::Receiver<MonitorEvent>) {
        // Large capacity so bursts of scan results don't drop events.
        let (tx, rx) = mpsc::channel::<MonitorEvent>(1000);
        let state = Arc::new(MonitorState::new(config, source, renderer, tx));
        let scheduler = RefreshScheduler::new(Arc::clone(&state));
        let channel = RealtimeChannel::new(Arc::clone(&state), Arc::clone(&scheduler));
        (
            Self {
                state,
                scheduler,
                channel,
            },
            rx,
        )
    }

    pub fn state(&self) -> &Arc<MonitorState> {
        &self.state
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    pub fn channel(&self) -> &Arc<RealtimeChannel> {
        &self.channel
    }

    /// Create and seed the dashboard charts. Panels missing from the
    /// frontend are skipped; their updates become no-ops.
    pub fn init_charts(&self) {
        let charts = &self.state.charts;
        let config = &self.state.config;
        let now = Utc::now();

        if charts
            .create(
                CHART_TRAFFIC,
                ChartKind::Line,
                &["download", "upload"],
                config.traffic_points,
            )
            .is_some()
        {
            // Pre-fill one sample per hour, oldest first.
            for offset in (0..config.traffic_points as i64).rev() {
                let at = now - chrono::Duration::hours(offset);
                let (download, upload) = synthetic::traffic_sample(at.hour() as f64);
                charts.update_in_place(
                    CHART_TRAFFIC,
                    &at.format("%H:00").to_string(),
                    &[download, upload],
                );
            }
        }

        if charts
            .create(CHART_BANDWIDTH, ChartKind::Doughnut, &[], 1)
            .is_some()
        {
            let usage = synthetic::bandwidth_usage();
            charts.replace(
                CHART_BANDWIDTH,
                vec![
                    ("Used".to_string(), usage),
                    ("Available".to_string(), 100.0 - usage),
                ],
            );
        }

        if charts
            .create(CHART_UPTIME, ChartKind::Bar, &["uptime"], 30)
            .is_some()
        {
            for (offset, uptime) in synthetic::uptime_history(30).into_iter().enumerate() {
                let day = now - chrono::Duration::days(29 - offset as i64);
                charts.update_in_place(CHART_UPTIME, &day.format("%m-%d").to_string(), &[uptime]);
            }
        }

        if charts
            .create(CHART_PROTOCOLS, ChartKind::Pie, &[], 1)
            .is_some()
        {
            charts.replace(CHART_PROTOCOLS, synthetic::protocol_mix());
        }

        let _ = charts.create(
            CHART_LATENCY,
            ChartKind::Line,
            &["latency"],
            config.realtime_points,
        );
    }

    /// Run the initial scan, open the realtime feed and start every refresh
    /// loop.
    ///
    /// Polling starts unconditionally: the socket is still in its handshake
    /// here, and when it does come up the channel's fallback activation is
    /// an idempotent no-op.
    pub async fn start(&self) {
        send_event(
            &self.state.tx,
            MonitorEvent::Status {
                message: "Running initial network scan".to_string(),
                severity: Severity::Info,
            },
        );

        // Device scan and overview load run concurrently, like the rest of
        // the initial scan fan-out.
        let (_scan, overview) = futures::join!(
            scheduler::device_cycle(&self.state),
            self.state.source.overview(),
        );
        self.state.set_overview(overview.clone());
        send_event(&self.state.tx, MonitorEvent::Overview(overview));

        send_event(
            &self.state.tx,
            MonitorEvent::Status {
                message: "Initial scan complete".to_string(),
                severity: Severity::Info,
            },
        );

        tokio::spawn(Arc::clone(&self.channel).run());
        self.scheduler.start_polling();
        self.scheduler.start_auto_refresh();
        self.scheduler.start_chart_ticks();
        info!("network monitor started");
    }

    /// Tear down in order: stop the loops first so nothing re-arms the
    /// feed, then close the socket.
    pub fn stop(&self) {
        self.scheduler.stop();
        self.channel.close();
        info!("network monitor stopped");
    }

    /// Manually triggered device scan.
    pub async fn force_device_scan(&self) -> Vec<DeviceRecord> {
        send_event(
            &self.state.tx,
            MonitorEvent::Status {
                message: "Manual device scan started".to_string(),
                severity: Severity::Info,
            },
        );
        let scan = scheduler::device_cycle(&self.state).await;
        send_event(
            &self.state.tx,
            MonitorEvent::Status {
                message: "Device scan complete".to_string(),
                severity: Severity::Info,
            },
        );
        scan
    }

    /// One-shot diagnostics: a ping probe, a device scan and a security
    /// sampling in a single pass.
    pub async fn run_diagnostics(&self) -> DiagnosticsReport {
        send_event(
            &self.state.tx,
            MonitorEvent::Status {
                message: "Running network diagnostics".to_string(),
                severity: Severity::Info,
            },
        );

        let target = self
            .state
            .config
            .ping_targets
            .first()
            .cloned()
            .unwrap_or_else(|| PingTarget::new("google.com", "Google"));
        let ping = self.state.source.ping(&target).await;
        let devices_found = scheduler::device_cycle(&self.state).await.len();
        let checks_run = self.state.source.security_scan().await.len();

        send_event(
            &self.state.tx,
            MonitorEvent::Status {
                message: "Diagnostics complete".to_string(),
                severity: Severity::Info,
            },
        );

        DiagnosticsReport {
            ping,
            devices_found,
            checks_run,
        }
    }

    /// Write the JSON status report to the configured directory.
    pub fn export_report(&self) -> anyhow::Result<PathBuf> {
        let report = StatusReport::generate(&self.state);
        report::write_report(&report, &self.state.config.report_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::HeadlessRenderer;

    fn monitor() -> (NetworkMonitor, mpsc::Receiver<MonitorEvent>) {
        let config = MonitorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        NetworkMonitor::new(config, Arc::new(HeadlessRenderer))
    }

    #[test]
    fn test_init_charts_creates_and_seeds_all_panels() {
        let (monitor, _rx) = monitor();
        monitor.init_charts();

        let charts = &monitor.state().charts;
        for id in ALL_CHART_PANELS {
            assert!(charts.contains(id), "missing chart {id}");
        }

        let traffic = charts.snapshot(CHART_TRAFFIC).expect("traffic chart");
        assert_eq!(traffic.series[0].1.labels.len(), 24);
        assert_eq!(traffic.series[1].1.labels.len(), 24);

        let bandwidth = charts.snapshot(CHART_BANDWIDTH).expect("bandwidth chart");
        let total: f64 = bandwidth.slices.iter().map(|(_, v)| v).sum();
        assert!((total - 100.0).abs() < 1e-9);

        let uptime = charts.snapshot(CHART_UPTIME).expect("uptime chart");
        assert_eq!(uptime.series[0].1.labels.len(), 30);
    }

    #[test]
    fn test_section_round_trip() {
        let (monitor, _rx) = monitor();
        assert_eq!(monitor.state().section(), DashboardSection::Overview);
        monitor.state().set_section(DashboardSection::Devices);
        assert_eq!(monitor.state().section(), DashboardSection::Devices);
    }

    #[test]
    fn test_statistics_start_empty() {
        let (monitor, _rx) = monitor();
        let stats = monitor.state().statistics();
        assert_eq!(stats.devices, 0);
        assert_eq!(stats.events, 0);
        assert_eq!(stats.traffic.throughput, 0.0);
    }

    #[tokio::test]
    async fn test_force_device_scan_populates_inventory() {
        let (monitor, mut rx) = monitor();
        let scan = monitor.force_device_scan().await;
        assert!(!scan.is_empty());
        assert_eq!(monitor.state().inventory.len(), scan.len());

        // Scan emits banners plus the grid update and new-device events.
        let mut saw_grid = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, MonitorEvent::DeviceScan(_)) {
                saw_grid = true;
            }
        }
        assert!(saw_grid);
    }
}
