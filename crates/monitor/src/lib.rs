//! Sentinel Network Monitor
//!
//! A network-operations monitor: live device inventory, latency probes,
//! security events, port monitoring and bandwidth charts, refreshed from a
//! dashboard API over a realtime WebSocket feed with automatic degrade to
//! polling. When no API is reachable every fetch falls back to a synthetic
//! generator, so the dashboard keeps rendering in degraded mode instead of
//! failing.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        NetworkMonitor (root)                      │
//! │                                                                   │
//! │  RealtimeChannel ── ws /ws/network ──┐                            │
//! │    Connecting→Open→Closed            │  degrade once              │
//! │    Connecting→Failed ────────────────┤                            │
//! │                                      ▼                            │
//! │  RefreshScheduler: ping 10s · devices 60s · security 30s          │
//! │                    section refresh 30s · chart tick 5s            │
//! │         │                                                         │
//! │         ▼                                                         │
//! │  DataSource (HTTP, synthetic fallback)                            │
//! │         │                                                         │
//! │         ▼                                                         │
//! │  DeviceInventory · EventLog(50) · ChartRegistry(ring buffers)     │
//! └───────────────┬───────────────────────────────────────────────────┘
//!                 │ MonitorEvent (bounded mpsc)
//!                 ▼
//!        terminal frontend (ratatui) or headless drain
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sentinel_monitor::{App, MonitorConfig, NetworkMonitor, run_tui};
//! use sentinel_monitor::tui::PanelRenderer;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let renderer = Arc::new(PanelRenderer::with_panels(&sentinel_monitor::ALL_CHART_PANELS));
//!     let (monitor, events) = NetworkMonitor::new(MonitorConfig::default(), renderer);
//!     let monitor = Arc::new(monitor);
//!     monitor.init_charts();
//!     monitor.start().await;
//!     run_tui(App::new(), events, monitor).await
//! }
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod events;
pub mod inventory;
pub mod model;
pub mod monitor;
pub mod realtime;
pub mod report;
pub mod scheduler;
pub mod series;
pub mod source;
pub mod tui;

pub use charts::{ChartId, ChartKind, ChartRegistry, ChartRenderer, ChartSnapshot, HeadlessRenderer, RedrawMode};
pub use config::MonitorConfig;
pub use error::MonitorError;
pub use events::{EventLog, MonitorEvent, record_event, send_event};
pub use inventory::DeviceInventory;
pub use model::{
    CheckStatus, DashboardSection, DeviceCategory, DeviceRecord, DeviceStatus, OverviewMetrics,
    PingOutcome, PingTarget, PortObservation, PortState, ProbeStatus, SecurityCheck,
    SecurityEvent, Severity, TrafficStats,
};
pub use monitor::{
    ALL_CHART_PANELS, CHART_BANDWIDTH, CHART_LATENCY, CHART_PROTOCOLS, CHART_TRAFFIC,
    CHART_UPTIME, DiagnosticsReport, MonitorState, MonitorStatistics, NetworkMonitor,
};
pub use realtime::{ConnectionState, RealtimeChannel, RealtimeMessage, websocket_url};
pub use report::{StatusReport, report_filename, write_report};
pub use scheduler::RefreshScheduler;
pub use series::{SeriesSnapshot, TimeSeriesBuffer};
pub use source::{DataSource, FetchKind, HttpDataSource};
pub use tui::{App, AppState, PanelRenderer, run_tui};
