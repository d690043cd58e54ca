//! Monitor configuration.

use crate::model::PingTarget;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the monitor core and its refresh cadences.
///
/// Defaults match the dashboard's stock behavior; any subset can be
/// overridden from a YAML file via [`MonitorConfig::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Origin of the dashboard API, e.g. `http://192.168.1.1:8080`.
    /// Also the base for the realtime socket URL (scheme mirrored).
    pub base_url: String,

    /// Latency probe cadence.
    #[serde(with = "humantime_serde")]
    pub ping_interval: Duration,
    /// Device discovery cadence.
    #[serde(with = "humantime_serde")]
    pub device_scan_interval: Duration,
    /// Security scan cadence.
    #[serde(with = "humantime_serde")]
    pub security_scan_interval: Duration,
    /// Coarse per-section refresh cadence.
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
    /// Live chart tick cadence.
    #[serde(with = "humantime_serde")]
    pub chart_tick_interval: Duration,
    /// Upper bound on a single ping request.
    #[serde(with = "humantime_serde")]
    pub ping_timeout: Duration,

    /// Hosts probed by the ping loop, in order.
    pub ping_targets: Vec<PingTarget>,

    /// Security event log retention.
    pub event_capacity: usize,
    /// Points kept by the 24h traffic chart.
    pub traffic_points: usize,
    /// Points kept by realtime charts.
    pub realtime_points: usize,

    /// Directory exported reports are written to.
    pub report_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            ping_interval: Duration::from_secs(10),
            device_scan_interval: Duration::from_secs(60),
            security_scan_interval: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(30),
            chart_tick_interval: Duration::from_secs(5),
            ping_timeout: Duration::from_secs(5),
            ping_targets: vec![
                PingTarget::new("google.com", "Google"),
                PingTarget::new("cloudflare.com", "Cloudflare"),
                PingTarget::new("192.168.1.1", "Local Router"),
                PingTarget::new("8.8.8.8", "Public DNS"),
            ],
            event_capacity: 50,
            traffic_points: 24,
            realtime_points: 20,
            report_dir: PathBuf::from("."),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a YAML file, filling unset fields with
    /// defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}
