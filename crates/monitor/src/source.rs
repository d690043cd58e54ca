//! Data acquisition with degraded-mode fallback.
//!
//! Every fetch first tries the corresponding dashboard API endpoint and, on
//! any failure (timeout, connection refusal, non-2xx, parse error) falls
//! back to a synthetic generator for that kind. Fetches therefore always
//! resolve with a usable payload and never surface an error to the refresh
//! loops; the failure itself is logged and the display carries on with
//! degraded data.

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::model::{
    CheckStatus, DeviceCategory, DeviceRecord, DeviceStatus, OverviewMetrics, PingOutcome,
    PingTarget, PortObservation, PortState, ProbeStatus, SecurityCheck,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The five payload kinds the dashboard consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Ping,
    Devices,
    Security,
    Ports,
    Overview,
}

impl FetchKind {
    /// API path for this kind, relative to the configured base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            FetchKind::Ping => "/api/ping",
            FetchKind::Devices => "/api/network/devices",
            FetchKind::Security => "/api/security/scan",
            FetchKind::Ports => "/api/network/ports",
            FetchKind::Overview => "/api/overview",
        }
    }
}

/// Source of monitor data. One method per payload shape; implementations
/// must resolve with *some* value on every call.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Probe one target. Only this call carries an explicit timeout.
    async fn ping(&self, target: &PingTarget) -> PingOutcome;
    /// Current device inventory.
    async fn devices(&self) -> Vec<DeviceRecord>;
    /// Service-level security check sampling.
    async fn security_scan(&self) -> Vec<SecurityCheck>;
    /// Well-known port states.
    async fn ports(&self) -> Vec<PortObservation>;
    /// Overview summary metrics.
    async fn overview(&self) -> OverviewMetrics;
}

/// HTTP-backed data source with built-in synthetic fallback.
pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
    ping_timeout: Duration,
}

impl HttpDataSource {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ping_timeout: config.ping_timeout,
        }
    }

    async fn request_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, MonitorError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(MonitorError::NetworkUnavailable(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn ping(&self, target: &PingTarget) -> PingOutcome {
        let url = format!(
            "{}{}?host={}",
            self.base_url,
            FetchKind::Ping.endpoint(),
            target.host
        );
        let started = Instant::now();
        // The per-request timeout also cancels the in-flight request when it
        // expires; dropping the future releases the connection.
        match self.client.get(&url).timeout(self.ping_timeout).send().await {
            Ok(response) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let status = if response.status().is_success() {
                    ProbeStatus::Online
                } else {
                    ProbeStatus::Warning
                };
                PingOutcome {
                    latency_ms: Some(latency_ms),
                    status,
                }
            }
            Err(err) if err.is_timeout() => PingOutcome {
                latency_ms: None,
                status: ProbeStatus::Timeout,
            },
            Err(err) => {
                debug!(host = %target.host, %err, "ping endpoint unreachable, synthesizing latency");
                synthetic::ping()
            }
        }
    }

    async fn devices(&self) -> Vec<DeviceRecord> {
        match self
            .request_json::<Vec<DeviceRecord>>(FetchKind::Devices.endpoint())
            .await
        {
            Ok(devices) => devices,
            Err(err) => {
                warn!(%err, "device endpoint unavailable, using synthetic inventory");
                synthetic::devices()
            }
        }
    }

    async fn security_scan(&self) -> Vec<SecurityCheck> {
        match self
            .request_json::<Vec<SecurityCheck>>(FetchKind::Security.endpoint())
            .await
        {
            Ok(checks) => checks,
            Err(err) => {
                debug!(%err, "security scan endpoint unavailable, sampling synthetic checks");
                synthetic::security_checks()
            }
        }
    }

    async fn ports(&self) -> Vec<PortObservation> {
        match self
            .request_json::<Vec<PortObservation>>(FetchKind::Ports.endpoint())
            .await
        {
            Ok(ports) => ports,
            Err(err) => {
                debug!(%err, "port endpoint unavailable, using synthetic port table");
                synthetic::ports()
            }
        }
    }

    async fn overview(&self) -> OverviewMetrics {
        match self
            .request_json::<OverviewMetrics>(FetchKind::Overview.endpoint())
            .await
        {
            Ok(metrics) => metrics,
            Err(err) => {
                debug!(%err, "overview endpoint unavailable, using synthetic metrics");
                synthetic::overview()
            }
        }
    }
}

/// Synthetic generators: deterministic in shape, randomized in value.
/// These stand in for the live endpoints whenever the network layer fails,
/// so the dashboard keeps moving in degraded mode.
pub mod synthetic {
    use super::*;
    use chrono::Utc;
    use rand::Rng;

    pub fn ping() -> PingOutcome {
        let latency = rand::thread_rng().gen_range(10..110);
        let status = if latency < 100 {
            ProbeStatus::Online
        } else {
            ProbeStatus::Warning
        };
        PingOutcome {
            latency_ms: Some(latency),
            status,
        }
    }

    pub fn devices() -> Vec<DeviceRecord> {
        let mut rng = rand::thread_rng();
        let now = Utc::now();
        vec![
            DeviceRecord {
                ip: "192.168.1.1".to_string(),
                mac: "00:1B:44:11:3A:B7".to_string(),
                name: "Main Router".to_string(),
                category: DeviceCategory::Router,
                status: DeviceStatus::Online,
                last_seen: now,
                manufacturer: Some("TP-Link".to_string()),
            },
            DeviceRecord {
                ip: "192.168.1.2".to_string(),
                mac: "00:1B:44:11:3A:B8".to_string(),
                name: "Switch-01".to_string(),
                category: DeviceCategory::Switch,
                status: DeviceStatus::Online,
                last_seen: now,
                manufacturer: Some("Cisco".to_string()),
            },
            DeviceRecord {
                ip: "192.168.1.100".to_string(),
                mac: "00:1B:44:11:3A:C0".to_string(),
                name: "PC-Admin".to_string(),
                category: DeviceCategory::Computer,
                status: DeviceStatus::Online,
                last_seen: now,
                manufacturer: Some("Dell".to_string()),
            },
            DeviceRecord {
                ip: "192.168.1.101".to_string(),
                mac: "00:1B:44:11:3A:C1".to_string(),
                name: "Laptop-User1".to_string(),
                category: DeviceCategory::Laptop,
                status: if rng.gen_bool(0.7) {
                    DeviceStatus::Online
                } else {
                    DeviceStatus::Offline
                },
                last_seen: now - chrono::Duration::seconds(rng.gen_range(0..3600)),
                manufacturer: Some("HP".to_string()),
            },
        ]
    }

    pub fn security_checks() -> Vec<SecurityCheck> {
        let mut rng = rand::thread_rng();
        ["Firewall Status", "Intrusion Detection", "VPN Tunnels", "SSL Certificates"]
            .iter()
            .map(|name| SecurityCheck {
                name: name.to_string(),
                status: if rng.gen_bool(0.05) {
                    CheckStatus::Warn
                } else {
                    CheckStatus::Pass
                },
            })
            .collect()
    }

    pub fn ports() -> Vec<PortObservation> {
        let mut rng = rand::thread_rng();
        let expectations = [
            (22u16, "SSH", PortState::Open),
            (80, "HTTP", PortState::Open),
            (443, "HTTPS", PortState::Open),
            (21, "FTP", PortState::Closed),
            (23, "Telnet", PortState::Closed),
        ];
        expectations
            .iter()
            .map(|(port, name, expected)| {
                let actual = if rng.gen_bool(0.9) {
                    *expected
                } else {
                    match expected {
                        PortState::Open => PortState::Closed,
                        PortState::Closed => PortState::Open,
                    }
                };
                PortObservation {
                    port: *port,
                    name: name.to_string(),
                    expected: *expected,
                    actual,
                }
            })
            .collect()
    }

    pub fn overview() -> OverviewMetrics {
        let mut rng = rand::thread_rng();
        OverviewMetrics {
            internet_status: "Connected".to_string(),
            internet_latency_ms: rng.gen_range(10..60),
            router_cpu_pct: rng.gen_range(20..60),
            router_ram_pct: rng.gen_range(30..60),
            threats_blocked: rng.gen_range(200..300),
            lan_devices: rng.gen_range(20..30),
            lan_traffic_mbps: rng.gen_range(0.5..2.5),
        }
    }

    /// One traffic sample following the daily load curve: a sinusoid
    /// peaking mid-afternoon plus jitter. Returns (download, upload) Mbps.
    pub fn traffic_sample(hour: f64) -> (f64, f64) {
        let mut rng = rand::thread_rng();
        let daily = ((hour - 9.0) * std::f64::consts::PI / 12.0).sin();
        let download = (20.0 + daily * 15.0 + rng.gen_range(-5.0..5.0)).max(0.0);
        let upload = (8.0 + daily * 5.0 + rng.gen_range(-2.0..2.0)).max(0.0);
        (download, upload)
    }

    /// Daily uptime percentages: mostly 98-100, occasional dips.
    pub fn uptime_history(days: usize) -> Vec<f64> {
        let mut rng = rand::thread_rng();
        (0..days)
            .map(|_| {
                if rng.gen_bool(0.95) {
                    rng.gen_range(98.0..100.0)
                } else {
                    rng.gen_range(80.0..100.0)
                }
            })
            .collect()
    }

    /// Current bandwidth usage as a percentage of capacity.
    pub fn bandwidth_usage() -> f64 {
        rand::thread_rng().gen_range(30..70) as f64
    }

    /// Static protocol mix for the traffic analysis breakdown.
    pub fn protocol_mix() -> Vec<(String, f64)> {
        [
            ("HTTP/HTTPS", 45.0),
            ("FTP", 8.0),
            ("SSH", 12.0),
            ("DNS", 15.0),
            ("Email", 10.0),
            ("Other", 10.0),
        ]
        .iter()
        .map(|(name, share)| (name.to_string(), *share))
        .collect()
    }
}
