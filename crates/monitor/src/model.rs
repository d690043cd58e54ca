//! Core data types shared across the monitor.
//!
//! Wire-facing types mirror the JSON shapes of the dashboard API
//! (camelCase fields, `type` tags), so payloads parse straight off the
//! endpoints without an intermediate mapping layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Device category reported by a network scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DeviceCategory {
    Router,
    Switch,
    Firewall,
    Computer,
    Laptop,
    Printer,
    Phone,
    /// Anything the scanner could not classify.
    #[default]
    Unknown,
}

impl From<String> for DeviceCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "router" => DeviceCategory::Router,
            "switch" => DeviceCategory::Switch,
            "firewall" => DeviceCategory::Firewall,
            "computer" => DeviceCategory::Computer,
            "laptop" => DeviceCategory::Laptop,
            "printer" => DeviceCategory::Printer,
            "phone" => DeviceCategory::Phone,
            _ => DeviceCategory::Unknown,
        }
    }
}

/// Reachability of a device as of the latest scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Warning,
}

/// One device in the inventory, keyed by MAC address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Hardware address; unique key into the known-device mapping.
    pub mac: String,
    pub ip: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub category: DeviceCategory,
    pub status: DeviceStatus,
    #[serde(rename = "lastSeen")]
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub manufacturer: Option<String>,
}

/// Severity of a security event. Ordering follows escalation:
/// `Info < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A single entry in the security event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// Create an event stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A host probed by the ping loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingTarget {
    pub host: String,
    pub name: String,
}

impl PingTarget {
    pub fn new(host: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
        }
    }
}

/// Outcome classification of one latency probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Online,
    Warning,
    Timeout,
    Offline,
}

/// Result of one latency probe against a [`PingTarget`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PingOutcome {
    /// Round-trip latency; `None` when the probe timed out.
    #[serde(rename = "latency")]
    pub latency_ms: Option<u64>,
    pub status: ProbeStatus,
}

/// Expected vs. observed state of a well-known port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
}

/// One row of the port monitoring table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortObservation {
    pub port: u16,
    pub name: String,
    pub expected: PortState,
    pub actual: PortState,
}

impl PortObservation {
    /// Whether the port deviates from its expected state.
    pub fn unexpected(&self) -> bool {
        self.actual != self.expected
    }
}

/// Result of one service-level security check (firewall, IDS, VPN, certs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
}

/// One sampled security check from a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityCheck {
    pub name: String,
    pub status: CheckStatus,
}

/// Summary metrics for the overview section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverviewMetrics {
    pub internet_status: String,
    pub internet_latency_ms: u64,
    pub router_cpu_pct: u8,
    pub router_ram_pct: u8,
    pub threats_blocked: u64,
    pub lan_devices: u32,
    pub lan_traffic_mbps: f64,
}

/// Rolling traffic counters pushed over the realtime feed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrafficStats {
    pub packets_in: u64,
    pub packets_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub errors: u64,
    /// Current throughput in Mbps; feeds the live traffic chart.
    pub throughput: f64,
}

/// Dashboard section currently visible in the frontend. Drives which data
/// the coarse auto-refresh reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardSection {
    #[default]
    Overview,
    Network,
    Security,
    Devices,
    Alerts,
    Reports,
}

impl DashboardSection {
    /// Title shown in the frontend tab bar.
    pub fn title(&self) -> &'static str {
        match self {
            DashboardSection::Overview => "Overview",
            DashboardSection::Network => "Network",
            DashboardSection::Security => "Security",
            DashboardSection::Devices => "Devices",
            DashboardSection::Alerts => "Alerts",
            DashboardSection::Reports => "Reports",
        }
    }

    pub const ALL: [DashboardSection; 6] = [
        DashboardSection::Overview,
        DashboardSection::Network,
        DashboardSection::Security,
        DashboardSection::Devices,
        DashboardSection::Alerts,
        DashboardSection::Reports,
    ];
}
