//! Exported JSON status report.

use crate::monitor::MonitorState;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The downloadable report document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub timestamp: DateTime<Utc>,
    /// Monitor uptime in seconds.
    pub uptime: u64,
    pub devices: usize,
    pub threats_blocked: u64,
    /// Latest observed throughput in Mbps.
    pub bandwidth_usage: f64,
}

impl StatusReport {
    /// Snapshot the monitor into a report.
    pub fn generate(state: &MonitorState) -> Self {
        let stats = state.statistics();
        Self {
            timestamp: Utc::now(),
            uptime: stats.uptime_secs,
            devices: stats.devices,
            threats_blocked: state
                .last_overview()
                .map(|overview| overview.threats_blocked)
                .unwrap_or(0),
            bandwidth_usage: stats.traffic.throughput,
        }
    }
}

/// File name for a report generated on `date`.
pub fn report_filename(date: NaiveDate) -> String {
    format!("sentinel-report-{}.json", date.format("%Y-%m-%d"))
}

/// Write the report into `dir`, returning the path of the written file.
pub fn write_report(report: &StatusReport, dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join(report_filename(report.timestamp.date_naive()));
    let body = serde_json::to_string_pretty(report).context("serializing status report")?;
    std::fs::write(&path, body)
        .with_context(|| format!("writing report to {}", path.display()))?;
    Ok(path)
}
