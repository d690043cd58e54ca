//! Failure taxonomy for the monitor core.
//!
//! No variant here is fatal to the process: network failures degrade to
//! synthetic data, missing panels skip their update, socket trouble drops
//! the monitor back to polling, and malformed feed messages are ignored.

use thiserror::Error;

/// Non-fatal failures surfaced by the refresh and realtime layers.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A dashboard API request failed or timed out.
    #[error("network source unavailable: {0}")]
    NetworkUnavailable(String),

    /// The target display panel is not mounted in the active frontend.
    #[error("mount point '{0}' not present")]
    MountPointMissing(String),

    /// The realtime socket was closed by the remote end.
    #[error("realtime socket closed")]
    SocketClosed,

    /// The realtime socket failed during handshake or transfer.
    #[error("realtime socket error: {0}")]
    SocketError(String),

    /// An inbound realtime payload could not be decoded.
    #[error("malformed realtime message: {0}")]
    MalformedMessage(String),
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::NetworkUnavailable(err.to_string())
    }
}
