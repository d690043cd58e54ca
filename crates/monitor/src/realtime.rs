//! Realtime feed: one WebSocket connection with automatic degrade to
//! polling.
//!
//! The channel owns its connection state exclusively. It never retries the
//! socket: once the handshake fails or the remote end closes, the session
//! stays on polling. Inbound messages are a tagged union keyed by `type`;
//! unknown or unparseable payloads are ignored, never errors.

use crate::error::MonitorError;
use crate::events::{MonitorEvent, record_event, send_event};
use crate::model::{DeviceRecord, PingOutcome, PingTarget, SecurityEvent, Severity, TrafficStats};
use crate::monitor::{CHART_TRAFFIC, MonitorState};
use crate::scheduler::RefreshScheduler;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Connection lifecycle of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Closed,
    Failed,
}

impl ConnectionState {
    /// Short label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "live",
            ConnectionState::Closed => "polling",
            ConnectionState::Failed => "polling",
        }
    }
}

/// Inbound realtime message, keyed by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RealtimeMessage {
    Ping {
        target: PingTarget,
        result: PingOutcome,
    },
    Device {
        device: DeviceRecord,
    },
    Security {
        event: SecurityEvent,
    },
    Traffic {
        stats: TrafficStats,
    },
}

/// Derive the realtime socket URL from the dashboard origin. The socket
/// scheme mirrors the origin's transport security.
pub fn websocket_url(base_url: &str) -> String {
    let origin = base_url.trim_end_matches('/');
    let ws_origin = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{origin}")
    };
    format!("{ws_origin}/ws/network")
}

/// The realtime channel. Create once per monitor session and drive it with
/// [`RealtimeChannel::run`]; [`close`](Self::close) requests an orderly
/// shutdown from any task.
pub struct RealtimeChannel {
    url: String,
    conn_state: Mutex<ConnectionState>,
    /// Ensures the polling fallback is activated at most once, no matter
    /// how many paths reach a terminal state.
    fallback_armed: AtomicBool,
    close_requested: Notify,
    shared: Arc<MonitorState>,
    scheduler: Arc<RefreshScheduler>,
}

impl RealtimeChannel {
    pub fn new(shared: Arc<MonitorState>, scheduler: Arc<RefreshScheduler>) -> Arc<Self> {
        Arc::new(Self {
            url: websocket_url(&shared.config.base_url),
            conn_state: Mutex::new(ConnectionState::Connecting),
            fallback_armed: AtomicBool::new(false),
            close_requested: Notify::new(),
            shared,
            scheduler,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.conn_state.lock().expect("connection state lock poisoned")
    }

    /// Request an orderly close. The running task sends the close frame and
    /// performs the `Closed` transition.
    pub fn close(&self) {
        self.close_requested.notify_one();
    }

    /// Drive the connection to completion. Returns when the socket closes,
    /// fails, or a close is requested; the monitor is on polling afterwards
    /// in every case.
    pub async fn run(self: Arc<Self>) {
        self.set_state(ConnectionState::Connecting);

        let stream = tokio::select! {
            result = connect_async(self.url.as_str()) => match result {
                Ok((stream, _response)) => stream,
                Err(err) => {
                    warn!(%err, url = %self.url, "realtime handshake failed, staying on polling");
                    self.set_state(ConnectionState::Failed);
                    // No socket retry: Failed is terminal for this session.
                    self.activate_fallback();
                    return;
                }
            },
            _ = self.close_requested.notified() => {
                self.mark_closed();
                return;
            }
        };

        self.set_state(ConnectionState::Open);
        info!(url = %self.url, "realtime feed connected");
        send_event(
            &self.shared.tx,
            MonitorEvent::Status {
                message: "Realtime feed connected".to_string(),
                severity: Severity::Info,
            },
        );

        let (mut write, mut read) = stream.split();
        loop {
            tokio::select! {
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text),
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("{}", MonitorError::SocketClosed);
                        break;
                    }
                    Some(Ok(_)) => {} // binary and ping/pong frames carry no panel data
                    Some(Err(err)) => {
                        warn!("{}", MonitorError::SocketError(err.to_string()));
                        break;
                    }
                },
                _ = self.close_requested.notified() => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            }
        }

        self.mark_closed();
    }

    /// Route one inbound payload to its panel updater. Unknown `type`
    /// values and undecodable payloads are dropped.
    pub(crate) fn dispatch(&self, text: &str) {
        let message = match serde_json::from_str::<RealtimeMessage>(text) {
            Ok(message) => message,
            Err(err) => {
                debug!("{}", MonitorError::MalformedMessage(err.to_string()));
                return;
            }
        };

        match message {
            RealtimeMessage::Ping { target, result } => {
                send_event(
                    &self.shared.tx,
                    MonitorEvent::PingUpdate {
                        target,
                        outcome: result,
                    },
                );
            }
            RealtimeMessage::Device { device } => {
                self.shared.inventory.refresh(&device);
                send_event(&self.shared.tx, MonitorEvent::DeviceUpdate(device));
            }
            RealtimeMessage::Security { event } => {
                record_event(&self.shared.events, &self.shared.tx, event);
            }
            RealtimeMessage::Traffic { stats } => {
                self.shared.record_traffic(stats);
                let label = Utc::now().format("%H:%M:%S").to_string();
                self.shared
                    .charts
                    .update_in_place(CHART_TRAFFIC, &label, &[stats.throughput]);
                send_event(
                    &self.shared.tx,
                    MonitorEvent::Tick {
                        series: CHART_TRAFFIC.to_string(),
                        label,
                        value: stats.throughput,
                    },
                );
            }
        }
    }

    /// Transition to `Closed`, emit the degraded-mode notification and
    /// activate the polling fallback. Reaching `Closed` twice, remote
    /// close racing an explicit stop, is a no-op the second time.
    pub(crate) fn mark_closed(&self) {
        {
            let mut state = self.conn_state.lock().expect("connection state lock poisoned");
            if *state == ConnectionState::Closed {
                return;
            }
            *state = ConnectionState::Closed;
        }
        send_event(
            &self.shared.tx,
            MonitorEvent::ConnectionState(ConnectionState::Closed),
        );
        send_event(
            &self.shared.tx,
            MonitorEvent::Status {
                message: "Realtime feed lost, switching to polling".to_string(),
                severity: Severity::Warning,
            },
        );
        self.activate_fallback();
    }

    /// Start the polling loops if this channel has not done so already.
    /// Returns whether this call performed the activation.
    pub(crate) fn activate_fallback(&self) -> bool {
        if self.fallback_armed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.scheduler.start_polling();
        true
    }

    fn set_state(&self, next: ConnectionState) {
        *self.conn_state.lock().expect("connection state lock poisoned") = next;
        send_event(&self.shared.tx, MonitorEvent::ConnectionState(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartKind, HeadlessRenderer};
    use crate::config::MonitorConfig;
    use crate::model::{DeviceCategory, DeviceStatus};
    use crate::source::HttpDataSource;
    use tokio::sync::mpsc;

    #[test]
    fn test_websocket_url_mirrors_scheme() {
        assert_eq!(
            websocket_url("http://192.168.1.1:8080"),
            "ws://192.168.1.1:8080/ws/network"
        );
        assert_eq!(
            websocket_url("https://sentinel.example.net/"),
            "wss://sentinel.example.net/ws/network"
        );
    }

    fn channel() -> (Arc<RealtimeChannel>, mpsc::Receiver<MonitorEvent>) {
        let config = MonitorConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let (tx, rx) = mpsc::channel(256);
        let source = Arc::new(HttpDataSource::new(&config));
        let state = Arc::new(MonitorState::new(
            config,
            source,
            Arc::new(HeadlessRenderer),
            tx,
        ));
        let _ = state
            .charts
            .create(CHART_TRAFFIC, ChartKind::Line, &["download", "upload"], 24);
        let scheduler = RefreshScheduler::new(Arc::clone(&state));
        (RealtimeChannel::new(state, scheduler), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<MonitorEvent>) -> Vec<MonitorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_dispatch_traffic_feeds_chart_and_counters() {
        let (channel, mut rx) = channel();
        channel.dispatch(r#"{"type":"traffic","stats":{"throughput":33.5,"packetsIn":12}}"#);

        assert_eq!(channel.shared.last_traffic().throughput, 33.5);
        assert_eq!(channel.shared.last_traffic().packets_in, 12);
        assert_eq!(channel.shared.charts.latest_value(CHART_TRAFFIC), Some(33.5));

        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, MonitorEvent::Tick { .. })));
    }

    #[tokio::test]
    async fn test_dispatch_device_refreshes_known_record() {
        let (channel, mut rx) = channel();
        let device = DeviceRecord {
            mac: "aa".to_string(),
            ip: "10.0.0.1".to_string(),
            name: "Gateway".to_string(),
            category: DeviceCategory::Router,
            status: DeviceStatus::Online,
            last_seen: Utc::now(),
            manufacturer: None,
        };
        channel.shared.inventory.reconcile(&[device]);

        channel.dispatch(
            r#"{"type":"device","device":{"mac":"aa","ip":"10.0.0.1","name":"Gateway","type":"router","status":"warning","lastSeen":"2026-01-15T10:30:00Z"}}"#,
        );

        let snapshot = channel.shared.inventory.snapshot();
        assert_eq!(snapshot[0].status, DeviceStatus::Warning);
        let events = drain(&mut rx);
        assert!(events.iter().any(|e| matches!(e, MonitorEvent::DeviceUpdate(_))));
    }

    #[tokio::test]
    async fn test_dispatch_security_lands_in_log() {
        let (channel, _rx) = channel();
        channel.dispatch(
            r#"{"type":"security","event":{"severity":"warning","message":"probe detected","timestamp":"2026-01-15T10:30:00Z"}}"#,
        );
        assert_eq!(channel.shared.events.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_messages_ignored() {
        let (channel, mut rx) = channel();
        channel.dispatch(r#"{"type":"firmware","version":"1.2"}"#);
        channel.dispatch("not even json");
        channel.dispatch(r#"{"no":"type"}"#);

        assert!(drain(&mut rx).is_empty());
        assert!(channel.shared.events.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_activates_exactly_once() {
        let (channel, _rx) = channel();

        // Remote close and explicit stop both reach the terminal state.
        channel.mark_closed();
        channel.mark_closed();

        assert_eq!(channel.state(), ConnectionState::Closed);
        assert!(channel.scheduler.polling_started());
        // The first path armed the fallback; nothing is left to activate.
        assert!(!channel.activate_fallback());

        channel.scheduler.stop();
    }

    #[tokio::test]
    async fn test_mark_closed_banners_once() {
        let (channel, mut rx) = channel();
        channel.mark_closed();
        channel.mark_closed();

        let banners = drain(&mut rx)
            .iter()
            .filter(|e| matches!(e, MonitorEvent::Status { .. }))
            .count();
        assert_eq!(banners, 1);

        channel.scheduler.stop();
    }
}
