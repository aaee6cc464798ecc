use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::TrackerError;
use crate::models::{AccountId, SwapEvent};
use crate::pipeline::EventPipeline;
use crate::protocol::{self, Inbound};
use crate::rpc::TransactionFetcher;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Fixed pause between reconnect attempts. No backoff, no attempt cap.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Idle interval after which a keepalive ping is sent.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// After a keepalive ping, some inbound frame must arrive within this
/// window or the link is declared dead.
const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Socket lifecycle states. Every transition is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribing,
    Listening,
    Closing,
    Reconnecting,
}

/// An acknowledged log subscription on the current connection. Dropped
/// with the connection; the id is never reused across reconnects.
#[derive(Debug, Clone, Copy)]
struct Subscription {
    id: u64,
    commitment: &'static str,
}

enum SessionEnd {
    Stopped,
    Lost(&'static str),
}

/// Owns the WebSocket for its whole lifetime: connect, subscribe, listen,
/// reconnect on failure, close on stop. Notifications are handed to the
/// pipeline one at a time; the next frame is not read until the current
/// one is fully processed.
pub struct ConnectionManager {
    ws_endpoint: String,
    account: AccountId,
    pipeline: EventPipeline,
    stop: watch::Receiver<bool>,
    state: ConnectionState,
    reconnect_delay: Duration,
    keepalive_interval: Duration,
    keepalive_timeout: Duration,
}

impl ConnectionManager {
    pub fn new(
        cfg: &Config,
        events: mpsc::Sender<SwapEvent>,
        stop: watch::Receiver<bool>,
    ) -> eyre::Result<Self> {
        let fetcher = TransactionFetcher::new(cfg.rpc_endpoint())?;
        Ok(Self {
            ws_endpoint: cfg.ws_endpoint(),
            account: cfg.account.clone(),
            pipeline: EventPipeline::new(fetcher, events),
            stop,
            state: ConnectionState::Disconnected,
            reconnect_delay: RECONNECT_DELAY,
            keepalive_interval: KEEPALIVE_INTERVAL,
            keepalive_timeout: KEEPALIVE_TIMEOUT,
        })
    }

    /// Override the reconnect pause (tests use a short one).
    #[allow(dead_code)]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Override the keepalive timings (tests use short ones).
    #[allow(dead_code)]
    pub fn with_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.keepalive_interval = interval;
        self.keepalive_timeout = timeout;
        self
    }

    #[allow(dead_code)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            debug!("Connection state {:?} → {:?}", self.state, next);
            self.state = next;
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Run until a stop is requested. The socket is reopened forever on
    /// failure; only a stop ends the loop.
    pub async fn run(mut self) {
        loop {
            if self.stop_requested() {
                break;
            }

            self.set_state(ConnectionState::Connecting);
            info!("Opening log stream for {}", self.account);

            match connect_async(&self.ws_endpoint).await {
                Ok((ws, _)) => {
                    info!("✅ WebSocket connected");
                    match self.serve(ws).await {
                        Ok(SessionEnd::Stopped) => break,
                        Ok(SessionEnd::Lost(reason)) => warn!("Connection lost: {}", reason),
                        Err(e) => warn!("Connection error: {}", e),
                    }
                }
                Err(e) => warn!("WebSocket connect failed: {}", e),
            }

            if self.stop_requested() {
                break;
            }

            self.set_state(ConnectionState::Reconnecting);
            info!("Reconnecting in {:?}", self.reconnect_delay);
            if !self.wait_before_reconnect().await {
                break;
            }
        }

        self.set_state(ConnectionState::Closing);
        self.set_state(ConnectionState::Disconnected);
        info!("Log stream closed");
    }

    /// Subscribe, then dispatch frames until the connection dies or a stop
    /// arrives.
    async fn serve(&mut self, mut ws: WsStream) -> Result<SessionEnd, TrackerError> {
        self.set_state(ConnectionState::Subscribing);

        let request = protocol::subscribe_request(&self.account);
        ws.send(Message::Text(request)).await?;
        info!("📡 logsSubscribe sent for {}", self.account);

        let mut subscription: Option<Subscription> = None;
        let mut ping_outstanding = false;

        loop {
            if self.stop_requested() {
                self.set_state(ConnectionState::Closing);
                let _ = ws.close(None).await;
                return Ok(SessionEnd::Stopped);
            }

            let idle_limit = if ping_outstanding {
                self.keepalive_timeout
            } else {
                self.keepalive_interval
            };

            let frame = tokio::select! {
                changed = self.stop.changed() => {
                    if changed.is_err() {
                        // stop handle dropped, same as an explicit stop
                        self.set_state(ConnectionState::Closing);
                        let _ = ws.close(None).await;
                        return Ok(SessionEnd::Stopped);
                    }
                    continue;
                }
                frame = time::timeout(idle_limit, ws.next()) => frame,
            };

            match frame {
                // the keepalive went unanswered, the link is dead
                Err(_) if ping_outstanding => return Ok(SessionEnd::Lost("ping timeout")),
                // nothing heard for a while, nudge the server
                Err(_) => {
                    ws.send(Message::Ping(Vec::new())).await?;
                    ping_outstanding = true;
                }
                Ok(None) => return Ok(SessionEnd::Lost("stream ended")),
                Ok(Some(Err(e))) => return Err(e.into()),
                Ok(Some(Ok(message))) => {
                    // any inbound frame counts as a sign of life
                    ping_outstanding = false;
                    match message {
                        Message::Text(text) => self.dispatch(&text, &mut subscription).await,
                        Message::Ping(payload) => ws.send(Message::Pong(payload)).await?,
                        Message::Close(_) => {
                            if let Some(sub) = subscription.take() {
                                debug!("Subscription {} closed with the connection", sub.id);
                            }
                            return Ok(SessionEnd::Lost("close frame received"));
                        }
                        _ => {} // binary and pong frames carry no protocol payload
                    }
                }
            }
        }
    }

    /// Handle one text frame. Protocol-level garbage is logged and dropped,
    /// never fatal to the connection.
    async fn dispatch(&mut self, text: &str, subscription: &mut Option<Subscription>) {
        match protocol::parse_inbound(text) {
            Ok(Inbound::Ack { subscription: id }) => {
                if self.state == ConnectionState::Subscribing {
                    self.set_state(ConnectionState::Listening);
                }
                let sub = Subscription {
                    id,
                    commitment: protocol::COMMITMENT,
                };
                info!("✅ Log subscription {} confirmed ({})", sub.id, sub.commitment);
                *subscription = Some(sub);
            }
            Ok(Inbound::Notification { signature }) => {
                if self.state == ConnectionState::Subscribing {
                    self.set_state(ConnectionState::Listening);
                }
                debug!("📩 Log notification: {}", signature);
                self.pipeline.handle_signature(&signature).await;
            }
            Ok(Inbound::Unrecognized) => warn!("Unrecognized message, dropping: {}", text),
            Err(e) => warn!("Bad frame dropped: {}", e),
        }
    }

    /// Sleep out the reconnect delay. Returns false when a stop arrived
    /// during the wait.
    async fn wait_before_reconnect(&mut self) -> bool {
        tokio::select! {
            _ = time::sleep(self.reconnect_delay) => true,
            changed = self.stop.changed() => match changed {
                Ok(()) => !self.stop_requested(),
                Err(_) => false,
            },
        }
    }
}
