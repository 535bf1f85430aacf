//! Live update channel with a fixed-delay reconnect loop.
//!
//! Connects to the monitor server's `/ws/updates` socket and streams parsed
//! [`MetricEvent`]s through a [`tokio::sync::broadcast`] channel. Any close
//! or error is followed by a new attempt after a fixed delay, forever,
//! until the [`CancellationToken`] is cancelled.
//!
//! Frames that do not parse as `{metric, value}` events are dropped at the
//! parse boundary. That is part of the contract: a bad frame never tears
//! down the connection and is never surfaced to subscribers.
//!
//! # Example
//!
//! ```rust,ignore
//! use netwatch_api::live::{LiveChannel, ReconnectConfig, live_endpoint};
//! use tokio_util::sync::CancellationToken;
//!
//! let url = live_endpoint(client.base_url())?;
//! let channel = LiveChannel::spawn(url, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = channel.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{} = {}", event.metric, event.value);
//! }
//!
//! channel.shutdown();
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::models::MetricEvent;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const LIVE_PATH: &str = "ws/updates";

/// Derive the live socket URL from a server base URL.
///
/// `http` maps to `ws`, `https` to `wss`; the path is joined relative to
/// the base, so a base without a trailing `/` loses its last segment.
pub fn live_endpoint(base: &Url) -> Result<Url, Error> {
    let mut url = base.join(LIVE_PATH)?;
    let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|()| Error::WebSocketConnect(format!("cannot use scheme {scheme}")))?;
    Ok(url)
}

// ── ChannelState ─────────────────────────────────────────────────────

/// Observable state of the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Fixed-delay reconnect policy. There is no attempt cap.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay between a close/error and the next connect attempt. Default: 3s.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
        }
    }
}

// ── Connector ────────────────────────────────────────────────────────

/// Text payloads of one connection, in arrival order. The stream ending
/// means the connection closed.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>;

/// Opens one connection to the live endpoint.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &Url) -> impl Future<Output = Result<FrameStream, Error>> + Send;
}

/// Production connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<FrameStream, Error> {
        tracing::info!(url = %url, "Connecting to live channel");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let (_write, read) = ws_stream.split();

        let frames = read.filter_map(|frame| async move { frame_payload(frame) });

        Ok(Box::pin(frames))
    }
}

/// Map one socket message to a stream item.
///
/// Text frames pass through. A close frame with a payload ends the
/// connection as [`Error::WebSocketClosed`] so the close code reaches the
/// reconnect log; a bare close just ends the stream.
fn frame_payload(
    frame: Result<tungstenite::Message, tungstenite::Error>,
) -> Option<Result<String, Error>> {
    match frame {
        Ok(tungstenite::Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(tungstenite::Message::Close(Some(cf))) => Some(Err(Error::WebSocketClosed {
            code: u16::from(cf.code),
            reason: cf.reason.as_str().to_owned(),
        })),
        Ok(tungstenite::Message::Close(None)) => {
            tracing::info!("Live channel close frame received (no payload)");
            None
        }
        Err(e) => Some(Err(Error::WebSocketConnect(e.to_string()))),
        // Binary, Ping, Pong, Frame -- tungstenite answers pings itself
        Ok(_) => None,
    }
}

// ── LiveChannel ──────────────────────────────────────────────────────

/// Handle to a running live update loop.
///
/// Dropping the handle does not stop the loop; call
/// [`shutdown`](Self::shutdown) or cancel the token passed at spawn.
pub struct LiveChannel {
    event_rx: broadcast::Receiver<Arc<MetricEvent>>,
    state_rx: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
}

impl LiveChannel {
    /// Spawn the reconnect loop against a real WebSocket endpoint.
    ///
    /// Returns immediately; the first attempt happens on the spawned task.
    pub fn spawn(url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        Self::spawn_with(WsConnector, url, reconnect, cancel)
    }

    /// Spawn the reconnect loop with a custom [`Connector`].
    pub fn spawn_with<C: Connector>(
        connector: C,
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ChannelState::Disconnected);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            channel_loop(connector, url, event_tx, state_tx, reconnect, task_cancel).await;
        });

        Self {
            event_rx,
            state_rx,
            cancel,
        }
    }

    /// Get a new receiver for the metric event stream.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<MetricEvent>> {
        self.event_rx.resubscribe()
    }

    /// Observe connection state transitions.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Stop the reconnect loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnect loop ────────────────────────────────────────

/// connect → read until close/error → wait `delay` → connect again.
async fn channel_loop<C: Connector>(
    connector: C,
    url: Url,
    event_tx: broadcast::Sender<Arc<MetricEvent>>,
    state_tx: watch::Sender<ChannelState>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        state_tx.send_replace(ChannelState::Connecting);

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&connector, &url, &event_tx, &state_tx) => result,
        };

        state_tx.send_replace(ChannelState::Disconnected);
        match result {
            Ok(()) => tracing::info!(attempt, "Live channel closed"),
            Err(Error::WebSocketClosed { code, reason }) => {
                tracing::info!(code, %reason, attempt, "Live channel closed by server");
            }
            Err(e) => tracing::warn!(error = %e, attempt, "Live channel error"),
        }

        tracing::debug!(
            delay_ms = u64::try_from(reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(reconnect.delay) => {}
        }
    }

    state_tx.send_replace(ChannelState::Disconnected);
    tracing::debug!("Live channel loop exiting");
}

/// Run a single connection until the stream ends or errors.
async fn connect_and_read<C: Connector>(
    connector: &C,
    url: &Url,
    event_tx: &broadcast::Sender<Arc<MetricEvent>>,
    state_tx: &watch::Sender<ChannelState>,
) -> Result<(), Error> {
    let mut frames = connector.connect(url).await?;
    state_tx.send_replace(ChannelState::Connected);
    tracing::info!("Live channel connected");

    while let Some(frame) = frames.next().await {
        let text = frame?;
        for event in parse_metric_events(&text) {
            // No subscribers is fine; the sample is simply not observed.
            let _ = event_tx.send(Arc::new(event));
        }
    }

    Ok(())
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a text frame into metric events.
///
/// Accepts a JSON array of events or a single event object. Elements that
/// are not valid events are skipped; a frame that is not JSON yields nothing.
pub fn parse_metric_events(text: &str) -> Vec<MetricEvent> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::trace!(error = %e, "Dropping malformed live frame");
            return Vec::new();
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => {
            tracing::trace!("Dropping live frame that is neither array nor object");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<MetricEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::trace!(error = %e, "Skipping malformed metric event");
                None
            }
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────
