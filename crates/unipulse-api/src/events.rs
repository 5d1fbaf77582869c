//! Push-event stream listener.
//!
//! Opens the controller's WebSocket endpoint for the configured site and
//! redistributes decoded envelopes as named [`ControllerEvent`]s through a
//! [`tokio::sync::broadcast`] channel. Malformed frames and transport read
//! faults are logged and tolerated; the stream ends only on the transport's
//! own close signal or an explicit [`EventStream::shutdown`]. Reconnection
//! policy belongs to the caller, not this type.
//!
//! # Example
//!
//! ```rust,ignore
//! let controller = Controller::new(config)?;
//! let stream = controller.events().await?;
//! let mut rx = stream.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{}: {}", event.name, event.payload);
//! }
//!
//! stream.shutdown();
//! ```

use std::sync::Arc;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::Controller;
use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── ControllerEvent ──────────────────────────────────────────────────

/// A named push event redistributed to subscribers.
///
/// Payloads are opaque pass-through snapshots -- nothing beyond the
/// dispatch name is validated here.
#[derive(Debug, Clone)]
pub struct ControllerEvent {
    /// Raw wire name: the element's `key` for batched events, the
    /// envelope's `meta.message` for sync notices.
    pub name: String,
    /// Classified kind; [`EventKind::Unknown`] for names outside the
    /// catalog, so new server-side event types pass through untouched.
    pub kind: EventKind,
    /// Opaque payload.
    pub payload: Value,
}

/// The known catalog of push-event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventKind {
    WirelessUserConnected,
    WirelessUserDisconnected,
    WirelessUserRoam,
    WirelessGuestConnected,
    WirelessGuestDisconnected,
    WirelessGuestRoam,
    WiredUserConnected,
    WiredUserDisconnected,
    WiredGuestConnected,
    WiredGuestDisconnected,
    DeviceSync,
    ClientSync,
    Unknown,
}

impl EventKind {
    /// Classify a wire name. Names outside the catalog map to `Unknown`.
    pub fn classify(name: &str) -> Self {
        match name {
            "EVT_WU_Connected" => Self::WirelessUserConnected,
            "EVT_WU_Disconnected" => Self::WirelessUserDisconnected,
            "EVT_WU_Roam" | "EVT_WU_RoamRadio" => Self::WirelessUserRoam,
            "EVT_WG_Connected" => Self::WirelessGuestConnected,
            "EVT_WG_Disconnected" => Self::WirelessGuestDisconnected,
            "EVT_WG_Roam" | "EVT_WG_RoamRadio" => Self::WirelessGuestRoam,
            "EVT_LU_Connected" => Self::WiredUserConnected,
            "EVT_LU_Disconnected" => Self::WiredUserDisconnected,
            "EVT_LG_Connected" => Self::WiredGuestConnected,
            "EVT_LG_Disconnected" => Self::WiredGuestDisconnected,
            "device:sync" | "device.sync" => Self::DeviceSync,
            "sta:sync" | "sta.sync" => Self::ClientSync,
            _ => Self::Unknown,
        }
    }
}

// ── EventStream ──────────────────────────────────────────────────────

/// Handle to a running push-event stream.
///
/// One connection per handle lifetime. Drop all receivers and call
/// [`shutdown`](Self::shutdown) to tear down the background read task.
pub struct EventStream {
    event_tx: broadcast::Sender<Arc<ControllerEvent>>,
    cancel: CancellationToken,
}

impl Controller {
    /// Open the push-event stream for the configured site.
    ///
    /// Logs in first if no credentials are stored yet -- the push channel
    /// presents the session token at connection time, not per message.
    /// Resolves exactly once, on the first successful open; a connect
    /// failure is the returned error.
    pub async fn events(&self) -> Result<EventStream, Error> {
        self.ensure_authenticated().await?;

        let url = self.events_url()?;
        let token = self.session().credentials().and_then(|c| c.token);
        EventStream::connect(url, token).await
    }

    /// The WebSocket endpoint for this site, with the base URL's scheme
    /// upgraded (`https` -> `wss`, `http` -> `ws`).
    fn events_url(&self) -> Result<Url, Error> {
        let base = self.base_url();
        let scheme = if base.scheme() == "http" { "ws" } else { "wss" };
        let host = base
            .host_str()
            .ok_or_else(|| Error::WebSocketConnect("base URL has no host".into()))?;

        let full = match base.port() {
            Some(port) => format!("{scheme}://{host}:{port}/wss/s/{}/events", self.site()),
            None => format!("{scheme}://{host}/wss/s/{}/events", self.site()),
        };
        Url::parse(&full).map_err(Error::InvalidUrl)
    }
}

impl EventStream {
    /// Connect to the push endpoint and spawn the read loop.
    pub(crate) async fn connect(url: Url, session_token: Option<String>) -> Result<Self, Error> {
        tracing::info!(url = %url, "connecting to event stream");

        let uri: tungstenite::http::Uri = url.as_str().parse().map_err(
            |e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()),
        )?;

        let mut request = ClientRequestBuilder::new(uri);
        if let Some(token) = session_token {
            request = request.with_header("Cookie", format!("unifises={token}"));
        }

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("event stream connected");

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let task_tx = event_tx.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            read_loop(ws_stream, &task_tx, &task_cancel).await;
        });

        Ok(Self { event_tx, cancel })
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// Multiple consumers can subscribe concurrently. A consumer that
    /// falls behind receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ControllerEvent>> {
        self.event_tx.subscribe()
    }

    /// Signal the background read task to shut down.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Read loop ────────────────────────────────────────────────────────

/// Read frames until the transport closes or shutdown is requested.
///
/// Read errors are logged and tolerated; only the transport's own close
/// signal (close frame or stream end) terminates the loop.
async fn read_loop(
    ws_stream: WsStream,
    event_tx: &broadcast::Sender<Arc<ControllerEvent>>,
    cancel: &CancellationToken,
) {
    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        decode_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite replies with pongs automatically
                        tracing::trace!("event stream ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "event stream close frame received"
                            );
                        } else {
                            tracing::info!("event stream close frame received (no payload)");
                        }
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "event stream read fault, continuing");
                    }
                    None => {
                        tracing::info!("event stream ended");
                        break;
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }

    tracing::debug!("event stream loop exiting");
}

// ── Frame decoding ───────────────────────────────────────────────────

/// Wire envelope around every push message.
#[derive(Debug, Deserialize)]
struct Envelope {
    meta: EnvelopeMeta,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMeta {
    message: String,
}

/// Why a frame could not be decoded. Contained here: frames that fail to
/// decode are logged and dropped, never surfaced to subscribers.
#[derive(Debug, thiserror::Error)]
enum FrameError {
    #[error("invalid envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("batched events payload is not an array")]
    NotABatch,
}

/// Decode one text frame into zero or more events.
///
/// `meta.message == "events"` is the batched case: one event per element,
/// named by the element's own `key` discriminator. Anything else is a
/// sync notice: one event named by `meta.message`, payload passed through
/// verbatim.
fn decode_frame(text: &str) -> Result<Vec<ControllerEvent>, FrameError> {
    let envelope: Envelope = serde_json::from_str(text)?;

    if envelope.meta.message == "events" {
        let Value::Array(items) = envelope.data else {
            return Err(FrameError::NotABatch);
        };

        let mut events = Vec::with_capacity(items.len());
        for item in items {
            match item.get("key").and_then(Value::as_str) {
                Some(key) => {
                    let name = key.to_owned();
                    events.push(ControllerEvent {
                        kind: EventKind::classify(&name),
                        name,
                        payload: item,
                    });
                }
                None => {
                    tracing::debug!("dropping batched event without a key discriminator");
                }
            }
        }
        return Ok(events);
    }

    let name = envelope.meta.message;
    Ok(vec![ControllerEvent {
        kind: EventKind::classify(&name),
        name,
        payload: envelope.data,
    }])
}

/// Decode a frame and broadcast whatever events it contains.
fn decode_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<ControllerEvent>>) {
    match decode_frame(text) {
        Ok(events) => {
            for event in events {
                // Send errors just mean no active subscribers right now
                let _ = event_tx.send(Arc::new(event));
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "discarding undecodable frame");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batched_frame_emits_one_event_per_element() {
        let frame = json!({
            "meta": { "message": "events" },
            "data": [{ "key": "EVT_WU_Connected", "mac": "AA:BB:CC:DD:EE:FF" }]
        });

        let events = decode_frame(&frame.to_string()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "EVT_WU_Connected");
        assert_eq!(events[0].kind, EventKind::WirelessUserConnected);
        assert_eq!(
            events[0].payload,
            json!({ "key": "EVT_WU_Connected", "mac": "AA:BB:CC:DD:EE:FF" })
        );
    }

    #[test]
    fn batched_frame_with_several_elements() {
        let frame = json!({
            "meta": { "message": "events" },
            "data": [
                { "key": "EVT_LU_Connected", "mac": "aa:aa:aa:aa:aa:aa" },
                { "key": "EVT_WG_Disconnected", "mac": "bb:bb:bb:bb:bb:bb" },
                { "key": "EVT_SOMETHING_New", "mac": "cc:cc:cc:cc:cc:cc" }
            ]
        });

        let events = decode_frame(&frame.to_string()).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::WiredUserConnected);
        assert_eq!(events[1].kind, EventKind::WirelessGuestDisconnected);
        assert_eq!(events[2].kind, EventKind::Unknown);
        assert_eq!(events[2].name, "EVT_SOMETHING_New");
    }

    #[test]
    fn sync_frame_emits_one_event_named_by_message() {
        let frame = json!({
            "meta": { "message": "device.sync" },
            "data": { "mac": "AA:BB:CC:DD:EE:FF" }
        });

        let events = decode_frame(&frame.to_string()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "device.sync");
        assert_eq!(events[0].kind, EventKind::DeviceSync);
        assert_eq!(events[0].payload, json!({ "mac": "AA:BB:CC:DD:EE:FF" }));
    }

    #[test]
    fn batched_element_without_key_is_dropped() {
        let frame = json!({
            "meta": { "message": "events" },
            "data": [
                { "mac": "aa:aa:aa:aa:aa:aa" },
                { "key": "EVT_WU_Roam", "mac": "bb:bb:bb:bb:bb:bb" }
            ]
        });

        let events = decode_frame(&frame.to_string()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "EVT_WU_Roam");
    }

    #[test]
    fn non_json_frame_is_undecodable() {
        assert!(decode_frame("not-json").is_err());
    }

    #[test]
    fn frame_without_meta_is_undecodable() {
        assert!(decode_frame(r#"{"data":[{"key":"EVT_WU_Connected"}]}"#).is_err());
    }

    #[test]
    fn batched_frame_with_non_array_data_is_undecodable() {
        let frame = json!({
            "meta": { "message": "events" },
            "data": { "key": "EVT_WU_Connected" }
        });
        assert!(matches!(
            decode_frame(&frame.to_string()),
            Err(FrameError::NotABatch)
        ));
    }

    #[test]
    fn undecodable_frame_broadcasts_nothing() {
        let (tx, mut rx) = broadcast::channel::<Arc<ControllerEvent>>(16);

        decode_and_broadcast("not-json", &tx);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn decode_and_broadcast_fans_out() {
        let (tx, mut rx) = broadcast::channel(16);

        let frame = json!({
            "meta": { "message": "events" },
            "data": [{ "key": "EVT_WU_Connected", "mac": "AA:BB:CC:DD:EE:FF" }]
        });
        decode_and_broadcast(&frame.to_string(), &tx);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.name, "EVT_WU_Connected");
        assert!(rx.try_recv().is_err(), "exactly one event expected");
    }

    #[test]
    fn classify_covers_roam_variants() {
        assert_eq!(
            EventKind::classify("EVT_WU_RoamRadio"),
            EventKind::WirelessUserRoam
        );
        assert_eq!(EventKind::classify("sta:sync"), EventKind::ClientSync);
        assert_eq!(EventKind::classify("EVT_XX_Whatever"), EventKind::Unknown);
    }
}
