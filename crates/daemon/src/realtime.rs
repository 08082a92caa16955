//! Pusher channel client for pushed call snapshots.
//!
//! Speaks protocol 7 over a websocket: wait for `pusher:connection_established`,
//! sign the private channel through the auth endpoint with the current
//! bearer token, subscribe, then forward every matching event as a [`Call`].
//! The connection is torn down and re-established whenever the access token
//! changes, and stays closed while there is none.

use std::sync::Arc;
use std::time::Duration;

use callboard_api::{Call, ChannelAuthRequest};
use callboard_api_client::{ApiClient, GatewayError};
use callboard_runtime_config::RealtimeSettings;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "7";
const CLIENT_NAME: &str = "callboard-rs";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("channel auth failed: {0}")]
    Auth(#[from] GatewayError),

    #[error("invalid socket url: {0}")]
    Url(#[from] url::ParseError),

    #[error("pusher error {code:?}: {message}")]
    Pusher { code: Option<u16>, message: String },
}

pub type Result<T> = std::result::Result<T, RealtimeError>;

/// Where and what to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub app_key: String,
    pub cluster: String,
    pub auth_endpoint: String,
    pub channel: String,
    pub event: String,
}

impl From<&RealtimeSettings> for ChannelConfig {
    fn from(settings: &RealtimeSettings) -> Self {
        Self {
            app_key: settings.app_key.clone(),
            cluster: settings.cluster.clone(),
            auth_endpoint: settings.auth_endpoint.clone(),
            channel: settings.channel.clone(),
            event: settings.event.clone(),
        }
    }
}

impl ChannelConfig {
    pub fn socket_url(&self) -> Result<url::Url> {
        let base = format!("wss://ws-{}.pusher.com/app/{}", self.cluster, self.app_key);
        Ok(url::Url::parse_with_params(
            &base,
            &[
                ("protocol", PROTOCOL_VERSION),
                ("client", CLIENT_NAME),
                ("version", env!("CARGO_PKG_VERSION")),
                ("flash", "false"),
            ],
        )?)
    }
}

// ── Frames ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// An inbound protocol frame, reduced to what the client acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Connected { socket_id: String },
    Subscribed { channel: String },
    Ping,
    Error { code: Option<u16>, message: String },
    Event {
        event: String,
        channel: Option<String>,
        data: Value,
    },
}

/// Pusher double-encodes `data` as a JSON string; accept either form.
fn unwrap_data(data: Option<Value>) -> Result<Value> {
    match data {
        Some(Value::String(s)) if s.is_empty() => Ok(Value::Null),
        Some(Value::String(s)) => Ok(serde_json::from_str(&s)?),
        Some(value) => Ok(value),
        None => Ok(Value::Null),
    }
}

pub fn parse_frame(text: &str) -> Result<Frame> {
    let raw: RawFrame = serde_json::from_str(text)?;
    let frame = match raw.event.as_str() {
        "pusher:connection_established" => {
            let data = unwrap_data(raw.data)?;
            let socket_id = data
                .get("socket_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Frame::Connected { socket_id }
        }
        "pusher_internal:subscription_succeeded" => Frame::Subscribed {
            channel: raw.channel.unwrap_or_default(),
        },
        "pusher:ping" => Frame::Ping,
        "pusher:error" => {
            let data = unwrap_data(raw.data)?;
            Frame::Error {
                code: data
                    .get("code")
                    .and_then(Value::as_u64)
                    .and_then(|c| u16::try_from(c).ok()),
                message: data
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
        }
        _ => Frame::Event {
            event: raw.event,
            channel: raw.channel,
            data: unwrap_data(raw.data)?,
        },
    };
    Ok(frame)
}

/// Decode a pushed call snapshot.
pub fn decode_call(data: Value) -> Result<Call> {
    Ok(serde_json::from_value(data)?)
}

fn subscribe_message(channel: &str, auth: &str) -> Message {
    let body = json!({
        "event": "pusher:subscribe",
        "data": { "auth": auth, "channel": channel },
    });
    Message::Text(body.to_string().into())
}

fn pong_message() -> Message {
    Message::Text(json!({ "event": "pusher:pong", "data": {} }).to_string().into())
}

// ── Connection loop ─────────────────────────────────────────────────────

/// Keep the channel open for as long as there is an access token, sending
/// each pushed call on `updates`. Returns on shutdown or when `updates`
/// is closed.
pub async fn run_channel(
    config: ChannelConfig,
    client: Arc<ApiClient>,
    mut token: watch::Receiver<Option<String>>,
    updates: mpsc::UnboundedSender<Call>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let current = token.borrow_and_update().clone().filter(|t| !t.is_empty());

        let Some(access_token) = current else {
            debug!("realtime idle: no access token");
            tokio::select! {
                changed = token.changed() => if changed.is_err() { return },
                _ = shutdown.changed() => if *shutdown.borrow() { return },
            }
            continue;
        };

        let outcome = tokio::select! {
            result = connect_and_listen(&config, &client, &access_token, &updates) => Some(result),
            changed = token.changed() => {
                if changed.is_err() {
                    return;
                }
                info!("access token changed, reconnecting realtime channel");
                None
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("Realtime channel shutting down");
                    return;
                }
                None
            }
        };

        match outcome {
            Some(Ok(())) if updates.is_closed() => return,
            Some(Ok(())) => info!("realtime connection closed by server"),
            Some(Err(e)) => warn!("realtime connection failed: {e}"),
            None => continue,
        }

        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            _ = token.changed() => {}
            _ = shutdown.changed() => if *shutdown.borrow() { return },
        }
    }
}

async fn connect_and_listen(
    config: &ChannelConfig,
    client: &ApiClient,
    access_token: &str,
    updates: &mpsc::UnboundedSender<Call>,
) -> Result<()> {
    let url = config.socket_url()?;
    let (stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
    let (mut sink, mut source) = stream.split();
    debug!(cluster = %config.cluster, "realtime socket open");

    while let Some(message) = source.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Ping(payload) => {
                sink.send(Message::Pong(payload)).await?;
                continue;
            }
            Message::Close(_) => break,
            _ => continue,
        };

        let frame = match parse_frame(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("skipping malformed realtime frame: {e}");
                continue;
            }
        };

        match frame {
            Frame::Connected { socket_id } => {
                let req = ChannelAuthRequest {
                    socket_id,
                    channel_name: config.channel.clone(),
                };
                let signed = client
                    .authorize_channel(&config.auth_endpoint, Some(access_token), &req)
                    .await?;
                sink.send(subscribe_message(&config.channel, &signed.auth))
                    .await?;
            }
            Frame::Subscribed { channel } => info!(%channel, "subscribed to realtime channel"),
            Frame::Ping => sink.send(pong_message()).await?,
            Frame::Error { code, message } => {
                // 4000-4099: the server will not accept a reconnect as-is.
                if code.is_some_and(|c| (4000..4100).contains(&c)) {
                    return Err(RealtimeError::Pusher { code, message });
                }
                warn!(?code, "pusher error: {message}");
            }
            Frame::Event {
                event,
                channel,
                data,
            } => {
                if event != config.event || channel.as_deref() != Some(config.channel.as_str()) {
                    continue;
                }
                match decode_call(data) {
                    Ok(call) => {
                        debug!(call_id = %call.id, "pushed call update");
                        if updates.send(call).is_err() {
                            return Ok(());
                        }
                    }
                    Err(e) => warn!("ignoring undecodable call update: {e}"),
                }
            }
        }
    }
    Ok(())
}
