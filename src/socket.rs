//! Socket.IO (Engine.IO v4) over a plain websocket.
//!
//! Only the text frames the portal needs are understood: open, ping,
//! namespace connect / disconnect and events. Binary and ack frames are
//! ignored.

use crate::client::GraphqlTransport;
use crate::errors::Result;
use crate::loader::LoaderRegistry;
use crate::session::{Session, SocketEvent};
use anyhow::Context;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// One decoded text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Engine.IO handshake, carrying the session JSON.
    Open(Value),
    Ping,
    Pong,
    Close,
    /// Socket.IO namespace connected.
    Connected,
    /// Socket.IO namespace disconnected.
    Disconnected,
    Event { name: String, payload: Option<Value> },
    Other(String),
}

/// Decode one Engine.IO text packet.
pub fn decode_frame(text: &str) -> Frame {
    let mut chars = text.chars();
    match chars.next() {
        Some('0') => Frame::Open(serde_json::from_str(chars.as_str()).unwrap_or(Value::Null)),
        Some('1') => Frame::Close,
        Some('2') => Frame::Ping,
        Some('3') => Frame::Pong,
        Some('4') => decode_message(chars.as_str()),
        _ => Frame::Other(text.to_string()),
    }
}

/// Socket.IO packet inside an Engine.IO message (`4…`).
fn decode_message(body: &str) -> Frame {
    let mut chars = body.chars();
    match chars.next() {
        Some('0') => Frame::Connected,
        Some('1') => Frame::Disconnected,
        Some('2') => decode_event(chars.as_str()).unwrap_or_else(|| Frame::Other(body.to_string())),
        _ => Frame::Other(body.to_string()),
    }
}

/// `["name", payload?]`, optionally preceded by a namespace (`/ns,`) and an
/// ack id.
fn decode_event(rest: &str) -> Option<Frame> {
    let rest = match rest.strip_prefix('/') {
        Some(ns) => ns.split_once(',')?.1,
        None => rest,
    };
    let json_start = rest.find('[')?;
    let mut parts = match serde_json::from_str::<Value>(&rest[json_start..]).ok()? {
        Value::Array(parts) => parts.into_iter(),
        _ => return None,
    };
    let name = match parts.next()? {
        Value::String(name) => name,
        _ => return None,
    };
    Some(Frame::Event {
        name,
        payload: parts.next(),
    })
}

/// Map a frame to the session event it implies, if any.
pub fn to_socket_event(frame: &Frame) -> Option<SocketEvent> {
    match frame {
        Frame::Connected => Some(SocketEvent::Connect),
        Frame::Disconnected | Frame::Close => Some(SocketEvent::Disconnect),
        Frame::Event { name, .. } => Some(SocketEvent::from_name(name)),
        _ => None,
    }
}

/// Apply an event: update the session and reload loaders bound to it.
pub async fn dispatch(
    event: &SocketEvent,
    session: &Session,
    registry: &LoaderRegistry,
    transport: &dyn GraphqlTransport,
) {
    session.apply(event);
    match event {
        SocketEvent::Message(name) => {
            registry.handle_event(name, transport).await;
        }
        SocketEvent::Connect => {
            // fresh connection: whatever we cached may be stale
            for (name, res) in registry.refresh_all(transport).await {
                if let Err(e) = res {
                    debug!(loader = %name, %e, "initial load failed");
                }
            }
        }
        _ => {}
    }
}

/// Connect and pump events until the socket closes. No reconnect; the
/// caller decides whether to call again.
pub async fn run(
    url: &str,
    registry: Arc<LoaderRegistry>,
    session: Arc<Session>,
    transport: Arc<dyn GraphqlTransport>,
) -> Result<()> {
    let (ws, _) = connect_async(url)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    info!(%url, "socket connected");
    let (mut sink, mut stream) = ws.split();

    while let Some(msg) = stream.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(%e, "socket read failed");
                break;
            }
        };

        let frame = decode_frame(&text);
        match &frame {
            Frame::Open(handshake) => {
                debug!(%handshake, "engine.io open");
                // join the default namespace
                sink.send(Message::Text("40".into())).await?;
            }
            Frame::Ping => sink.send(Message::Text("3".into())).await?,
            Frame::Other(raw) => debug!(%raw, "ignored frame"),
            _ => {}
        }
        if let Some(event) = to_socket_event(&frame) {
            dispatch(&event, &session, &registry, transport.as_ref()).await;
        }
    }

    session.apply(&SocketEvent::Disconnect);
    info!("socket closed");
    Ok(())
}
