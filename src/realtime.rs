//! Real-time parser log channel.
//!
//! The backend publishes `parser_log` events over Socket.IO.  This module
//! speaks just enough of Engine.IO v4 over a plain WebSocket to receive them
//! (open → namespace connect, ping → pong, `42[...]` events), and also
//! accepts bare JSON frames `{"event": "parser_log", "data": {...}}` from
//! relays that unwrap the Socket.IO envelope.
//!
//! The channel is the one connection that is retried: on any error or close
//! it reconnects with exponential backoff until the receiving side goes away.

use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use crate::error::ClientResult;
use crate::parser::ParserLog;

pub const PARSER_LOG_EVENT: &str = "parser_log";

/// Path of the Socket.IO WebSocket transport.
pub const SOCKETIO_PATH: &str = "/socket.io/?EIO=4&transport=websocket";

const SOCKETIO_CONNECT: &str = "40";
const ENGINEIO_PONG: &str = "3";
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    Connected,
    Disconnected,
    ParserLog(ParserLog),
}

/// One decoded text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Engine.IO handshake; answer with a namespace connect.
    Open,
    /// Engine.IO heartbeat; answer with a pong.
    Ping,
    Close,
    ParserLog(ParserLog),
    Ignored,
}

#[derive(Deserialize)]
struct PlainFrame {
    #[serde(alias = "channel")]
    event: String,
    #[serde(default)]
    data: Value,
}

pub fn parse_frame(text: &str) -> Frame {
    let text = text.trim();
    if text.starts_with('{') {
        return match serde_json::from_str::<PlainFrame>(text) {
            Ok(frame) => event_frame(&frame.event, frame.data),
            Err(err) => {
                debug!(error = %err, "unreadable realtime frame");
                Frame::Ignored
            }
        };
    }
    match text.chars().next() {
        Some('0') => Frame::Open,
        Some('1') => Frame::Close,
        Some('2') => Frame::Ping,
        Some('4') => socketio_packet(&text[1..]),
        _ => Frame::Ignored,
    }
}

/// Socket.IO packet: type digit, optional `/namespace,`, optional ack id,
/// then a JSON array `[name, data]`.
fn socketio_packet(packet: &str) -> Frame {
    let Some(body) = packet.strip_prefix('2') else {
        return if packet.starts_with('1') {
            Frame::Close
        } else {
            Frame::Ignored
        };
    };
    let body = match body.strip_prefix('/') {
        Some(namespaced) => namespaced.split_once(',').map(|(_, rest)| rest).unwrap_or(""),
        None => body,
    };
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let Ok(mut parts) = serde_json::from_str::<Vec<Value>>(body) else {
        debug!(packet, "unreadable socket.io event");
        return Frame::Ignored;
    };
    if parts.is_empty() {
        return Frame::Ignored;
    }
    let data = if parts.len() > 1 { parts.swap_remove(1) } else { Value::Null };
    match parts[0].as_str() {
        Some(name) => event_frame(name, data),
        None => Frame::Ignored,
    }
}

fn event_frame(name: &str, data: Value) -> Frame {
    if name != PARSER_LOG_EVENT {
        trace!(name, "ignoring realtime event");
        return Frame::Ignored;
    }
    match serde_json::from_value::<ParserLog>(data) {
        Ok(log) => Frame::ParserLog(log),
        Err(err) => {
            warn!(error = %err, "malformed parser_log payload");
            Frame::Ignored
        }
    }
}

enum Flow {
    Closed,
    ReceiverGone,
}

/// Listen on `url` until `emit` reports that nobody is listening.
///
/// `emit` returns `false` once the receiving side is gone.
pub async fn run<F>(url: String, mut emit: F)
where
    F: FnMut(RealtimeEvent) -> bool + Send,
{
    let mut backoff = ExponentialBackoff {
        max_elapsed_time: None,
        ..Default::default()
    };

    loop {
        let mut connected = false;
        match session(&url, &mut emit, &mut connected).await {
            Ok(Flow::ReceiverGone) => {
                debug!("realtime receiver dropped, stopping");
                return;
            }
            Ok(Flow::Closed) => {
                info!("realtime channel closed");
                backoff.reset();
            }
            Err(err) => warn!(error = %err, "realtime channel error"),
        }
        if connected && !emit(RealtimeEvent::Disconnected) {
            return;
        }

        let delay = backoff.next_backoff().unwrap_or(MAX_RECONNECT_DELAY);
        info!(?delay, "reconnecting realtime channel");
        tokio::time::sleep(delay).await;
    }
}

async fn session<F>(url: &str, emit: &mut F, connected: &mut bool) -> ClientResult<Flow>
where
    F: FnMut(RealtimeEvent) -> bool,
{
    let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
    let (mut write, mut read) = ws_stream.split();
    *connected = true;
    info!(url, "realtime channel connected");
    if !emit(RealtimeEvent::Connected) {
        return Ok(Flow::ReceiverGone);
    }

    while let Some(message) = read.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => continue,
            },
            Message::Ping(payload) => {
                write.send(Message::Pong(payload)).await?;
                continue;
            }
            Message::Close(_) => break,
            _ => continue,
        };

        match parse_frame(&text) {
            Frame::Open => write.send(Message::Text(SOCKETIO_CONNECT.to_string())).await?,
            Frame::Ping => write.send(Message::Text(ENGINEIO_PONG.to_string())).await?,
            Frame::Close => break,
            Frame::ParserLog(log) => {
                if !emit(RealtimeEvent::ParserLog(log)) {
                    return Ok(Flow::ReceiverGone);
                }
            }
            Frame::Ignored => {}
        }
    }

    Ok(Flow::Closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_panel::LogLevel;

    #[test]
    fn engineio_control_frames() {
        assert_eq!(parse_frame(r#"0{"sid":"abc","pingInterval":25000}"#), Frame::Open);
        assert_eq!(parse_frame("2"), Frame::Ping);
        assert_eq!(parse_frame("1"), Frame::Close);
        assert_eq!(parse_frame("41"), Frame::Close);
        assert_eq!(parse_frame(r#"40{"sid":"x"}"#), Frame::Ignored);
    }

    #[test]
    fn socketio_parser_log_event() {
        let frame = parse_frame(
            r#"42["parser_log",{"message":"Запуск парсера ria...","type":"info","source":"ria"}]"#,
        );
        let Frame::ParserLog(log) = frame else {
            panic!("expected parser log, got {frame:?}");
        };
        assert_eq!(log.source, "ria");
        assert_eq!(log.level, LogLevel::Info);
    }

    #[test]
    fn socketio_event_with_namespace_and_ack_id() {
        let frame = parse_frame(r#"42/admin,7["parser_log",{"message":"ok","type":"success"}]"#);
        assert!(matches!(frame, Frame::ParserLog(ref l) if l.level == LogLevel::Success));
    }

    #[test]
    fn plain_json_frames() {
        let frame = parse_frame(
            r#"{"channel":"parser_log","data":{"message":"x","source":"tsn","event":"stopped"}}"#,
        );
        assert!(matches!(frame, Frame::ParserLog(ref l) if l.source == "tsn"));
        assert_eq!(parse_frame(r#"{"event":"other","data":{}}"#), Frame::Ignored);
    }

    #[test]
    fn junk_is_ignored() {
        assert_eq!(parse_frame(""), Frame::Ignored);
        assert_eq!(parse_frame("42not json"), Frame::Ignored);
        assert_eq!(parse_frame(r#"42["parser_log","not an object"]"#), Frame::Ignored);
        assert_eq!(parse_frame("{broken"), Frame::Ignored);
    }
}
