//! SSE side of the session: the long-lived `GET /connect` stream, split into
//! lines and routed as server events.
//!
//! Only two things ever travel on this stream: the `endpoint` event that hands
//! out the session id, and fire-and-forget notifications. RPC responses come
//! back in the body of their own POST and are never matched up here.

use bytes::{Buf, BytesMut};
use futures::StreamExt;
use log::{debug, error, info, log, trace, warn, Level};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;

use super::state::SharedState;
use super::types::{ConnectionState, Notification, Session};

/// Longest SSE line accepted before the rest of it is dropped.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Reassembles complete lines from arbitrarily chunked stream bytes.
#[derive(Debug)]
pub struct LineBuffer {
    pending: BytesMut,
    // Bytes of `pending` already known to hold no newline.
    scanned: usize,
    max_line: usize,
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: BytesMut::new(),
            scanned: 0,
            max_line,
            discarding: false,
        }
    }

    /// Appends a chunk and returns every line it completed, without the
    /// trailing `\n` or `\r\n`. Lines longer than the limit are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.pending[self.scanned..].iter().position(|b| *b == b'\n') {
            let line = self.pending.split_to(self.scanned + offset);
            self.pending.advance(1);
            self.scanned = 0;

            if self.discarding {
                self.discarding = false;
            } else {
                lines.push(decode_line(&line));
            }
        }
        self.scanned = self.pending.len();

        if self.pending.len() > self.max_line {
            if !self.discarding {
                warn!("Dropping SSE line longer than {} bytes", self.max_line);
            }
            self.discarding = true;
            self.pending.clear();
            self.scanned = 0;
        }
        lines
    }

    /// Whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if std::mem::take(&mut self.discarding) || self.pending.is_empty() {
            self.pending.clear();
            return None;
        }
        let rest = self.pending.split();
        Some(decode_line(&rest))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Turns SSE lines into server events and routes them.
#[derive(Clone)]
pub(crate) struct EventDispatcher {
    shared: Arc<SharedState>,
}

impl EventDispatcher {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    pub(crate) fn dispatch_line(&self, line: &str) {
        if line.is_empty() || line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => match serde_json::from_str::<Value>(value) {
                Ok(event) => self.dispatch_event(event),
                Err(e) => error!("Failed to parse SSE data: {} (line: {})", e, line),
            },
            "event" | "id" | "retry" => trace!("SSE {}: {}", field, value),
            _ => debug!("Unknown SSE field: {}", field),
        }
    }

    pub(crate) fn dispatch_event(&self, event: Value) {
        let method = event.get("method").and_then(Value::as_str);

        match method {
            Some("endpoint") => self.handle_endpoint(&event),
            Some("notifications/message") => {
                let notification = to_notification(&event);
                log!(
                    log_level_for(notification.level()),
                    "Server notification: {}",
                    notification.data()
                );
                self.shared.notify(&notification);
            }
            Some("ping") => debug!("Received heartbeat from server"),
            _ => {
                debug!("Received event: {}", event);
                self.shared.notify(&to_notification(&event));
            }
        }
    }

    fn handle_endpoint(&self, event: &Value) {
        let uri = event
            .get("params")
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let Some(session_id) = session_id_from_uri(uri) else {
            warn!("Endpoint event without a session id: {}", uri);
            return;
        };

        let session = Session {
            message_endpoint: message_endpoint_for(self.shared.base_url(), &session_id),
            session_id,
        };
        let endpoint = session.message_endpoint.clone();

        if self.shared.establish_session(session) {
            info!("Received endpoint: {}", endpoint);
        } else {
            warn!("Ignoring repeated endpoint event: {}", uri);
        }
    }
}

fn to_notification(event: &Value) -> Notification {
    Notification {
        method: event
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string),
        params: event.get("params").cloned().unwrap_or(Value::Null),
    }
}

/// Maps the server's level names onto `log` levels; unknown names log at info.
pub fn log_level_for(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "debug" => Level::Debug,
        "warning" | "warn" => Level::Warn,
        "error" | "critical" | "alert" | "emergency" => Level::Error,
        _ => Level::Info,
    }
}

/// Pulls `sessionId` out of an absolute or server-relative URI.
pub fn session_id_from_uri(uri: &str) -> Option<String> {
    let base = Url::parse("http://localhost/").ok()?;
    let url = base.join(uri).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "sessionId")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

pub fn message_endpoint_for(base_url: &str, session_id: &str) -> String {
    match Url::parse(&format!("{}/messages", base_url)) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("sessionId", session_id);
            url.to_string()
        }
        Err(_) => format!("{}/messages?sessionId={}", base_url, session_id),
    }
}

/// Body of the background reader task. Runs until the stream ends, fails, or
/// the task is aborted by `disconnect()`.
pub(crate) async fn run_reader(http: reqwest::Client, connect_url: String, shared: Arc<SharedState>) {
    let response = match http
        .get(&connect_url)
        .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("SSE connection error: {}", e);
            shared.set_state(ConnectionState::Error);
            return;
        }
    };

    if !response.status().is_success() {
        error!(
            "SSE connection rejected with status {}",
            response.status().as_u16()
        );
        shared.set_state(ConnectionState::Error);
        return;
    }

    shared.set_state(ConnectionState::Connected);

    let dispatcher = EventDispatcher::new(shared.clone());
    let mut stream = response.bytes_stream();
    let mut lines = LineBuffer::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                for line in lines.push(&bytes) {
                    dispatcher.dispatch_line(&line);
                }
            }
            Err(e) => {
                error!("Error processing SSE events: {}", e);
                shared.set_state(ConnectionState::Error);
                return;
            }
        }
    }

    if let Some(line) = lines.finish() {
        dispatcher.dispatch_line(&line);
    }
    warn!("SSE stream closed by server");
}
