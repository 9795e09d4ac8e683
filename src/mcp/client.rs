use log::{debug, error, info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use super::state::SharedState;
use super::transport_sse::run_reader;
use super::types::{
    ConnectionState, InitializeResult, Notification, RpcRequest, RpcResponse, Tool,
    ToolListResponse,
};
use crate::error::{McpError, Result};

// MCP Protocol constants
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const CLIENT_NAME: &str = "mcp-sse";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const HANDSHAKE_POLL_INTERVAL: Duration = Duration::from_millis(25);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    /// Applies to each POST and to the health check, never to the SSE stream.
    pub request_timeout: Duration,
    /// How long `connect()` waits for the `endpoint` event.
    pub handshake_timeout: Duration,
    pub headers: HashMap<String, String>,
    pub client_name: String,
    pub client_version: String,
    pub protocol_version: String,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            server_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            headers: HashMap::new(),
            client_name: CLIENT_NAME.to_string(),
            client_version: CLIENT_VERSION.to_string(),
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, handshake_timeout: Duration) -> Self {
        self.handshake_timeout = handshake_timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn connect_url(&self) -> String {
        format!("{}/connect", self.server_url)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.server_url)
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| McpError::Config(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| McpError::Config(format!("Invalid value for header '{}': {}", name, e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Client for one SSE-backed MCP session.
///
/// Every method takes `&self`, so a connected client can be shared with a
/// tool-calling layer through an `Arc`. Lifecycle calls (`connect`,
/// `disconnect`) are serialized internally; RPCs are independent HTTP
/// requests and may run concurrently.
pub struct SessionClient {
    config: ClientConfig,
    http: reqwest::Client,
    shared: Arc<SharedState>,
    reader: Mutex<Option<JoinHandle<()>>>,
    tools: RwLock<Vec<Tool>>,
    initialized: AtomicBool,
}

impl SessionClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(config.header_map()?)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            shared: Arc::new(SharedState::new(&config.server_url)),
            config,
            http,
            reader: Mutex::new(None),
            tools: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
        })
    }

    /// Connects and initializes in one step.
    pub async fn open(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config)?;
        client.connect().await?;
        if let Err(e) = client.initialize().await {
            client.disconnect().await;
            return Err(e);
        }
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn session_id(&self) -> Option<String> {
        self.shared.session().map(|s| s.session_id)
    }

    pub fn message_endpoint(&self) -> Option<String> {
        self.shared.session().map(|s| s.message_endpoint)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn cached_tools(&self) -> Vec<Tool> {
        self.tools.read().await.clone()
    }

    pub fn on_notification<F>(&self, handler: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.shared.set_notification_handler(Some(Arc::new(handler)));
    }

    pub fn on_state_change<F>(&self, handler: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        self.shared.set_state_change_handler(Some(Arc::new(handler)));
    }

    pub fn clear_handlers(&self) {
        self.shared.set_notification_handler(None);
        self.shared.set_state_change_handler(None);
    }

    /// Opens the SSE stream and waits for the server to hand out a session.
    ///
    /// A live session is torn down first. On failure the reader is stopped and
    /// the client is left in `ConnectionState::Error`.
    pub async fn connect(&self) -> Result<()> {
        let mut reader = self.reader.lock().await;
        if reader.is_some() || self.shared.session().is_some() {
            info!("Tearing down previous session before reconnecting");
            self.teardown(&mut reader).await;
        }
        self.forget_session().await;

        info!("Connecting to MCP server at {}", self.config.server_url);
        self.shared.set_state(ConnectionState::Connecting);

        let handle = tokio::spawn(run_reader(
            self.http.clone(),
            self.config.connect_url(),
            self.shared.clone(),
        ));

        match self.wait_for_session(&handle).await {
            Ok(session_id) => {
                *reader = Some(handle);
                info!("Connected with session ID: {}", session_id);
                Ok(())
            }
            Err(e) => {
                handle.abort();
                let _ = handle.await;
                self.forget_session().await;
                self.shared.set_state(ConnectionState::Error);
                error!("Failed to connect: {}", e);
                Err(e)
            }
        }
    }

    async fn wait_for_session(&self, handle: &JoinHandle<()>) -> Result<String> {
        let poll = async {
            loop {
                if let Some(session) = self.shared.session() {
                    return Ok(session.session_id);
                }
                if handle.is_finished() {
                    return Err(McpError::Connection(
                        "SSE stream ended before the server sent a session id".to_string(),
                    ));
                }
                tokio::time::sleep(HANDSHAKE_POLL_INTERVAL).await;
            }
        };

        match timeout(self.config.handshake_timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(McpError::Connection(format!(
                "Failed to receive session ID from server within {}ms",
                self.config.handshake_timeout.as_millis()
            ))),
        }
    }

    /// Stops the reader and forgets the session. Safe to call in any state and
    /// any number of times. In-flight RPCs are left to finish or fail.
    pub async fn disconnect(&self) {
        info!("Disconnecting from MCP server");
        let mut reader = self.reader.lock().await;
        self.teardown(&mut reader).await;
    }

    async fn teardown(&self, reader: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = reader.take() {
            handle.abort();
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!("SSE reader panicked: {}", e);
                }
            }
        }

        self.forget_session().await;
        self.shared.set_state(ConnectionState::Disconnected);
    }

    /// Drops the session together with everything learned over it. Holds the
    /// tool cache lock so that `commit_to_session` cannot interleave.
    async fn forget_session(&self) {
        let mut tools = self.tools.write().await;
        self.shared.clear_session();
        self.initialized.store(false, Ordering::SeqCst);
        tools.clear();
    }

    fn current_session_id(&self) -> Result<String> {
        self.session_id().ok_or_else(|| {
            McpError::NotConnected("no session; call connect() first".to_string())
        })
    }

    /// Applies `update` only if `session_id` is still the live session. A
    /// response that outlived its session must not leak into the next one.
    async fn commit_to_session<F>(&self, session_id: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Tool>, &AtomicBool),
    {
        let mut tools = self.tools.write().await;
        if self.session_id().as_deref() != Some(session_id) {
            warn!("Session {} ended before its response arrived", session_id);
            return Err(McpError::NotConnected(format!(
                "session {} ended while the request was in flight",
                session_id
            )));
        }
        update(&mut *tools, &self.initialized);
        Ok(())
    }

    /// One request/response exchange against the session's message endpoint.
    ///
    /// HTTP and network failures come back as transport errors; a server
    /// `error` object is left in the returned envelope for the caller.
    pub async fn send_request(&self, method: &str, params: Option<Value>) -> Result<RpcResponse> {
        let endpoint = self.message_endpoint().ok_or_else(|| {
            McpError::NotConnected("no session; call connect() first".to_string())
        })?;

        let request = RpcRequest::new(method, params);
        debug!("Sending request: {} ({})", method, request.id);

        let response = self
            .http
            .post(&endpoint)
            .timeout(self.config.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Request failed: {}", e);
                McpError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Request {} failed with status {}", method, status.as_u16());
            return Err(McpError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let rpc: RpcResponse = serde_json::from_str(&body)
            .map_err(|e| McpError::InvalidResponse(format!("malformed response body: {}", e)))?;

        if !rpc.matches_id(&request.id) {
            return Err(McpError::InvalidResponse(format!(
                "response id {} does not match request id {}",
                rpc.id.as_ref().map(Value::to_string).unwrap_or_default(),
                request.id
            )));
        }

        Ok(rpc)
    }

    /// Protocol handshake. A server-side refusal is returned as
    /// `McpError::Protocol` and leaves the connection as it was.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let session_id = self.current_session_id()?;
        let params = json!({
            "protocolVersion": self.config.protocol_version,
            "capabilities": {
                "tools": {}
            },
            "clientInfo": {
                "name": self.config.client_name,
                "version": self.config.client_version
            }
        });

        let result = self
            .send_request("initialize", Some(params))
            .await?
            .into_result()
            .map_err(|e| {
                error!("Initialize failed: {}", e);
                e
            })?;

        self.commit_to_session(&session_id, |_, initialized| {
            initialized.store(true, Ordering::SeqCst)
        })
        .await?;

        let init: InitializeResult = serde_json::from_value(result).unwrap_or_else(|e| {
            warn!("Unexpected initialize result shape, using defaults: {}", e);
            InitializeResult::default()
        });
        info!(
            "MCP session initialized successfully (server: {} {})",
            init.server_info.name, init.server_info.version
        );
        Ok(init)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(McpError::NotConnected(
                "client not initialized; call initialize() first".to_string(),
            ))
        }
    }

    /// Fetches the server's tools, replacing the cached list.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_initialized()?;
        let session_id = self.current_session_id()?;

        let result = self
            .send_request("tools/list", None)
            .await?
            .into_result()
            .map_err(|e| {
                error!("Failed to list tools: {}", e);
                e
            })?;

        let tool_list: ToolListResponse = serde_json::from_value(result)?;
        for tool in &tool_list.tools {
            debug!("  - Tool: {} - {}", tool.name, tool.description);
        }
        info!("Retrieved {} tools", tool_list.tools.len());

        self.commit_to_session(&session_id, |tools, _| *tools = tool_list.tools.clone())
            .await?;
        Ok(tool_list.tools)
    }

    /// Runs a tool and returns the server's `result` untouched. Arguments are
    /// not checked against the tool's schema; the server reports violations.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        self.ensure_initialized()?;

        let params = json!({
            "name": name,
            "arguments": arguments,
        });

        self.send_request("tools/call", Some(params))
            .await?
            .into_result()
            .map_err(|e| {
                error!("Failed to call tool {}: {}", name, e);
                e
            })
    }

    /// Polls `/health`. Any failure, including a body that is not the
    /// expected JSON, reads as unhealthy.
    pub async fn health_check(&self) -> bool {
        match self.fetch_health().await {
            Ok(healthy) => healthy,
            Err(e) => {
                error!("Health check failed: {}", e);
                false
            }
        }
    }

    async fn fetch_health(&self) -> Result<bool> {
        let response = self
            .http
            .get(self.config.health_url())
            .timeout(self.config.request_timeout)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = serde_json::from_str(&response.text().await?)?;
        let status = body.get("status").and_then(Value::as_str);
        if status != Some("healthy") {
            debug!("Server reported status {:?}", status);
        }
        Ok(status == Some("healthy"))
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        if let Some(handle) = self.reader.get_mut().take() {
            handle.abort();
        }
    }
}

/// Connect, initialize, run one tool, disconnect.
pub async fn quick_tool_call(config: ClientConfig, name: &str, arguments: Value) -> Result<Value> {
    let client = SessionClient::open(config).await?;
    let result = client.call_tool(name, arguments).await;
    client.disconnect().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(config.server_url, "http://localhost:8000");
        assert_eq!(config.connect_url(), "http://localhost:8000/connect");
        assert_eq!(config.health_url(), "http://localhost:8000/health");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let config = ClientConfig::new("http://localhost:8000").with_header("bad header", "x");
        assert!(matches!(SessionClient::new(config), Err(McpError::Config(_))));
    }

    #[tokio::test]
    async fn test_fresh_client_is_disconnected() {
        let client = SessionClient::new(ClientConfig::new("http://localhost:8000")).unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(client.session_id().is_none());
        assert!(!client.is_initialized());
        assert!(client.cached_tools().await.is_empty());
    }

    #[tokio::test]
    async fn test_rpc_before_connect_is_not_connected() {
        let client = SessionClient::new(ClientConfig::new("http://localhost:8000")).unwrap();
        assert!(matches!(
            client.send_request("ping", None).await,
            Err(McpError::NotConnected(_))
        ));
        assert!(matches!(
            client.initialize().await,
            Err(McpError::NotConnected(_))
        ));
    }
}
