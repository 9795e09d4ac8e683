use crate::mcp::types::RpcError;
use std::fmt;

#[derive(Debug)]
pub enum McpError {
    /// The SSE stream could not be opened or the session id never arrived.
    Connection(String),
    /// An RPC was attempted before `connect()`/`initialize()` succeeded.
    NotConnected(String),
    /// The server answered with a JSON-RPC `error` object.
    Protocol(RpcError),
    /// The POST never produced a usable HTTP response.
    Transport(reqwest::Error),
    HttpStatus {
        status: u16,
        message: String,
    },
    InvalidResponse(String),
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Other(String),
}

impl McpError {
    /// True for failures where the request may never have reached server logic.
    pub fn is_transport(&self) -> bool {
        matches!(self, McpError::Transport(_) | McpError::HttpStatus { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, McpError::Protocol(_))
    }

    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            McpError::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McpError::Connection(msg) => write!(f, "Connection error: {}", msg),
            McpError::NotConnected(msg) => write!(f, "Not connected: {}", msg),
            McpError::Protocol(err) => write!(f, "Server error: {}", err),
            McpError::Transport(e) => write!(f, "Transport error: {}", e),
            McpError::HttpStatus { status, message } => {
                write!(f, "HTTP error (status {}): {}", status, message)
            }
            McpError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            McpError::Config(msg) => write!(f, "Configuration error: {}", msg),
            McpError::Io(e) => write!(f, "IO error: {}", e),
            McpError::Json(e) => write!(f, "JSON error: {}", e),
            McpError::Yaml(e) => write!(f, "YAML error: {}", e),
            McpError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for McpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            McpError::Transport(e) => Some(e),
            McpError::Io(e) => Some(e),
            McpError::Json(e) => Some(e),
            McpError::Yaml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        McpError::Transport(err)
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err)
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Json(err)
    }
}

impl From<serde_yaml::Error> for McpError {
    fn from(err: serde_yaml::Error) -> Self {
        McpError::Yaml(err)
    }
}

impl From<anyhow::Error> for McpError {
    fn from(err: anyhow::Error) -> Self {
        McpError::Config(format!("{:#}", err))
    }
}

impl From<String> for McpError {
    fn from(msg: String) -> Self {
        McpError::Other(msg)
    }
}

impl From<&str> for McpError {
    fn from(msg: &str) -> Self {
        McpError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, McpError>;
