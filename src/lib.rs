//! Client for MCP tool servers that speak the HTTP+SSE transport.
//!
//! A [`SessionClient`] keeps one Server-Sent-Events stream open for the
//! session handshake and server notifications, and sends each JSON-RPC call
//! as its own HTTP POST whose response body carries the result.
//!
//! ```no_run
//! use mcp_sse::{ClientConfig, SessionClient};
//! use serde_json::json;
//!
//! # async fn demo() -> mcp_sse::Result<()> {
//! let client = SessionClient::open(ClientConfig::new("http://localhost:8000")).await?;
//! for tool in client.list_tools().await? {
//!     println!("{}: {}", tool.name, tool.description);
//! }
//! let result = client.call_tool("add_numbers", json!({"a": 10, "b": 5})).await?;
//! println!("{}", mcp_sse::mcp::tools::extract_text_content(&result));
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod ui;

pub use error::{McpError, Result};
pub use mcp::{
    quick_tool_call, ClientConfig, ConnectionState, InitializeResult, Notification, RpcError,
    SessionClient, Tool,
};
