pub mod client;
mod state;
pub mod tools;
pub mod transport_sse;
pub mod types;

pub use client::{quick_tool_call, ClientConfig, SessionClient};
pub use state::{NotificationHandler, StateChangeHandler};
pub use types::{ConnectionState, InitializeResult, Notification, RpcError, RpcResponse, Tool};
