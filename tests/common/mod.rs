#![allow(dead_code)]

use mcp_sse::ClientConfig;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const SESSION_ID: &str = "sess-1";

pub fn endpoint_frame(session_id: &str) -> String {
    format!(
        "data: {}\n\n",
        json!({
            "method": "endpoint",
            "params": {"uri": format!("/messages?sessionId={}", session_id)}
        })
    )
}

pub fn data_frame(event: Value) -> String {
    format!("data: {}\n\n", event)
}

pub fn sse_response(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/event-stream")
}

pub async fn mount_connect(server: &MockServer, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path("/connect"))
        .and(header("accept", "text/event-stream"))
        .respond_with(sse_response(body))
        .mount(server)
        .await;
}

pub async fn mount_tool_server(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(tool_server)
        .mount(server)
        .await;
}

/// A calculator server with `add_numbers` and `find_max`, echoing request ids.
pub async fn start_tool_server() -> MockServer {
    let server = MockServer::start().await;
    mount_connect(&server, endpoint_frame(SESSION_ID)).await;
    mount_tool_server(&server).await;
    server
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri())
        .with_request_timeout(Duration::from_secs(5))
        .with_handshake_timeout(Duration::from_secs(2))
}

pub fn calculator_tools() -> Value {
    json!([
        {
            "name": "add_numbers",
            "description": "Add two numbers",
            "inputSchema": {
                "type": "object",
                "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                "required": ["a", "b"]
            }
        },
        {
            "name": "find_max",
            "description": "Find the largest number in a list",
            "inputSchema": {
                "type": "object",
                "properties": {"numbers": {"type": "array", "items": {"type": "number"}}},
                "required": ["numbers"]
            }
        }
    ])
}

pub fn rpc_reply(request: &Request, outcome: Result<Value, Value>) -> ResponseTemplate {
    let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    let envelope = match outcome {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(error) => json!({"jsonrpc": "2.0", "id": id, "error": error}),
    };
    ResponseTemplate::new(200).set_body_json(envelope)
}

fn text_result(text: String) -> Value {
    json!({"content": [{"type": "text", "text": text}]})
}

pub fn tool_server(request: &Request) -> ResponseTemplate {
    let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
    let params = &body["params"];

    let outcome = match body["method"].as_str().unwrap_or_default() {
        "initialize" => Ok(json!({
            "protocolVersion": params["protocolVersion"],
            "serverInfo": {"name": "calc-server", "version": "1.0.0"},
            "capabilities": {"tools": {}}
        })),
        "tools/list" => Ok(json!({"tools": calculator_tools()})),
        "tools/call" => {
            let args = &params["arguments"];
            match params["name"].as_str().unwrap_or_default() {
                "add_numbers" => {
                    let sum = args["a"].as_f64().unwrap_or(0.0) + args["b"].as_f64().unwrap_or(0.0);
                    Ok(text_result(sum.to_string()))
                }
                "find_max" => {
                    let max = args["numbers"]
                        .as_array()
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_f64)
                        .fold(f64::NEG_INFINITY, f64::max);
                    Ok(text_result(max.to_string()))
                }
                _ => Err(json!({"message": "unknown tool"})),
            }
        }
        _ => Err(json!({"code": -32601, "message": "method not found"})),
    };

    rpc_reply(request, outcome)
}
