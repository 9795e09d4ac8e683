use super::types::Tool;
use crate::error::{McpError, Result};
use serde_json::{json, Value};

/// Shapes tools the way OpenAI-style function calling expects them.
pub fn format_tools_for_llm(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect()
}

/// Text a model can consume from a `tools/call` result: the first text
/// content block, or the whole result as pretty JSON.
pub fn extract_text_content(result: &Value) -> String {
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .find(|item| item.get("type").and_then(Value::as_str) == Some("text"))
        })
        .and_then(|item| item.get("text"))
        .and_then(Value::as_str);

    match text {
        Some(text) => text.to_string(),
        None => serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string()),
    }
}

/// A tool can fail without a protocol error by flagging its own result.
pub fn is_error_result(result: &Value) -> bool {
    result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Parses the argument string of a model's tool call. Blank means no arguments.
pub fn parse_tool_arguments(arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(json!({}));
    }

    let value: Value = serde_json::from_str(arguments)?;
    if !value.is_object() {
        return Err(McpError::Other(format!(
            "Tool arguments must be a JSON object, got: {}",
            value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tools_for_llm() {
        let tools = vec![Tool {
            name: "add_numbers".to_string(),
            description: "Add two numbers".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                "required": ["a", "b"]
            }),
        }];

        let formatted = format_tools_for_llm(&tools);
        assert_eq!(formatted.len(), 1);
        assert_eq!(formatted[0]["type"], "function");
        assert_eq!(formatted[0]["function"]["name"], "add_numbers");
        assert_eq!(formatted[0]["function"]["parameters"]["required"][1], "b");
    }

    #[test]
    fn test_extract_first_text_block() {
        let result = json!({
            "content": [
                {"type": "image", "data": "..."},
                {"type": "text", "text": "15"},
                {"type": "text", "text": "ignored"}
            ]
        });
        assert_eq!(extract_text_content(&result), "15");
    }

    #[test]
    fn test_extract_falls_back_to_json() {
        let result = json!({"value": 15});
        assert_eq!(extract_text_content(&result), "{\n  \"value\": 15\n}");
    }

    #[test]
    fn test_is_error_result() {
        assert!(is_error_result(&json!({"isError": true, "content": []})));
        assert!(!is_error_result(&json!({"content": []})));
    }

    #[test]
    fn test_parse_tool_arguments() {
        assert_eq!(parse_tool_arguments("").unwrap(), json!({}));
        assert_eq!(parse_tool_arguments("{\"a\": 1}").unwrap()["a"], 1);
        assert!(parse_tool_arguments("[1, 2]").is_err());
        assert!(parse_tool_arguments("{oops").is_err());
    }
}
