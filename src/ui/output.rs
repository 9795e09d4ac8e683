use crate::mcp::{ConnectionState, Notification, Tool};
use crate::ui::highlight::Highlighter;
use colored::*;
use serde_json::Value;

/// Display a tool result in a boxed format
pub fn display_tool_result(name: &str, result: &str) {
    let block = Highlighter::new().render_block(&format!("TOOL: {}", name), None, result);
    print!("{}", block);
}

/// Display a tool error in a boxed format
pub fn display_tool_error(name: &str, error: &str) {
    let block = Highlighter::new().render_block(&format!("TOOL ERROR: {}", name), None, error);
    eprint!("{}", block);
}

/// Display a JSON value highlighted
pub fn display_json(title: &str, value: &Value) {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    print!("{}", Highlighter::new().render_block(title, Some("json"), &pretty));
}

pub fn display_tools(tools: &[Tool]) {
    if tools.is_empty() {
        println!("{}", "Server offers no tools.".yellow());
        return;
    }

    println!("{}", format!("Available tools: {}", tools.len()).cyan());
    for tool in tools {
        if tool.description.is_empty() {
            println!("  {}", tool.name.bold());
        } else {
            println!("  {} - {}", tool.name.bold(), tool.description.dimmed());
        }
    }
}

pub fn format_notification(notification: &Notification) -> String {
    let timestamp = chrono::Local::now().format("%H:%M:%S");
    let method = notification.method.as_deref().unwrap_or("<no method>");

    if method == "notifications/message" {
        let level = notification.level().to_uppercase();
        let level = match level.as_str() {
            "ERROR" | "CRITICAL" | "ALERT" | "EMERGENCY" => level.red(),
            "WARNING" | "WARN" => level.yellow(),
            "DEBUG" => level.dimmed(),
            _ => level.green(),
        };
        format!("[{}] {} {}", timestamp, level, notification.data())
    } else {
        format!(
            "[{}] {} {}",
            timestamp,
            method.cyan(),
            notification.params.to_string().dimmed()
        )
    }
}

pub fn format_state_change(state: ConnectionState) -> String {
    let label = match state {
        ConnectionState::Connected => state.as_str().green(),
        ConnectionState::Error => state.as_str().red(),
        _ => state.as_str().yellow(),
    };
    format!("{} {}", "connection:".dimmed(), label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_log_notification() {
        colored::control::set_override(false);
        let notification = Notification {
            method: Some("notifications/message".to_string()),
            params: json!({"level": "warning", "data": "slow tool"}),
        };
        let line = format_notification(&notification);
        assert!(line.ends_with("WARNING slow tool"));
    }

    #[test]
    fn test_format_other_notification() {
        colored::control::set_override(false);
        let notification = Notification {
            method: Some("notifications/progress".to_string()),
            params: json!({"progress": 1}),
        };
        let line = format_notification(&notification);
        assert!(line.ends_with("notifications/progress {\"progress\":1}"));
    }

    #[test]
    fn test_format_state_change() {
        colored::control::set_override(false);
        assert_eq!(format_state_change(ConnectionState::Error), "connection: error");
    }
}
