use clap::Parser;
use colored::*;
use std::process;

use mcp_sse::cli::{Args, Command};
use mcp_sse::config::{FileConfig, Settings};
use mcp_sse::mcp::tools::{extract_text_content, format_tools_for_llm, is_error_result, parse_tool_arguments};
use mcp_sse::ui::{
    display_json, display_tool_error, display_tool_result, display_tools, format_notification,
    format_state_change,
};
use mcp_sse::{McpError, Result, SessionClient};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Handle config-init before loading any configuration
    if let Command::ConfigInit = args.command {
        match FileConfig::init_user_config() {
            Ok(path) => {
                println!("{}", format!("Wrote example config to {}", path.display()).green());
                return;
            }
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red(), e);
                process::exit(1);
            }
        }
    }

    let settings = match Settings::from_env_and_args(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    init_logging(settings.verbose);

    match run(args.command, settings).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

async fn run(command: Command, settings: Settings) -> Result<i32> {
    let client = SessionClient::new(settings.client)?;

    match command {
        Command::Health => {
            if client.health_check().await {
                println!("{}", "healthy".green());
                Ok(0)
            } else {
                println!("{}", "unhealthy".red());
                Ok(1)
            }
        }
        Command::Tools { json } => {
            connect_and_initialize(&client, settings.verbose).await?;
            let tools = client.list_tools().await;
            client.disconnect().await;
            let tools = tools?;

            if json {
                let formatted = serde_json::Value::Array(format_tools_for_llm(&tools));
                println!("{}", serde_json::to_string_pretty(&formatted)?);
            } else {
                display_tools(&tools);
            }
            Ok(0)
        }
        Command::Call {
            name,
            arguments,
            raw,
        } => {
            let arguments = parse_tool_arguments(arguments.as_deref().unwrap_or(""))?;

            connect_and_initialize(&client, settings.verbose).await?;
            let outcome = client.call_tool(&name, arguments).await;
            client.disconnect().await;

            match outcome {
                Ok(result) if raw => {
                    display_json(&format!("RESULT: {}", name), &result);
                    Ok(if is_error_result(&result) { 1 } else { 0 })
                }
                Ok(result) if is_error_result(&result) => {
                    display_tool_error(&name, &extract_text_content(&result));
                    Ok(1)
                }
                Ok(result) => {
                    display_tool_result(&name, &extract_text_content(&result));
                    Ok(0)
                }
                Err(McpError::Protocol(err)) => {
                    display_tool_error(&name, &err.to_string());
                    Ok(1)
                }
                Err(e) => Err(e),
            }
        }
        Command::Listen => {
            client.on_state_change(|state| eprintln!("{}", format_state_change(state)));
            client.on_notification(|notification| println!("{}", format_notification(notification)));

            client.connect().await?;
            if let Some(session_id) = client.session_id() {
                eprintln!("{}", format!("Session: {}", session_id).dimmed());
            }
            eprintln!("{}", "Listening for notifications, press Ctrl-C to stop.".dimmed());

            tokio::signal::ctrl_c().await?;
            client.disconnect().await;
            client.clear_handlers();
            Ok(0)
        }
        Command::ConfigInit => Ok(0),
    }
}

async fn connect_and_initialize(client: &SessionClient, verbose: bool) -> Result<()> {
    client.connect().await?;
    match client.initialize().await {
        Ok(init) => {
            if verbose {
                eprintln!(
                    "{}",
                    format!(
                        "Connected to MCP server: {} v{} (protocol {})",
                        init.server_info.name, init.server_info.version, init.protocol_version
                    )
                    .dimmed()
                );
            }
            Ok(())
        }
        Err(e) => {
            client.disconnect().await;
            Err(e)
        }
    }
}
