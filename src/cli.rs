use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mcp-sse")]
#[command(about = "Talk to MCP tool servers over the SSE transport", long_about = None)]
pub struct Args {
    #[arg(
        short = 's',
        long = "server-url",
        global = true,
        help = "Base URL of the MCP server (e.g., http://localhost:8000)"
    )]
    pub server_url: Option<String>,

    #[arg(long = "timeout", global = true, help = "Request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(
        long = "handshake-timeout-ms",
        global = true,
        help = "How long to wait for the server to assign a session"
    )]
    pub handshake_timeout_ms: Option<u64>,

    #[arg(long = "config", global = true, help = "Read settings from this config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", global = true, help = "Log protocol traffic")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether the server reports itself healthy
    Health,

    /// List the tools the server offers
    Tools {
        #[arg(long = "json", help = "Print tools in function-calling JSON format")]
        json: bool,
    },

    /// Call a tool and print its result
    Call {
        #[arg(help = "Tool name")]
        name: String,

        #[arg(help = "Tool arguments as a JSON object")]
        arguments: Option<String>,

        #[arg(long = "raw", help = "Print the raw result instead of its text content")]
        raw: bool,
    },

    /// Stay connected and print server notifications until Ctrl-C
    Listen,

    /// Write an example config file to ~/.config/mcp-sse/config.yaml
    ConfigInit,
}
