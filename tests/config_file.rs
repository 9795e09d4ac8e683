mod common;

use clap::Parser;
use common::start_tool_server;
use mcp_sse::cli::Args;
use mcp_sse::config::{FileConfig, Settings};
use mcp_sse::SessionClient;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_config_file_drives_client() {
    let server = start_tool_server().await;
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("mcp.yaml");
    fs::write(
        &config_path,
        format!(
            "server:\n  url: {}\n  timeout_secs: 7\n  handshake_timeout_ms: 1500\n",
            server.uri()
        ),
    )
    .unwrap();

    let args = Args::parse_from([
        "mcp-sse",
        "--config",
        config_path.to_str().unwrap(),
        "tools",
    ]);
    let settings = Settings::resolve(&args, |_: &str| None, FileConfig::load_from(&config_path).unwrap()).unwrap();

    assert_eq!(settings.client.server_url, server.uri());
    assert_eq!(settings.client.request_timeout, Duration::from_secs(7));
    assert_eq!(settings.client.handshake_timeout, Duration::from_millis(1500));

    let client = SessionClient::open(settings.client).await.unwrap();
    assert_eq!(client.list_tools().await.unwrap().len(), 2);
    client.disconnect().await;
}

#[test]
fn test_example_config_loads_back() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.yaml");

    FileConfig::write_example(&path).unwrap();
    let loaded = FileConfig::load_from(&path).unwrap();

    assert_eq!(loaded.server.url, FileConfig::example().server.url);
    assert!(FileConfig::write_example(&path).is_err());
}
