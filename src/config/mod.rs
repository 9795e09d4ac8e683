mod defaults;
mod server;
mod validation;

use crate::cli::Args;
use crate::error::McpError;
use crate::mcp::ClientConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use defaults::{
    default_handshake_timeout_ms, default_server_url, default_timeout_secs, default_verbose,
};
pub use server::{ServerConfig, SessionConfig};
pub use validation::{expand_with, validate_server_url};

/// Resolved settings for one run of the CLI.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Settings {
    pub fn from_env_and_args(args: &Args) -> crate::error::Result<Self> {
        let file_config = match &args.config {
            Some(path) => FileConfig::load_from(path)?,
            None => FileConfig::load()?,
        };

        Self::resolve(args, |name| env::var(name).ok(), file_config)
    }

    /// Precedence for every setting: CLI args > env vars > config file > default.
    pub fn resolve<F>(args: &Args, env_lookup: F, file: FileConfig) -> crate::error::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = args
            .server_url
            .clone()
            .or_else(|| env_lookup("MCP_SERVER_URL"))
            .or(file.server.url.clone())
            .unwrap_or_else(default_server_url);
        validate_server_url(&server_url).map_err(McpError::Config)?;

        let timeout_secs = args
            .timeout
            .or_else(|| env_lookup("MCP_TIMEOUT").and_then(|s| s.parse::<u64>().ok()))
            .or(file.server.timeout_secs)
            .unwrap_or_else(default_timeout_secs);

        let handshake_timeout_ms = args
            .handshake_timeout_ms
            .or_else(|| env_lookup("MCP_HANDSHAKE_TIMEOUT_MS").and_then(|s| s.parse::<u64>().ok()))
            .or(file.server.handshake_timeout_ms)
            .unwrap_or_else(default_handshake_timeout_ms);

        if timeout_secs == 0 || handshake_timeout_ms == 0 {
            return Err(McpError::Config(
                "Timeouts must be greater than zero".to_string(),
            ));
        }

        let verbose = if args.verbose {
            true
        } else {
            match env_lookup("MCP_VERBOSE") {
                Some(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
                None => file.session.verbose.unwrap_or_else(default_verbose),
            }
        };

        let mut client = ClientConfig::new(server_url)
            .with_request_timeout(Duration::from_secs(timeout_secs))
            .with_handshake_timeout(Duration::from_millis(handshake_timeout_ms));
        for (name, value) in &file.server.headers {
            client = client.with_header(name.clone(), expand_with(value, &env_lookup));
        }

        Ok(Settings { client, verbose })
    }
}

impl FileConfig {
    pub fn load() -> Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        // No config file found, return default
        Ok(FileConfig::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))
        }
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // 1. Current directory (local override)
            PathBuf::from(".mcp-sse.yaml"),
            PathBuf::from(".mcp-sse.yml"),
            PathBuf::from(".mcp-sse.json"),
        ];

        // 2. User's config directory
        if let Some(config_dir) = Self::user_config_dir() {
            paths.push(config_dir.join("config.yaml"));
            paths.push(config_dir.join("config.yml"));
            paths.push(config_dir.join("config.json"));
        }

        paths
    }

    fn user_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("mcp-sse"))
    }

    pub fn example() -> Self {
        let mut server = ServerConfig {
            url: Some(default_server_url()),
            timeout_secs: Some(default_timeout_secs()),
            handshake_timeout_ms: Some(default_handshake_timeout_ms()),
            ..Default::default()
        };
        server
            .headers
            .insert("Authorization".to_string(), "Bearer ${MCP_API_TOKEN}".to_string());

        FileConfig {
            server,
            session: SessionConfig {
                verbose: Some(default_verbose()),
            },
        }
    }

    /// Writes the example config to `path`, refusing to replace an existing file.
    pub fn write_example(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists: {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = serde_yaml::to_string(&Self::example())?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn init_user_config() -> Result<PathBuf> {
        let Some(dir) = Self::user_config_dir() else {
            bail!("Could not determine home directory");
        };
        let path = dir.join("config.yaml");
        Self::write_example(&path)?;
        Ok(path)
    }
}
