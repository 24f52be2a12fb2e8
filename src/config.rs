//! Server configuration.
//!
//! Loaded from a YAML file (`HEARTH_CONFIG`, default `hearth.yaml`). Every
//! field is optional; a missing file means all defaults. The `LISTEN`
//! environment variable overrides `server.listen_addr`.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "hearth.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

/// Listener and per-connection limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0:8080"
    pub listen_addr: String,
    /// Pending-connection queue handed to `listen(2)`
    pub backlog: u32,
    /// Upper bound on concurrently served connections. `None` spawns one
    /// task per accepted connection without limit.
    pub max_connections: Option<usize>,
    pub read_timeout_secs: Option<u64>,
    pub write_timeout_secs: Option<u64>,
    /// Largest accepted request head, terminator included
    pub max_header_bytes: usize,
    /// Largest accepted POST body
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory every request target is resolved against
    pub root: PathBuf,
    /// Document served for `GET /`
    pub index: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            backlog: 10,
            max_connections: None,
            read_timeout_secs: None,
            write_timeout_secs: None,
            max_header_bytes: 64 * 1024,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources"),
            index: "index.html".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Loads the config file named by `HEARTH_CONFIG` and applies env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("HEARTH_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Self::load_from(Path::new(&path), std::env::var("LISTEN").ok())
    }

    /// Reads `path` (defaults if it does not exist), then applies `listen_override`.
    pub fn load_from(path: &Path, listen_override: Option<String>) -> anyhow::Result<Self> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read config file {}", path.display()));
            }
        };

        if let Some(addr) = listen_override {
            cfg.server.listen_addr = addr;
        }

        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to `null`, which serde rejects for a struct.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}
