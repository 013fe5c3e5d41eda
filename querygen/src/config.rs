//! Configuration loading

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the config file searched for on startup
pub const CONFIG_FILE_NAME: &str = ".querygen.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/querygen/
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("querygen").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Top-level configuration (from .querygen.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub llm: LlmSection,
}

/// HTTP server section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// The single origin allowed to call the API from a browser
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

/// Chat-completion provider section
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_llm_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Usually supplied through `OPENROUTER_API_KEY` rather than the file
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Sent as `HTTP-Referer` for provider-side attribution
    #[serde(default)]
    pub referer: Option<String>,
    /// Sent as `X-Title`
    #[serde(default)]
    pub title: Option<String>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_llm_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout(),
            referer: None,
            title: None,
        }
    }
}

/// Values from the command line or environment that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub llm_url: Option<String>,
    pub allowed_origin: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl AppConfig {
    /// Load config from .querygen.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .querygen.toml
    /// 2. Check ~/.config/querygen/.querygen.toml (global fallback)
    /// 3. Fall back to defaults
    pub fn load() -> Result<Self> {
        if let Some(config_path) = find_config_file(CONFIG_FILE_NAME) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Apply command-line and environment overrides
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(key) = overrides.api_key {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = overrides.model {
            self.llm.model = model;
        }
        if let Some(url) = overrides.llm_url {
            self.llm.url = url;
        }
        if let Some(origin) = overrides.allowed_origin {
            self.server.allowed_origin = origin;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self
    }
}
