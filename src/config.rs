//! Configuration management for relaychat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for relaychat
///
/// Holds the relay server settings, the model provider settings, and the
/// settings used by the terminal chat client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Chat client configuration
    #[serde(default)]
    pub client: ClientConfig,
}

/// Relay HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Socket address string in `host:port` form
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Provider configuration
///
/// Specifies which model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Google Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
}

fn default_provider_type() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Google Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; when unset the `GOOGLE_GENERATIVE_AI_API_KEY` variable is used
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL, including the version segment
    ///
    /// Override to point the provider at a mock server in tests.
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// Model used by `POST /api/chat`
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used by `GET /api/ping`
    #[serde(default = "default_ping_model")]
    pub ping_model: String,
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_chat_model() -> String {
    "models/gemini-2.0-flash".to_string()
}

fn default_ping_model() -> String {
    "models/gemini-2.5-pro".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_gemini_api_base(),
            chat_model: default_chat_model(),
            ping_model: default_ping_model(),
        }
    }
}

/// Chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the relay the client talks to
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// File holding the persisted universal prompt
    ///
    /// Defaults to `prompt.json` in the platform config directory.
    #[serde(default)]
    pub prompt_store: Option<PathBuf>,
}

fn default_relay_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            prompt_store: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("RELAYCHAT_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("RELAYCHAT_PORT") {
            match port.parse::<u16>() {
                Ok(v) => {
                    self.server.port = v;
                    tracing::debug!(port = v, "Env override: RELAYCHAT_PORT");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for RELAYCHAT_PORT: {}", port);
                }
            }
        }

        if let Ok(provider_type) = std::env::var("RELAYCHAT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(api_base) = std::env::var("RELAYCHAT_GEMINI_API_BASE") {
            self.provider.gemini.api_base = api_base;
        }

        if let Ok(model) = std::env::var("RELAYCHAT_CHAT_MODEL") {
            self.provider.gemini.chat_model = model;
        }

        if let Ok(model) = std::env::var("RELAYCHAT_PING_MODEL") {
            self.provider.gemini.ping_model = model;
        }

        if let Ok(relay_url) = std::env::var("RELAYCHAT_RELAY_URL") {
            self.client.relay_url = relay_url;
        }

        if let Ok(path) = std::env::var("RELAYCHAT_PROMPT_STORE") {
            self.client.prompt_store = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        match &cli.command {
            crate::cli::Commands::Serve { host, port } => {
                if let Some(host) = host {
                    self.server.host = host.clone();
                }
                if let Some(port) = port {
                    self.server.port = *port;
                }
            }
            crate::cli::Commands::Chat { relay_url } => {
                if let Some(relay_url) = relay_url {
                    self.client.relay_url = relay_url.clone();
                }
            }
            crate::cli::Commands::Prompt { .. } => {}
        }
    }

    /// Validate the configuration
    ///
    /// Ensures required fields are set and URLs parse.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(RelayError::Config("server.host cannot be empty".to_string()).into());
        }

        if self.provider.provider_type.is_empty() {
            return Err(RelayError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["gemini"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(RelayError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.gemini.chat_model.trim().is_empty() {
            return Err(RelayError::Config(
                "provider.gemini.chat_model cannot be empty".to_string(),
            )
            .into());
        }

        if self.provider.gemini.ping_model.trim().is_empty() {
            return Err(RelayError::Config(
                "provider.gemini.ping_model cannot be empty".to_string(),
            )
            .into());
        }

        url::Url::parse(&self.provider.gemini.api_base).map_err(|e| {
            RelayError::Config(format!("provider.gemini.api_base is not a valid URL: {}", e))
        })?;

        url::Url::parse(&self.client.relay_url).map_err(|e| {
            RelayError::Config(format!("client.relay_url is not a valid URL: {}", e))
        })?;

        Ok(())
    }
}
