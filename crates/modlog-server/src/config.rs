//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Platform REST settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Actor correlation settings.
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Administrative surface settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Event ingest settings.
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "modlog_pipeline=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Platform REST configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bot token used for audit reads and sends.
    #[serde(default)]
    pub bot_token: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Actor correlation configuration.
///
/// The freshness window itself is fixed; only the fetch deadline is tunable.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationConfig {
    /// Deadline for one audit trail fetch, in milliseconds.
    #[serde(default = "default_audit_timeout_ms")]
    pub audit_timeout_ms: u64,
}

/// Administrative surface configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token required on `/api/guilds/*`. Empty disables the surface.
    #[serde(default)]
    pub token: String,
}

/// Event ingest configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Events buffered between the HTTP ingest and the pipeline.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How long in-flight records may finish after shutdown begins.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "modlog.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    modlog_pipeline::discord::DEFAULT_API_BASE.to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_audit_timeout_ms() -> u64 {
    10_000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_drain_timeout_ms() -> u64 {
    15_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            bot_token: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            audit_timeout_ms: default_audit_timeout_ms(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `MODLOG_HOST` overrides `server.host`
/// - `MODLOG_PORT` overrides `server.port`
/// - `MODLOG_DB_PATH` overrides `database.path`
/// - `MODLOG_LOG_LEVEL` overrides `logging.level`
/// - `MODLOG_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `MODLOG_BOT_TOKEN` overrides `discord.bot_token`
/// - `MODLOG_DISCORD_API_BASE` overrides `discord.api_base`
/// - `MODLOG_ADMIN_TOKEN` overrides `admin.token`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("MODLOG_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("MODLOG_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = var("MODLOG_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("MODLOG_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("MODLOG_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(token) = var("MODLOG_BOT_TOKEN") {
        config.discord.bot_token = token;
    }
    if let Some(base) = var("MODLOG_DISCORD_API_BASE") {
        config.discord.api_base = base;
    }
    if let Some(token) = var("MODLOG_ADMIN_TOKEN") {
        config.admin.token = token;
    }
}
