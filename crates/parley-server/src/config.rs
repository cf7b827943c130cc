//! Server configuration loading from file and environment variables.

use parley_session::SessionConfig;
use parley_voice::{ClientConfig, DEFAULT_CONNECTION_URL, DEFAULT_REPLY_TEXT};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Voice agent connection and local responder settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Transcript retention settings.
    #[serde(default)]
    pub transcript: TranscriptConfig,
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

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "parley_session=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Voice agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Endpoint the voice client connects to.
    #[serde(default = "default_connection_url")]
    pub connection_url: String,

    /// Start sessions with the microphone on.
    #[serde(default = "default_true")]
    pub enable_mic: bool,

    /// Start sessions with the camera on.
    #[serde(default)]
    pub enable_cam: bool,

    /// Text the local responder answers every typed message with.
    #[serde(default = "default_reply_text")]
    pub reply_text: String,

    /// Delay before the local responder answers, in milliseconds.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Simulated connection setup time, in milliseconds.
    #[serde(default)]
    pub connect_delay_ms: u64,
}

/// Transcript configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptConfig {
    /// Clear the transcript whenever a new session connects.
    #[serde(default)]
    pub clear_on_connect: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connection_url() -> String {
    DEFAULT_CONNECTION_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_reply_text() -> String {
    DEFAULT_REPLY_TEXT.to_string()
}

fn default_reply_delay_ms() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
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

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            connection_url: default_connection_url(),
            enable_mic: true,
            enable_cam: false,
            reply_text: default_reply_text(),
            reply_delay_ms: default_reply_delay_ms(),
            connect_delay_ms: 0,
        }
    }
}

impl VoiceConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }
}

impl Config {
    /// Builds the session settings described by this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            client: ClientConfig {
                connection_url: self.voice.connection_url.clone(),
                enable_mic: self.voice.enable_mic,
                enable_cam: self.voice.enable_cam,
            },
            clear_on_connect: self.transcript.clear_on_connect,
            ..SessionConfig::default()
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

    /// A value parsed but cannot be used.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PARLEY_HOST` overrides `server.host`
/// - `PARLEY_PORT` overrides `server.port`
/// - `PARLEY_LOG_LEVEL` overrides `logging.level`
/// - `PARLEY_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `PARLEY_CONNECTION_URL` overrides `voice.connection_url`
/// - `PARLEY_CLEAR_ON_CONNECT` overrides `transcript.clear_on_connect`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if the resulting connection URL is blank.
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

    // Environment variable overrides
    if let Ok(host) = std::env::var("PARLEY_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("PARLEY_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("PARLEY_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("PARLEY_LOG_JSON") {
        config.logging.json = parse_flag(&json);
    }
    if let Ok(url) = std::env::var("PARLEY_CONNECTION_URL") {
        config.voice.connection_url = url;
    }
    if let Ok(clear) = std::env::var("PARLEY_CLEAR_ON_CONNECT") {
        config.transcript.clear_on_connect = parse_flag(&clear);
    }

    if config.voice.connection_url.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "voice.connection_url",
            reason: "must not be empty".to_string(),
        });
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}
