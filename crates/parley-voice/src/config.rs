use serde::{Deserialize, Serialize};
use std::fmt;

/// Signaling endpoint of a locally running voice agent.
pub const DEFAULT_CONNECTION_URL: &str = "http://localhost:7860/api/offer";

fn default_connection_url() -> String {
    DEFAULT_CONNECTION_URL.to_string()
}

fn default_true() -> bool {
    true
}

/// Options handed to a [`crate::VoiceClient`] when connecting.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL the client posts its session offer to.
    #[serde(default = "default_connection_url")]
    pub connection_url: String,
    /// Publish microphone audio once connected. Default: true.
    #[serde(default = "default_true")]
    pub enable_mic: bool,
    /// Publish camera video once connected. Default: false.
    #[serde(default)]
    pub enable_cam: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection_url: default_connection_url(),
            enable_mic: true,
            enable_cam: false,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Offer URLs can carry session tokens in the query string.
        let url = self
            .connection_url
            .split_once('?')
            .map(|(base, _)| format!("{base}?[REDACTED]"))
            .unwrap_or_else(|| self.connection_url.clone());
        f.debug_struct("ClientConfig")
            .field("connection_url", &url)
            .field("enable_mic", &self.enable_mic)
            .field("enable_cam", &self.enable_cam)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(connection_url: impl Into<String>) -> Self {
        Self {
            connection_url: connection_url.into(),
            ..Self::default()
        }
    }
}
