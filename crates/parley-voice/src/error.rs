use parley_types::Control;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// The client could not establish a session with the agent.
    #[error("transport connect error: {0}")]
    TransportConnect(String),

    /// The user or platform refused access to a capture device.
    #[error("{device} access denied: {reason}")]
    DeviceAccess { device: Control, reason: String },

    #[error("voice client is not connected")]
    NotConnected,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl VoiceError {
    /// Convenience constructor for a denied device.
    pub fn device_denied(device: Control, reason: impl Into<String>) -> Self {
        Self::DeviceAccess {
            device,
            reason: reason.into(),
        }
    }
}
