use parley_voice::ClientConfig;
use std::time::Duration;

/// Default capacity of the command queue feeding the session task.
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

/// Default capacity of the update broadcast channel.
pub const DEFAULT_UPDATE_CAPACITY: usize = 256;

/// How long a connect may wait for the agent to report the session live
/// after the client accepted the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a [`crate::SessionHandle`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Options passed to the voice client on every connect.
    pub client: ClientConfig,
    /// Start a fresh transcript whenever a new session connects. When
    /// false, messages from earlier sessions stay on screen.
    pub clear_on_connect: bool,
    /// Upper bound between an accepted connect and the agent's
    /// session-connected event. Pending connects fail after it.
    pub connect_timeout: Duration,
    /// Capacity of the command queue feeding the session task.
    pub command_capacity: usize,
    /// Capacity of the update broadcast channel. Subscribers that fall
    /// further behind skip updates and should re-read the snapshot.
    pub update_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            clear_on_connect: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            update_capacity: DEFAULT_UPDATE_CAPACITY,
        }
    }
}
