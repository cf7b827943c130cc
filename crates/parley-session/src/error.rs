//! Error types for the session layer.

use parley_voice::VoiceError;

/// Errors returned by [`crate::SessionHandle`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Typed text was sent while no session is live.
    #[error("session is not connected")]
    NotConnected,

    /// Typed text was blank.
    #[error("message text is empty")]
    EmptyMessage,

    /// The session task has shut down.
    #[error("session is closed")]
    Closed,

    /// The voice client or a capture device reported a failure.
    #[error(transparent)]
    Voice(#[from] VoiceError),
}
