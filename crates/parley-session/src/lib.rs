//! Session orchestration for Parley.
//!
//! A [`SessionHandle`] is the single mutation entry point for one voice/chat
//! session. It owns an explicitly constructed voice client and capture
//! devices, feeds client events and user actions through one queue into a
//! [`parley_transcript::TranscriptAssembler`], and broadcasts a
//! [`SessionUpdate`] after every change.
//!
//! ```rust,ignore
//! use parley_session::{SessionConfig, SessionHandle};
//! use parley_voice::{SimulatedDevices, SimulatedVoiceClient};
//! use std::sync::Arc;
//!
//! let session = SessionHandle::spawn(
//!     Arc::new(SimulatedVoiceClient::new()),
//!     Arc::new(SimulatedDevices::new()),
//!     SessionConfig::default(),
//! );
//! session.connect().await?;
//! session.send_user_text("ping").await?;
//! ```

mod actor;
mod config;
mod error;
mod handle;
mod update;

pub use config::{
    SessionConfig, DEFAULT_COMMAND_CAPACITY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_UPDATE_CAPACITY,
};
pub use error::SessionError;
pub use handle::SessionHandle;
pub use update::{device_denied_status, SessionSnapshot, SessionUpdate, CONNECT_FAILED_NOTICE};
