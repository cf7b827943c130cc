//! Voice-agent client seams for Parley.
//!
//! The real-time voice agent (signaling, WebRTC media, transcript
//! streaming) lives in an external client library. This crate defines the
//! narrow surface Parley needs from it:
//!
//! - [`VoiceClient`]: connect, disconnect, microphone, typed text, and a
//!   scoped [`EventSubscription`] delivering [`parley_types::SessionEvent`]s.
//! - [`MediaDevices`]: camera access for the local preview, with
//!   [`CameraPreview`] stopping the stream when it goes out of scope.
//! - [`rtvi`]: decoding of RTVI JSON messages into session events.
//!
//! [`SimulatedVoiceClient`] and [`SimulatedDevices`] are in-process
//! implementations: the client answers typed text with a canned reply,
//! which is the local "fake agent" mode of the front end.

pub mod client;
pub mod config;
pub mod devices;
pub mod error;
pub mod rtvi;
pub mod simulated;
pub mod subscription;

pub use client::VoiceClient;
pub use config::{ClientConfig, DEFAULT_CONNECTION_URL};
pub use devices::{CameraPreview, MediaDevices, MediaStream, SimulatedDevices, VideoConstraints};
pub use error::VoiceError;
pub use simulated::{SimulatedVoiceClient, DEFAULT_REPLY_DELAY, DEFAULT_REPLY_TEXT};
pub use subscription::{EventHub, EventSubscription};
