//! Outbound state published to the presentation layer.

use parley_transcript::TranscriptChange;
use parley_types::{ConnectionState, Control, DeviceControls, Message};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Notice shown when the voice agent cannot be reached.
pub const CONNECT_FAILED_NOTICE: &str = "Failed to connect to voice agent";

/// Returns the inline status shown next to a control whose device was denied.
pub fn device_denied_status(control: Control) -> &'static str {
    match control {
        Control::Camera => "Camera access denied",
        Control::Microphone => "Microphone access denied",
        Control::OutputSound => "Audio output unavailable",
    }
}

/// A single change to session state, broadcast after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// The transcript changed.
    Transcript { change: TranscriptChange },
    /// The connection state changed.
    Connection { state: ConnectionState },
    /// The agent started or stopped speaking.
    Speaking { speaking: bool },
    /// A toggle moved, either by request or by reverting after a failure.
    Control { control: Control, enabled: bool },
    /// Inline device status changed. `None` clears it.
    DeviceStatus {
        control: Control,
        status: Option<String>,
    },
    /// A user-visible failure notice. `None` dismisses it.
    Notice { message: Option<String> },
}

/// Point-in-time view of the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Connection lifecycle state.
    pub connection: ConnectionState,
    /// Whether the agent is currently speaking.
    pub bot_speaking: bool,
    /// Position of every toggle.
    pub controls: DeviceControls,
    /// Inline status for controls whose device failed.
    pub device_status: HashMap<Control, String>,
    /// Visible failure notice, if any.
    pub notice: Option<String>,
    /// Number of messages in the transcript.
    pub message_count: usize,
    /// The transcript in creation order.
    pub messages: Vec<Message>,
}

impl SessionSnapshot {
    /// Header line for the conversation panel.
    pub fn summary(&self) -> String {
        match self.message_count {
            0 => "No messages yet".to_string(),
            1 => "1 message".to_string(),
            n => format!("{n} messages"),
        }
    }
}
