//! Inbound session events.
//!
//! A voice-agent client reports its lifecycle and streamed transcript as a
//! sequence of these events. Only the turn, fragment, and user transcript
//! events affect the transcript; the rest drive presentation state.

use serde::{Deserialize, Serialize};

/// An event reported by the external voice-agent client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    /// The client established a session with the agent.
    SessionConnected,
    /// The session ended, either by request or because the transport dropped.
    SessionDisconnected,
    /// The agent began producing a new response.
    AssistantTurnStarted,
    /// A streamed piece of the agent's current response.
    AssistantTextFragment {
        /// Text to append to the open response.
        text: String,
    },
    /// Speech recognition output for the local user.
    UserTranscript {
        /// Recognized text.
        text: String,
        /// Interim results are `false` and never reach the transcript.
        is_final: bool,
    },
    /// The agent started playing audio.
    AssistantSpeakingStarted,
    /// The agent stopped playing audio.
    AssistantSpeakingStopped,
}

impl SessionEvent {
    /// Returns the canonical event type string.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionConnected => "SESSION_CONNECTED",
            Self::SessionDisconnected => "SESSION_DISCONNECTED",
            Self::AssistantTurnStarted => "ASSISTANT_TURN_STARTED",
            Self::AssistantTextFragment { .. } => "ASSISTANT_TEXT_FRAGMENT",
            Self::UserTranscript { .. } => "USER_TRANSCRIPT",
            Self::AssistantSpeakingStarted => "ASSISTANT_SPEAKING_STARTED",
            Self::AssistantSpeakingStopped => "ASSISTANT_SPEAKING_STOPPED",
        }
    }

    /// Whether this event can mutate the transcript.
    pub fn affects_transcript(&self) -> bool {
        matches!(
            self,
            Self::AssistantTurnStarted
                | Self::AssistantTextFragment { .. }
                | Self::UserTranscript { .. }
                | Self::SessionDisconnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_uses_tag() {
        let event = SessionEvent::UserTranscript {
            text: "hi there".to_string(),
            is_final: true,
        };
        let json = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(json["event"], "USER_TRANSCRIPT");
        assert_eq!(json["text"], "hi there");
        assert_eq!(json["is_final"], true);
        assert_eq!(event.event_type(), "USER_TRANSCRIPT");
    }

    #[test]
    fn speaking_events_do_not_affect_transcript() {
        assert!(!SessionEvent::AssistantSpeakingStarted.affects_transcript());
        assert!(!SessionEvent::AssistantSpeakingStopped.affects_transcript());
        assert!(!SessionEvent::SessionConnected.affects_transcript());
        assert!(SessionEvent::AssistantTurnStarted.affects_transcript());
    }
}
