//! Decoding of RTVI server messages into session events.
//!
//! RTVI agents report their state as JSON envelopes of the form
//! `{"type": "<kind>", "data": {...}}`. Only the kinds the transcript and
//! presentation layers care about are decoded; anything else, including
//! malformed payloads, decodes to `None` and is meant to be ignored.

use parley_types::SessionEvent;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct TextData {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionData {
    text: String,
    #[serde(rename = "final", default)]
    is_final: bool,
}

/// Decodes a raw RTVI message.
pub fn decode_message(raw: &str) -> Option<SessionEvent> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring RTVI message that is not JSON");
            return None;
        }
    };
    decode_value(value)
}

/// Decodes an already-parsed RTVI message.
pub fn decode_value(value: Value) -> Option<SessionEvent> {
    let envelope: Envelope = serde_json::from_value(value).ok()?;

    let event = match envelope.kind.as_str() {
        "bot-ready" | "connected" => SessionEvent::SessionConnected,
        "disconnected" => SessionEvent::SessionDisconnected,
        "bot-llm-started" => SessionEvent::AssistantTurnStarted,
        "bot-llm-text" => {
            let data: TextData = serde_json::from_value(envelope.data).ok()?;
            SessionEvent::AssistantTextFragment { text: data.text }
        }
        "user-transcription" => {
            let data: TranscriptionData = serde_json::from_value(envelope.data).ok()?;
            SessionEvent::UserTranscript {
                text: data.text,
                is_final: data.is_final,
            }
        }
        "bot-started-speaking" => SessionEvent::AssistantSpeakingStarted,
        "bot-stopped-speaking" => SessionEvent::AssistantSpeakingStopped,
        other => {
            tracing::trace!(kind = other, "ignoring unhandled RTVI message");
            return None;
        }
    };

    Some(event)
}
