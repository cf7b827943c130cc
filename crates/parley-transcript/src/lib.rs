//! Conversation transcript assembly for Parley.
//!
//! Turns the ordered stream of session events reported by a voice-agent
//! client into the list of chat bubbles shown to the user:
//!
//! | Event | Effect on the transcript |
//! |-------|--------------------------|
//! | `ASSISTANT_TURN_STARTED` | appends an empty assistant message and marks it open |
//! | `ASSISTANT_TEXT_FRAGMENT` | grows the open assistant message in place |
//! | `USER_TRANSCRIPT` (final) | appends a complete user message |
//! | `SESSION_DISCONNECTED` | closes the open assistant message |
//!
//! The list is append-only. Fragments are applied in delivery order with no
//! reordering or deduplication; ordering is the transport's job.
//!
//! # Usage
//!
//! ```rust
//! use parley_transcript::TranscriptAssembler;
//!
//! let mut transcript = TranscriptAssembler::new();
//! transcript.on_assistant_turn_started();
//! transcript.on_assistant_text_fragment("Hel");
//! transcript.on_assistant_text_fragment("lo!");
//! assert_eq!(transcript.messages()[0].text, "Hello!");
//! ```

mod assembler;
mod change;

pub use assembler::TranscriptAssembler;
pub use change::TranscriptChange;
