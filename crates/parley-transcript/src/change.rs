//! Mutation records returned by the assembler for re-rendering.

use parley_types::Message;
use serde::{Deserialize, Serialize};

/// Describes a single mutation of the transcript.
///
/// Carries a snapshot of the affected message so the presentation layer can
/// re-render one bubble without re-reading the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum TranscriptChange {
    /// A new message was pushed at `index`.
    Appended {
        /// Position of the new message.
        index: usize,
        /// The message as created (and, for the fragment fallback, already grown).
        message: Message,
    },
    /// The message at `index` grew in place.
    Updated {
        /// Position of the message, unchanged by the update.
        index: usize,
        /// The message after the update.
        message: Message,
    },
    /// The transcript was emptied for a new session.
    Cleared,
}

impl TranscriptChange {
    /// Returns the affected message, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Appended { message, .. } | Self::Updated { message, .. } => Some(message),
            Self::Cleared => None,
        }
    }

    /// Returns the position of the affected message, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Appended { index, .. } | Self::Updated { index, .. } => Some(*index),
            Self::Cleared => None,
        }
    }
}
