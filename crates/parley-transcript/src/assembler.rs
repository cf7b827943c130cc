//! The transcript state machine.
//!
//! All mutations go through the `on_*` methods (or [`TranscriptAssembler::apply`],
//! which dispatches a [`SessionEvent`] to them). Each returns the
//! [`TranscriptChange`] it made, or `None` when the input was ignored.

use parley_types::{Message, MessageId, Sender, SessionEvent};

use crate::change::TranscriptChange;

/// Assembles session events into an ordered list of chat messages.
///
/// At most one assistant message is open at a time. Opening a new one
/// closes the previous one by supersession; its text stays frozen at
/// whatever it held.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    messages: Vec<Message>,
    open_assistant: Option<usize>,
}

impl TranscriptAssembler {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty assistant message and marks it open.
    pub fn on_assistant_turn_started(&mut self) -> TranscriptChange {
        if let Some(previous) = self.open_assistant {
            tracing::debug!(index = previous, "assistant turn superseded by a new turn");
        }
        let index = self.push(Message::assistant(String::new()));
        self.open_assistant = Some(index);
        TranscriptChange::Appended {
            index,
            message: self.messages[index].clone(),
        }
    }

    /// Appends a streamed fragment to the open assistant message.
    ///
    /// When no message is open (the turn-started event was missed or the
    /// session ended), a new assistant message is opened first. Empty
    /// fragments are ignored.
    pub fn on_assistant_text_fragment(&mut self, fragment: &str) -> Option<TranscriptChange> {
        if fragment.is_empty() {
            return None;
        }

        match self.open_assistant {
            Some(index) => {
                let message = &mut self.messages[index];
                message.text.push_str(fragment);
                Some(TranscriptChange::Updated {
                    index,
                    message: message.clone(),
                })
            }
            None => {
                tracing::debug!("text fragment without an open turn, opening one");
                let index = self.push(Message::assistant(fragment));
                self.open_assistant = Some(index);
                Some(TranscriptChange::Appended {
                    index,
                    message: self.messages[index].clone(),
                })
            }
        }
    }

    /// Appends a user utterance once speech recognition has finalized it.
    ///
    /// Interim results (`is_final == false`) and empty text are ignored.
    /// The open assistant message, if any, stays open.
    pub fn on_user_utterance(&mut self, text: &str, is_final: bool) -> Option<TranscriptChange> {
        if !is_final || text.is_empty() {
            return None;
        }
        Some(self.append_user(text))
    }

    /// Stops coalescing fragments until the next turn starts.
    ///
    /// The message list is left intact.
    pub fn on_session_ended(&mut self) {
        if let Some(index) = self.open_assistant.take() {
            tracing::debug!(index, "closed open assistant message on session end");
        }
    }

    /// Appends a typed user message immediately, without waiting for the
    /// transport to echo it back.
    ///
    /// Text that is blank after trimming is ignored; otherwise the text is
    /// stored as given.
    pub fn send_user_text(&mut self, text: &str) -> Option<TranscriptChange> {
        if text.trim().is_empty() {
            return None;
        }
        Some(self.append_user(text))
    }

    /// Applies an inbound session event.
    ///
    /// Connectivity-up and speaking events never touch the transcript and
    /// return `None`.
    pub fn apply(&mut self, event: &SessionEvent) -> Option<TranscriptChange> {
        match event {
            SessionEvent::AssistantTurnStarted => Some(self.on_assistant_turn_started()),
            SessionEvent::AssistantTextFragment { text } => self.on_assistant_text_fragment(text),
            SessionEvent::UserTranscript { text, is_final } => {
                self.on_user_utterance(text, *is_final)
            }
            SessionEvent::SessionDisconnected => {
                self.on_session_ended();
                None
            }
            SessionEvent::SessionConnected
            | SessionEvent::AssistantSpeakingStarted
            | SessionEvent::AssistantSpeakingStopped => None,
        }
    }

    /// Empties the transcript for a new session.
    pub fn clear(&mut self) -> TranscriptChange {
        tracing::debug!(count = self.messages.len(), "clearing transcript");
        self.messages.clear();
        self.open_assistant = None;
        TranscriptChange::Cleared
    }

    /// Returns every message in creation order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the assistant message currently receiving fragments.
    pub fn open_message(&self) -> Option<&Message> {
        self.open_assistant.map(|index| &self.messages[index])
    }

    /// Looks up a message by identifier.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    /// Number of messages in the transcript.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn append_user(&mut self, text: &str) -> TranscriptChange {
        let index = self.push(Message::new(Sender::User, text));
        TranscriptChange::Appended {
            index,
            message: self.messages[index].clone(),
        }
    }

    fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }
}
