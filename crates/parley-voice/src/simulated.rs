use crate::client::VoiceClient;
use crate::config::ClientConfig;
use crate::error::VoiceError;
use crate::subscription::{EventHub, EventSubscription};
use parley_types::SessionEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Canned reply sent by the local responder.
pub const DEFAULT_REPLY_TEXT: &str = "I'm listening! How can I help you today?";

/// Delay before the local responder answers.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);

/// A voice client that fakes the agent locally.
///
/// Connecting always succeeds (unless told to fail) and every typed user
/// message is answered with a canned reply after a short delay, streamed
/// word by word inside a speaking window. No audio is captured or played.
#[derive(Debug)]
pub struct SimulatedVoiceClient {
    events: EventHub,
    connected: Arc<AtomicBool>,
    microphone: AtomicBool,
    fail_connect: AtomicBool,
    reply_text: String,
    reply_delay: Duration,
    connect_delay: Duration,
}

impl Default for SimulatedVoiceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedVoiceClient {
    pub fn new() -> Self {
        Self {
            events: EventHub::new(),
            connected: Arc::new(AtomicBool::new(false)),
            microphone: AtomicBool::new(true),
            fail_connect: AtomicBool::new(false),
            reply_text: DEFAULT_REPLY_TEXT.to_string(),
            reply_delay: DEFAULT_REPLY_DELAY,
            connect_delay: Duration::ZERO,
        }
    }

    pub fn with_reply(mut self, text: impl Into<String>, delay: Duration) -> Self {
        self.reply_text = text.into();
        self.reply_delay = delay;
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Makes subsequent connect attempts fail.
    pub fn fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn microphone_enabled(&self) -> bool {
        self.microphone.load(Ordering::SeqCst)
    }

    /// Number of registered event listeners.
    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    /// Delivers an event to every listener as if the agent had sent it.
    pub fn emit(&self, event: SessionEvent) {
        // No listeners is not an error; the event is simply unobserved.
        self.events.send(event);
    }
}

impl VoiceClient for SimulatedVoiceClient {
    async fn connect(&self, config: &ClientConfig) -> Result<(), VoiceError> {
        if config.connection_url.trim().is_empty() {
            return Err(VoiceError::Config("connection_url is empty".to_string()));
        }
        if self.is_connected() {
            return Ok(());
        }

        info!(url = %config.connection_url, "simulated client connecting");
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        if self.fail_connect.load(Ordering::SeqCst) {
            warn!(url = %config.connection_url, "simulated client refused connection");
            return Err(VoiceError::TransportConnect(format!(
                "agent at {} is unreachable",
                config.connection_url
            )));
        }

        self.microphone.store(config.enable_mic, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        self.emit(SessionEvent::SessionConnected);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), VoiceError> {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("simulated client disconnecting");
            self.emit(SessionEvent::SessionDisconnected);
        }
        Ok(())
    }

    async fn set_microphone(&self, enabled: bool) -> Result<(), VoiceError> {
        self.microphone.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<(), VoiceError> {
        if !self.is_connected() {
            return Err(VoiceError::NotConnected);
        }

        info!(chars = text.len(), "simulated agent received user text");

        let events = self.events.clone();
        let connected = Arc::clone(&self.connected);
        let reply = self.reply_text.clone();
        let delay = self.reply_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !connected.load(Ordering::SeqCst) {
                return;
            }
            events.send(SessionEvent::AssistantSpeakingStarted);
            events.send(SessionEvent::AssistantTurnStarted);
            for word in reply.split_inclusive(' ') {
                events.send(SessionEvent::AssistantTextFragment {
                    text: word.to_string(),
                });
            }
            events.send(SessionEvent::AssistantSpeakingStopped);
        });

        Ok(())
    }

    fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }
}
