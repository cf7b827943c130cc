use crate::config::ClientConfig;
use crate::error::VoiceError;
use crate::subscription::EventSubscription;
use std::future::Future;

/// A real-time voice-agent client.
///
/// Implementations own the transport (signaling, media, transcript
/// streaming) and report what happens through [`SessionEvent`]s delivered to
/// every [`EventSubscription`]. Events must be delivered in the order the
/// agent produced them.
///
/// [`SessionEvent`]: parley_types::SessionEvent
pub trait VoiceClient: Send + Sync + 'static {
    /// Starts a session. Success means the request was accepted; the session
    /// is live once `SessionConnected` is delivered.
    fn connect(
        &self,
        config: &ClientConfig,
    ) -> impl Future<Output = Result<(), VoiceError>> + Send;

    /// Ends the current session, if any.
    ///
    /// A client with no live session may return `Ok` without delivering
    /// `SessionDisconnected`.
    fn disconnect(&self) -> impl Future<Output = Result<(), VoiceError>> + Send;

    /// Starts or stops publishing microphone audio.
    fn set_microphone(&self, enabled: bool) -> impl Future<Output = Result<(), VoiceError>> + Send;

    /// Forwards typed user text to the agent.
    ///
    /// Clients whose agent only listens to voice keep the default, which
    /// accepts the text and does nothing with it.
    fn send_text(&self, text: &str) -> impl Future<Output = Result<(), VoiceError>> + Send {
        let _ = text;
        async { Ok(()) }
    }

    /// Registers a new event listener.
    fn subscribe(&self) -> EventSubscription;
}
