use crate::actor::{Command, Reply, SessionActor};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::update::{SessionSnapshot, SessionUpdate};
use parley_types::{Control, Message, SessionEvent};
use parley_voice::{MediaDevices, VoiceClient};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Cloneable entry point to a running voice/chat session.
///
/// Every method enqueues a command for the session task, so calls from any
/// number of tasks are applied one at a time in arrival order. The session
/// task stops, releasing the client subscription and any camera stream,
/// once the last handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl SessionHandle {
    /// Starts a session task that owns `client` and `devices`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C, D>(client: Arc<C>, devices: Arc<D>, config: SessionConfig) -> Self
    where
        C: VoiceClient,
        D: MediaDevices,
    {
        let (commands_tx, commands_rx) = mpsc::channel(config.command_capacity.max(1));
        let (updates_tx, _) = broadcast::channel(config.update_capacity.max(1));

        let actor = SessionActor::new(
            client,
            devices,
            config,
            commands_tx.downgrade(),
            updates_tx.clone(),
        );
        tokio::spawn(actor.run(commands_rx));

        Self {
            commands: commands_tx,
            updates: updates_tx,
        }
    }

    /// Connects to the voice agent.
    ///
    /// Resolves once the client reports the session live, or with the
    /// connect failure. Calling it while already connected is a no-op.
    pub async fn connect(&self) -> Result<(), SessionError> {
        self.request(Command::Connect).await
    }

    /// Disconnects from the voice agent. Resolves once the session has ended.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        self.request(Command::Disconnect).await
    }

    /// Connects when disconnected, disconnects when connected.
    pub async fn toggle_connection(&self) -> Result<(), SessionError> {
        self.request(Command::ToggleConnection).await
    }

    /// Appends a typed user message and forwards it to the agent.
    ///
    /// The message is in the transcript by the time this returns; the agent
    /// is not waited on.
    pub async fn send_user_text(&self, text: impl Into<String>) -> Result<Message, SessionError> {
        let text = text.into();
        self.request(|reply| Command::SendText { text, reply }).await
    }

    /// Moves a toggle. Device failures revert it asynchronously and are
    /// reported through [`SessionUpdate::DeviceStatus`].
    pub async fn set_control(&self, control: Control, enabled: bool) -> Result<(), SessionError> {
        self.request(|reply| Command::SetControl {
            control,
            enabled,
            reply,
        })
        .await
    }

    /// Feeds an event through the same queue as client events.
    ///
    /// Used by hosts that receive agent events from a source other than the
    /// session's own client.
    pub async fn ingest(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.commands
            .send(Command::Event(event))
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Returns the current session state and transcript.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(Command::Snapshot).await
    }

    /// Returns the transcript in creation order.
    pub async fn messages(&self) -> Result<Vec<Message>, SessionError> {
        Ok(self.snapshot().await?.messages)
    }

    /// Subscribes to updates published after each mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }
}
