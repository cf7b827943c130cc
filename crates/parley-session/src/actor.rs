//! The session task.
//!
//! One task owns the transcript, the connection and device state, and the
//! voice client. Every mutation arrives as a [`Command`] on a single mpsc
//! queue and is applied in queue order, so remote events, typed text, and
//! control toggles never interleave inside a mutation. Slow client and
//! device calls run on spawned tasks that report back through the same
//! queue.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::update::{device_denied_status, SessionSnapshot, SessionUpdate, CONNECT_FAILED_NOTICE};
use parley_transcript::TranscriptAssembler;
use parley_types::{ConnectionState, Control, DeviceControls, Message, SessionEvent};
use parley_voice::{
    CameraPreview, EventSubscription, MediaDevices, MediaStream, VideoConstraints, VoiceClient,
    VoiceError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub(crate) type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

pub(crate) enum Command {
    /// An event from the voice client (or an external bridge).
    Event(SessionEvent),
    Connect(Reply<()>),
    Disconnect(Reply<()>),
    ToggleConnection(Reply<()>),
    SendText {
        text: String,
        reply: Reply<Message>,
    },
    SetControl {
        control: Control,
        enabled: bool,
        reply: Reply<()>,
    },
    Snapshot(Reply<SessionSnapshot>),
    ConnectFinished(Result<(), VoiceError>),
    /// The client accepted connect attempt `attempt` but never reported
    /// the session live.
    ConnectStalled {
        attempt: u64,
    },
    DisconnectFinished(Result<(), VoiceError>),
    DeviceFailed {
        control: Control,
        enabled: bool,
        error: VoiceError,
    },
    CameraOpened {
        generation: u64,
        result: Result<Box<dyn MediaStream>, VoiceError>,
    },
}

/// Forwards client events into the command queue.
///
/// Holds the client subscription for as long as it lives; dropping the
/// forwarder aborts the task, which drops the subscription and deregisters
/// the listener.
struct EventForwarder {
    task: JoinHandle<()>,
}

impl EventForwarder {
    fn spawn(mut subscription: EventSubscription, commands: mpsc::WeakSender<Command>) -> Self {
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                let Some(tx) = commands.upgrade() else {
                    break;
                };
                if tx.send(Command::Event(event)).await.is_err() {
                    break;
                }
            }
            debug!("client event forwarding stopped");
        });
        Self { task }
    }
}

impl Drop for EventForwarder {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Sends a command back to the session if it is still running.
async fn send_back(commands: &mpsc::WeakSender<Command>, command: Command) {
    if let Some(tx) = commands.upgrade() {
        let _ = tx.send(command).await;
    }
}

pub(crate) struct SessionActor<C, D> {
    client: Arc<C>,
    devices: Arc<D>,
    config: SessionConfig,
    transcript: TranscriptAssembler,
    connection: ConnectionState,
    bot_speaking: bool,
    controls: DeviceControls,
    device_status: HashMap<Control, String>,
    notice: Option<String>,
    pending_connects: Vec<Reply<()>>,
    pending_disconnects: Vec<Reply<()>>,
    connect_attempt: u64,
    camera: Option<CameraPreview>,
    camera_generation: u64,
    commands: mpsc::WeakSender<Command>,
    updates: broadcast::Sender<SessionUpdate>,
    _events: EventForwarder,
}

impl<C: VoiceClient, D: MediaDevices> SessionActor<C, D> {
    pub(crate) fn new(
        client: Arc<C>,
        devices: Arc<D>,
        config: SessionConfig,
        commands: mpsc::WeakSender<Command>,
        updates: broadcast::Sender<SessionUpdate>,
    ) -> Self {
        // Register before the task starts so no early event is missed.
        let events = EventForwarder::spawn(client.subscribe(), commands.clone());
        let controls = DeviceControls {
            microphone: config.client.enable_mic,
            ..DeviceControls::default()
        };
        Self {
            client,
            devices,
            config,
            transcript: TranscriptAssembler::new(),
            connection: ConnectionState::Disconnected,
            bot_speaking: false,
            controls,
            device_status: HashMap::new(),
            notice: None,
            pending_connects: Vec::new(),
            pending_disconnects: Vec::new(),
            connect_attempt: 0,
            camera: None,
            camera_generation: 0,
            commands,
            updates,
            _events: events,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!("session task started");
        if self.config.client.enable_cam {
            self.set_control(Control::Camera, true);
        }
        while let Some(command) = commands.recv().await {
            self.handle(command);
        }
        self.shutdown().await;
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Event(event) => self.on_event(event),
            Command::Connect(reply) => self.connect(reply),
            Command::Disconnect(reply) => self.disconnect(reply),
            Command::ToggleConnection(reply) => match self.connection {
                ConnectionState::Connected => self.disconnect(reply),
                ConnectionState::Connecting | ConnectionState::Disconnected => self.connect(reply),
            },
            Command::SendText { text, reply } => self.send_text(text, reply),
            Command::SetControl {
                control,
                enabled,
                reply,
            } => {
                self.set_control(control, enabled);
                let _ = reply.send(Ok(()));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(Ok(self.snapshot()));
            }
            Command::ConnectFinished(result) => self.connect_finished(result),
            Command::ConnectStalled { attempt } => self.connect_stalled(attempt),
            Command::DisconnectFinished(result) => self.disconnect_finished(result),
            Command::DeviceFailed {
                control,
                enabled,
                error,
            } => {
                if enabled {
                    self.fail_device(control, error);
                } else {
                    warn!(%control, error = %error, "failed to disable device");
                }
            }
            Command::CameraOpened { generation, result } => self.camera_opened(generation, result),
        }
    }

    // ── Client events ────────────────────────────────────────────────

    fn on_event(&mut self, event: SessionEvent) {
        debug!(event = event.event_type(), "session event");
        match event {
            SessionEvent::SessionConnected => self.mark_connected(),
            SessionEvent::SessionDisconnected => self.mark_disconnected(),
            SessionEvent::AssistantSpeakingStarted => self.set_speaking(true),
            SessionEvent::AssistantSpeakingStopped => self.set_speaking(false),
            _ => {}
        }

        if let Some(change) = self.transcript.apply(&event) {
            self.publish(SessionUpdate::Transcript { change });
        }
    }

    fn mark_connected(&mut self) {
        if self.connection == ConnectionState::Connected {
            return;
        }
        if self.config.clear_on_connect && !self.transcript.is_empty() {
            let change = self.transcript.clear();
            self.publish(SessionUpdate::Transcript { change });
        }
        self.set_connection(ConnectionState::Connected);
        self.set_notice(None);
        info!("voice session connected");
        for reply in self.pending_connects.drain(..) {
            let _ = reply.send(Ok(()));
        }
    }

    fn mark_disconnected(&mut self) {
        // Connect failures arrive as ConnectFinished or ConnectStalled; a
        // disconnect event seen now belongs to the previous session.
        if self.connection == ConnectionState::Connecting {
            debug!("disconnect event during connect ignored");
            return;
        }
        let previous = self.connection;
        self.transcript.on_session_ended();
        self.set_connection(ConnectionState::Disconnected);
        self.set_speaking(false);

        if previous == ConnectionState::Connected {
            info!("voice session disconnected");
        }

        for reply in self.pending_disconnects.drain(..) {
            let _ = reply.send(Ok(()));
        }
    }

    // ── Connection control ───────────────────────────────────────────

    fn connect(&mut self, reply: Reply<()>) {
        match self.connection {
            ConnectionState::Connected => {
                let _ = reply.send(Ok(()));
            }
            ConnectionState::Connecting => self.pending_connects.push(reply),
            ConnectionState::Disconnected => {
                self.pending_connects.push(reply);
                self.connect_attempt += 1;
                self.set_connection(ConnectionState::Connecting);
                self.set_notice(None);

                let mut client_config = self.config.client.clone();
                client_config.enable_mic = self.controls.microphone;
                client_config.enable_cam = self.controls.camera;
                let client = Arc::clone(&self.client);
                let commands = self.commands.clone();
                tokio::spawn(async move {
                    let result = client.connect(&client_config).await;
                    send_back(&commands, Command::ConnectFinished(result)).await;
                });
            }
        }
    }

    fn connect_finished(&mut self, result: Result<(), VoiceError>) {
        match result {
            // Live once the client reports SessionConnected.
            Ok(()) if self.connection == ConnectionState::Connecting => {
                let attempt = self.connect_attempt;
                let wait = self.config.connect_timeout;
                let commands = self.commands.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(wait).await;
                    send_back(&commands, Command::ConnectStalled { attempt }).await;
                });
            }
            Ok(()) => {}
            Err(e) if self.connection == ConnectionState::Connecting => {
                self.set_connection(ConnectionState::Disconnected);
                self.fail_connect(e);
            }
            Err(e) => warn!(
                error = %e,
                state = %self.connection,
                "late connect failure ignored"
            ),
        }
    }

    fn connect_stalled(&mut self, attempt: u64) {
        if attempt != self.connect_attempt || self.connection != ConnectionState::Connecting {
            return;
        }
        self.set_connection(ConnectionState::Disconnected);
        self.fail_connect(VoiceError::TransportConnect(format!(
            "agent did not confirm the session within {:?}",
            self.config.connect_timeout
        )));
    }

    fn fail_connect(&mut self, error: VoiceError) {
        warn!(error = %error, "failed to connect to voice agent");
        self.set_notice(Some(CONNECT_FAILED_NOTICE.to_string()));
        for reply in self.pending_connects.drain(..) {
            let _ = reply.send(Err(SessionError::Voice(error.clone())));
        }
    }

    fn disconnect(&mut self, reply: Reply<()>) {
        if self.connection != ConnectionState::Connected {
            let _ = reply.send(Ok(()));
            return;
        }

        let first = self.pending_disconnects.is_empty();
        self.pending_disconnects.push(reply);
        if !first {
            return;
        }

        let client = Arc::clone(&self.client);
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = client.disconnect().await;
            send_back(&commands, Command::DisconnectFinished(result)).await;
        });
    }

    fn disconnect_finished(&mut self, result: Result<(), VoiceError>) {
        match result {
            // A client that was never connected (for example when the
            // session went live through an ingested event) closes without
            // emitting SessionDisconnected.
            Ok(()) => {
                if self.connection == ConnectionState::Connected
                    && !self.pending_disconnects.is_empty()
                {
                    debug!("client closed without a disconnect event");
                    self.mark_disconnected();
                }
            }
            Err(e) => {
                warn!(error = %e, "voice client failed to disconnect");
                for reply in self.pending_disconnects.drain(..) {
                    let _ = reply.send(Err(SessionError::Voice(e.clone())));
                }
            }
        }
    }

    // ── Typed text ───────────────────────────────────────────────────

    fn send_text(&mut self, text: String, reply: Reply<Message>) {
        if !self.connection.is_connected() {
            let _ = reply.send(Err(SessionError::NotConnected));
            return;
        }

        let Some(change) = self.transcript.send_user_text(&text) else {
            let _ = reply.send(Err(SessionError::EmptyMessage));
            return;
        };
        let message = change.message().cloned();
        self.publish(SessionUpdate::Transcript { change });
        let _ = reply.send(message.ok_or(SessionError::EmptyMessage));

        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            if let Err(e) = client.send_text(&text).await {
                warn!(error = %e, "voice client rejected typed text");
            }
        });
    }

    // ── Device controls ──────────────────────────────────────────────

    fn set_control(&mut self, control: Control, enabled: bool) {
        let previous = self.controls.set(control, enabled);
        if previous != enabled {
            self.publish(SessionUpdate::Control { control, enabled });
        }

        match control {
            Control::Microphone => {
                if enabled {
                    self.clear_device_status(control);
                }
                let client = Arc::clone(&self.client);
                let commands = self.commands.clone();
                tokio::spawn(async move {
                    if let Err(error) = client.set_microphone(enabled).await {
                        send_back(
                            &commands,
                            Command::DeviceFailed {
                                control,
                                enabled,
                                error,
                            },
                        )
                        .await;
                    }
                });
            }
            Control::Camera => {
                if previous == enabled {
                    return;
                }
                self.camera_generation += 1;
                if enabled {
                    self.clear_device_status(control);
                    self.open_camera();
                } else {
                    self.camera = None;
                }
            }
            Control::OutputSound => {}
        }
    }

    fn open_camera(&self) {
        let generation = self.camera_generation;
        let devices = Arc::clone(&self.devices);
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let result = devices.open_camera(VideoConstraints::default()).await;
            send_back(&commands, Command::CameraOpened { generation, result }).await;
        });
    }

    fn camera_opened(&mut self, generation: u64, result: Result<Box<dyn MediaStream>, VoiceError>) {
        if generation != self.camera_generation {
            // Superseded by a later toggle; stop the stream right away.
            if let Ok(stream) = result {
                drop(CameraPreview::new(stream));
            }
            return;
        }

        match result {
            Ok(stream) => {
                info!("camera preview started");
                self.camera = Some(CameraPreview::new(stream));
            }
            Err(error) => self.fail_device(Control::Camera, error),
        }
    }

    fn fail_device(&mut self, control: Control, error: VoiceError) {
        warn!(%control, error = %error, "device access failed");
        if self.controls.set(control, false) {
            self.publish(SessionUpdate::Control {
                control,
                enabled: false,
            });
        }
        if control == Control::Camera {
            self.camera = None;
            self.camera_generation += 1;
        }

        let status = match error {
            VoiceError::DeviceAccess { .. } => device_denied_status(control).to_string(),
            other => other.to_string(),
        };
        self.device_status.insert(control, status.clone());
        self.publish(SessionUpdate::DeviceStatus {
            control,
            status: Some(status),
        });
    }

    fn clear_device_status(&mut self, control: Control) {
        if self.device_status.remove(&control).is_some() {
            self.publish(SessionUpdate::DeviceStatus {
                control,
                status: None,
            });
        }
    }

    // ── State helpers ────────────────────────────────────────────────

    fn set_connection(&mut self, state: ConnectionState) {
        if self.connection != state {
            self.connection = state;
            self.publish(SessionUpdate::Connection { state });
        }
    }

    fn set_speaking(&mut self, speaking: bool) {
        if self.bot_speaking != speaking {
            self.bot_speaking = speaking;
            self.publish(SessionUpdate::Speaking { speaking });
        }
    }

    fn set_notice(&mut self, message: Option<String>) {
        if self.notice != message {
            self.notice = message.clone();
            self.publish(SessionUpdate::Notice { message });
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            connection: self.connection,
            bot_speaking: self.bot_speaking,
            controls: self.controls,
            device_status: self.device_status.clone(),
            notice: self.notice.clone(),
            message_count: self.transcript.len(),
            messages: self.transcript.messages().to_vec(),
        }
    }

    fn publish(&self, update: SessionUpdate) {
        // No subscribers is fine; the snapshot still reflects the change.
        let _ = self.updates.send(update);
    }

    async fn shutdown(mut self) {
        self.camera = None;
        if self.connection != ConnectionState::Disconnected {
            if let Err(e) = self.client.disconnect().await {
                warn!(error = %e, "failed to disconnect voice client during shutdown");
            }
        }
        info!(messages = self.transcript.len(), "session task stopped");
    }
}
