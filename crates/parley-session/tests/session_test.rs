use parley_session::{
    SessionConfig, SessionError, SessionHandle, SessionUpdate, CONNECT_FAILED_NOTICE,
};
use parley_types::{ConnectionState, Control, Sender, SessionEvent};
use parley_voice::{
    ClientConfig, EventHub, EventSubscription, SimulatedDevices, SimulatedVoiceClient,
    VoiceClient, VoiceError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

struct Fixture {
    client: Arc<SimulatedVoiceClient>,
    devices: Arc<SimulatedDevices>,
    session: SessionHandle,
}

fn fixture_with_reply(config: SessionConfig, reply_delay: Duration) -> Fixture {
    let client = Arc::new(SimulatedVoiceClient::new().with_reply("Hello from the agent", reply_delay));
    let devices = Arc::new(SimulatedDevices::new());
    let session = SessionHandle::spawn(Arc::clone(&client), Arc::clone(&devices), config);
    Fixture {
        client,
        devices,
        session,
    }
}

/// Replies are delayed far enough that they never land mid-test.
fn fixture_with(config: SessionConfig) -> Fixture {
    fixture_with_reply(config, Duration::from_secs(60))
}

fn fixture() -> Fixture {
    fixture_with(SessionConfig::default())
}

/// Polls `check` until it holds or two seconds pass.
async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// Waits for the first update matching `predicate`.
async fn wait_for(
    updates: &mut broadcast::Receiver<SessionUpdate>,
    predicate: impl Fn(&SessionUpdate) -> bool,
) -> SessionUpdate {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match updates.recv().await {
                Ok(update) if predicate(&update) => return update,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => panic!("update stream closed"),
            }
        }
    })
    .await
    .expect("expected update did not arrive")
}

fn fragment(text: &str) -> SessionEvent {
    SessionEvent::AssistantTextFragment {
        text: text.to_string(),
    }
}

// ── Connection lifecycle ─────────────────────────────────────────────

#[tokio::test]
async fn test_connect_marks_session_live() {
    let f = fixture();
    f.session.connect().await.expect("connect should succeed");

    let snapshot = f.session.snapshot().await.unwrap();
    assert_eq!(snapshot.connection, ConnectionState::Connected);
    assert_eq!(snapshot.notice, None);
    assert!(f.client.is_connected());
}

#[tokio::test]
async fn test_connect_failure_reverts_and_notifies() {
    let f = fixture();
    f.client.fail_connect(true);
    let mut updates = f.session.subscribe();

    let err = f.session.connect().await.expect_err("connect should fail");
    assert!(matches!(
        err,
        SessionError::Voice(VoiceError::TransportConnect(_))
    ));

    let snapshot = f.session.snapshot().await.unwrap();
    assert_eq!(snapshot.connection, ConnectionState::Disconnected);
    assert_eq!(snapshot.notice.as_deref(), Some(CONNECT_FAILED_NOTICE));

    wait_for(&mut updates, |u| {
        matches!(u, SessionUpdate::Notice { message: Some(_) })
    })
    .await;

    // A user-initiated retry clears the notice.
    f.client.fail_connect(false);
    f.session.connect().await.expect("retry should succeed");
    let snapshot = f.session.snapshot().await.unwrap();
    assert_eq!(snapshot.connection, ConnectionState::Connected);
    assert_eq!(snapshot.notice, None);
}

#[tokio::test]
async fn test_disconnect_keeps_transcript() {
    let f = fixture();
    f.session.connect().await.unwrap();
    f.session.send_user_text("hello").await.unwrap();

    f.session.disconnect().await.expect("disconnect should succeed");

    let snapshot = f.session.snapshot().await.unwrap();
    assert_eq!(snapshot.connection, ConnectionState::Disconnected);
    assert!(!f.client.is_connected());
    assert_eq!(snapshot.messages[0].text, "hello");
}

#[tokio::test]
async fn test_disconnect_after_ingested_connect() {
    let f = fixture();
    f.session.ingest(SessionEvent::SessionConnected).await.unwrap();
    f.session.ingest(SessionEvent::AssistantTurnStarted).await.unwrap();
    f.session.ingest(fragment("before")).await.unwrap();
    assert_eq!(
        f.session.snapshot().await.unwrap().connection,
        ConnectionState::Connected
    );
    assert!(!f.client.is_connected());

    tokio::time::timeout(Duration::from_secs(2), f.session.disconnect())
        .await
        .expect("disconnect should not hang")
        .expect("disconnect should succeed");
    assert_eq!(
        f.session.snapshot().await.unwrap().connection,
        ConnectionState::Disconnected
    );

    // The open message was closed along with the session.
    f.session.ingest(fragment("after")).await.unwrap();
    let messages = f.session.messages().await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "before");
    assert_eq!(messages[1].text, "after");

    tokio::time::timeout(Duration::from_secs(2), f.session.disconnect())
        .await
        .expect("second disconnect should not hang")
        .expect("second disconnect should succeed");
}

/// Accepts connects but never reports the session live.
struct SilentClient {
    events: EventHub,
}

impl VoiceClient for SilentClient {
    async fn connect(&self, _config: &ClientConfig) -> Result<(), VoiceError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), VoiceError> {
        Ok(())
    }

    async fn set_microphone(&self, _enabled: bool) -> Result<(), VoiceError> {
        Ok(())
    }

    fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }
}

#[tokio::test]
async fn test_connect_without_session_event_fails_after_timeout() {
    let session = SessionHandle::spawn(
        Arc::new(SilentClient {
            events: EventHub::new(),
        }),
        Arc::new(SimulatedDevices::new()),
        SessionConfig {
            connect_timeout: Duration::from_millis(50),
            ..SessionConfig::default()
        },
    );

    let err = tokio::time::timeout(Duration::from_secs(2), session.connect())
        .await
        .expect("connect should not hang")
        .expect_err("connect should fail");
    assert!(matches!(
        err,
        SessionError::Voice(VoiceError::TransportConnect(_))
    ));

    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.connection, ConnectionState::Disconnected);
    assert_eq!(snapshot.notice.as_deref(), Some(CONNECT_FAILED_NOTICE));
}

#[tokio::test]
async fn test_toggle_connection_flips_state() {
    let f = fixture();

    f.session.toggle_connection().await.unwrap();
    assert_eq!(
        f.session.snapshot().await.unwrap().connection,
        ConnectionState::Connected
    );

    f.session.toggle_connection().await.unwrap();
    assert_eq!(
        f.session.snapshot().await.unwrap().connection,
        ConnectionState::Disconnected
    );
}

#[tokio::test]
async fn test_transcript_persists_across_reconnect_by_default() {
    let f = fixture();
    f.session.connect().await.unwrap();
    f.session.send_user_text("first session").await.unwrap();
    f.session.disconnect().await.unwrap();
    f.session.connect().await.unwrap();

    let messages = f.session.messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "first session");
}

#[tokio::test]
async fn test_clear_on_connect_starts_fresh_transcript() {
    let f = fixture_with(SessionConfig {
        clear_on_connect: true,
        ..SessionConfig::default()
    });
    f.session.connect().await.unwrap();
    f.session.send_user_text("first session").await.unwrap();
    f.session.disconnect().await.unwrap();

    assert_eq!(f.session.messages().await.unwrap().len(), 1);

    f.session.connect().await.unwrap();
    assert!(f.session.messages().await.unwrap().is_empty());
}

// ── Transcript through the session queue ─────────────────────────────

#[tokio::test]
async fn test_streamed_turn_coalesces() {
    let f = fixture();
    f.session.connect().await.unwrap();
    let mut updates = f.session.subscribe();

    for event in [
        SessionEvent::AssistantTurnStarted,
        fragment("Hel"),
        fragment("lo!"),
        SessionEvent::AssistantSpeakingStarted,
    ] {
        f.client.emit(event);
    }

    wait_for(&mut updates, |u| {
        matches!(u, SessionUpdate::Speaking { speaking: true })
    })
    .await;

    let messages = f.session.messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Sender::Assistant);
    assert_eq!(messages[0].text, "Hello!");
}

#[tokio::test]
async fn test_only_final_user_transcripts_append() {
    let f = fixture();
    f.session
        .ingest(SessionEvent::UserTranscript {
            text: "hi".to_string(),
            is_final: false,
        })
        .await
        .unwrap();
    f.session
        .ingest(SessionEvent::UserTranscript {
            text: "hi there".to_string(),
            is_final: true,
        })
        .await
        .unwrap();

    let messages = f.session.messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].text, "hi there");
}

#[tokio::test]
async fn test_send_user_text_appends_immediately() {
    let f = fixture();
    f.session.connect().await.unwrap();

    let message = f.session.send_user_text("ping").await.unwrap();
    assert_eq!(message.sender, Sender::User);
    assert_eq!(message.text, "ping");

    let messages = f.session.messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, message.id);
}

#[tokio::test]
async fn test_send_user_text_validation() {
    let f = fixture();
    assert_eq!(
        f.session.send_user_text("ping").await,
        Err(SessionError::NotConnected)
    );

    f.session.connect().await.unwrap();
    assert_eq!(
        f.session.send_user_text("   ").await,
        Err(SessionError::EmptyMessage)
    );
    assert!(f.session.messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_local_responder_answers_typed_text() {
    let f = fixture_with_reply(SessionConfig::default(), Duration::from_millis(10));
    f.session.connect().await.unwrap();
    let mut updates = f.session.subscribe();

    f.session.send_user_text("hello?").await.unwrap();
    wait_for(&mut updates, |u| {
        matches!(u, SessionUpdate::Speaking { speaking: false })
    })
    .await;

    let messages = f.session.messages().await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[1].sender, Sender::Assistant);
    assert_eq!(messages[1].text, "Hello from the agent");
}

#[tokio::test]
async fn test_long_reply_is_not_truncated() {
    let reply: String = (0..600).map(|i| format!("w{i} ")).collect();
    let client = Arc::new(
        SimulatedVoiceClient::new().with_reply(reply.clone(), Duration::from_millis(10)),
    );
    let session = SessionHandle::spawn(
        client,
        Arc::new(SimulatedDevices::new()),
        SessionConfig::default(),
    );
    session.connect().await.unwrap();
    session.send_user_text("hi").await.unwrap();

    let messages = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = session.snapshot().await.unwrap();
            if !snapshot.bot_speaking && snapshot.message_count == 2 {
                let assistant = &snapshot.messages[1];
                if assistant.text.len() == reply.len() {
                    return snapshot.messages;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("full reply did not arrive");

    assert_eq!(messages[0].text, "hi");
    assert_eq!(messages[1].sender, Sender::Assistant);
    assert_eq!(messages[1].text, reply);
}

#[tokio::test]
async fn test_fragment_after_disconnect_opens_new_message() {
    let f = fixture();
    f.session.connect().await.unwrap();
    f.session.ingest(SessionEvent::AssistantTurnStarted).await.unwrap();
    f.session.ingest(fragment("before")).await.unwrap();
    f.session.disconnect().await.unwrap();
    f.session.ingest(fragment("after")).await.unwrap();

    let messages = f.session.messages().await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "before");
    assert_eq!(messages[1].text, "after");
}

#[tokio::test]
async fn test_speaking_state_resets_on_disconnect() {
    let f = fixture();
    f.session.connect().await.unwrap();
    f.session
        .ingest(SessionEvent::AssistantSpeakingStarted)
        .await
        .unwrap();
    assert!(f.session.snapshot().await.unwrap().bot_speaking);

    f.session.disconnect().await.unwrap();
    assert!(!f.session.snapshot().await.unwrap().bot_speaking);
}

// ── Device controls ──────────────────────────────────────────────────

#[tokio::test]
async fn test_denied_camera_reverts_toggle() {
    let f = fixture();
    f.devices.deny_camera(true);
    let mut updates = f.session.subscribe();

    f.session.set_control(Control::Camera, true).await.unwrap();

    wait_for(&mut updates, |u| {
        matches!(
            u,
            SessionUpdate::DeviceStatus {
                control: Control::Camera,
                status: Some(_)
            }
        )
    })
    .await;

    let snapshot = f.session.snapshot().await.unwrap();
    assert!(!snapshot.controls.camera);
    assert_eq!(
        snapshot.device_status.get(&Control::Camera).map(String::as_str),
        Some("Camera access denied")
    );
    assert_eq!(f.devices.live_streams(), 0);
}

#[tokio::test]
async fn test_camera_stream_stops_when_toggled_off() {
    let f = fixture();
    f.session.set_control(Control::Camera, true).await.unwrap();
    let devices = Arc::clone(&f.devices);
    eventually(|| devices.live_streams() == 1).await;

    f.session.set_control(Control::Camera, false).await.unwrap();
    assert_eq!(f.devices.live_streams(), 0);
}

#[tokio::test]
async fn test_superseded_camera_request_is_stopped() {
    let f = fixture();
    f.session.set_control(Control::Camera, true).await.unwrap();
    f.session.set_control(Control::Camera, false).await.unwrap();

    // Let the first open complete; its stream must not stay live.
    f.session.snapshot().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(f.devices.live_streams(), 0);
    assert!(!f.session.snapshot().await.unwrap().controls.camera);
}

#[tokio::test]
async fn test_microphone_toggle_reaches_client() {
    let f = fixture();
    f.session.connect().await.unwrap();
    assert!(f.client.microphone_enabled());

    f.session
        .set_control(Control::Microphone, false)
        .await
        .unwrap();
    let client = Arc::clone(&f.client);
    eventually(|| !client.microphone_enabled()).await;
    assert!(!f.session.snapshot().await.unwrap().controls.microphone);
}

#[tokio::test]
async fn test_output_sound_is_local_only() {
    let f = fixture();
    let mut updates = f.session.subscribe();
    f.session
        .set_control(Control::OutputSound, false)
        .await
        .unwrap();

    let update = wait_for(&mut updates, |u| matches!(u, SessionUpdate::Control { .. })).await;
    assert_eq!(
        update,
        SessionUpdate::Control {
            control: Control::OutputSound,
            enabled: false
        }
    );
}

// ── Teardown ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_dropping_handle_releases_client_subscription() {
    let f = fixture();
    f.session.connect().await.unwrap();
    f.session.set_control(Control::Camera, true).await.unwrap();
    let devices = Arc::clone(&f.devices);
    eventually(|| devices.live_streams() == 1).await;
    assert_eq!(f.client.listener_count(), 1);

    let Fixture {
        client,
        devices,
        session,
    } = f;
    drop(session);

    eventually(|| client.listener_count() == 0).await;
    eventually(|| !client.is_connected()).await;
    assert_eq!(devices.live_streams(), 0);
}

#[tokio::test]
async fn test_cloned_handle_keeps_session_alive() {
    let f = fixture();
    let clone = f.session.clone();
    let client = Arc::clone(&f.client);
    drop(f);

    // The clone keeps the task alive.
    assert!(clone.snapshot().await.is_ok());
    assert_eq!(client.listener_count(), 1);
}

#[tokio::test]
async fn test_configured_devices_apply_at_start() {
    let mut config = SessionConfig::default();
    config.client.enable_mic = false;
    config.client.enable_cam = true;
    let f = fixture_with(config);

    let devices = Arc::clone(&f.devices);
    eventually(|| devices.live_streams() == 1).await;

    let snapshot = f.session.snapshot().await.unwrap();
    assert!(!snapshot.controls.microphone);
    assert!(snapshot.controls.camera);

    f.session.connect().await.unwrap();
    assert!(!f.client.microphone_enabled());
}
