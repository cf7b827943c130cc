//! Scoped event subscriptions.
//!
//! Every listener gets its own unbounded queue, so a slow listener delays
//! its own events but never loses them. Streamed transcript text depends on
//! seeing every fragment in order.

use parley_types::SessionEvent;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tracing::debug;

type Listeners = Vec<mpsc::UnboundedSender<SessionEvent>>;

/// Fan-out point for a client's events.
///
/// Cheap to clone; clones share the same listener set.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    listeners: Arc<Mutex<Listeners>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener that receives every event sent from now on.
    pub fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        EventSubscription::new(rx)
    }

    /// Delivers `event` to every live listener, pruning dropped ones.
    ///
    /// Returns the number of listeners that received it.
    pub fn send(&self, event: SessionEvent) -> usize {
        let mut listeners = self.lock();
        listeners.retain(|tx| tx.send(event.clone()).is_ok());
        listeners.len()
    }

    /// Number of listeners whose subscription is still alive.
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.lock();
        listeners.retain(|tx| !tx.is_closed());
        listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Listeners> {
        // The list stays consistent even if a holder panicked.
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A registered listener on a voice client's event stream.
///
/// The listener is registered when the subscription is created and
/// deregistered when it is dropped, whichever path drops it.
#[derive(Debug)]
pub struct EventSubscription {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        debug!("registered voice client event listener");
        Self { rx }
    }

    /// Waits for the next event, in the order the client sent them.
    ///
    /// Returns `None` once the client and every task sending on its behalf
    /// have been dropped.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        debug!("released voice client event listener");
    }
}
