use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::client::ConnectionState;
use crate::types::MailboxError;

/// Events emitted over the lifetime of a client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    Connected,
    Disconnected { code: u16, reason: String },
    Error(Arc<MailboxError>),
    Reconnecting { attempt: u32, delay: Duration },
    StateChange { from: ConnectionState, to: ConnectionState },
    Data { channel: String, payload: Value },
    Update { channel: String, payload: Value },
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Disconnected { .. } => EventKind::Disconnected,
            Self::Error(_) => EventKind::Error,
            Self::Reconnecting { .. } => EventKind::Reconnecting,
            Self::StateChange { .. } => EventKind::StateChange,
            Self::Data { .. } => EventKind::Data,
            Self::Update { .. } => EventKind::Update,
        }
    }
}

/// Event names listeners register against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    Error,
    Reconnecting,
    StateChange,
    Data,
    Update,
}

/// Handle returned by [`EventBus::on`], used to unregister the listener.
pub type ListenerId = u64;

type Listener = Arc<dyn Fn(&ClientEvent) + Send + Sync + 'static>;

/// Fan-out dispatch of lifecycle and data events to registered listeners.
///
/// Dispatch is synchronous over a snapshot of the registration list, so a
/// listener may unregister itself (or others) mid-emit. A panic in one
/// listener is caught and logged without aborting the fan-out.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `kind` and returns its listener id.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut listeners = self.listeners.lock().expect("listener registry poisoned");
        listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Unregisters one listener; unknown ids are ignored.
    pub fn off(&self, kind: EventKind, id: ListenerId) {
        let mut listeners = self.listeners.lock().expect("listener registry poisoned");
        if let Some(entries) = listeners.get_mut(&kind) {
            entries.retain(|(entry_id, _)| *entry_id != id);
        }
    }

    /// Clears one event kind's listeners, or all of them.
    pub fn remove_all(&self, kind: Option<EventKind>) {
        let mut listeners = self.listeners.lock().expect("listener registry poisoned");
        match kind {
            Some(kind) => {
                listeners.remove(&kind);
            }
            None => listeners.clear(),
        }
    }

    /// Invokes every currently registered listener for the event's kind.
    pub fn emit(&self, event: &ClientEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = {
            let listeners = self.listeners.lock().expect("listener registry poisoned");
            listeners.get(&event.kind()).cloned().unwrap_or_default()
        };

        for (id, listener) in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                tracing::error!(
                    "Listener {} for {:?} panicked during dispatch",
                    id,
                    event.kind()
                );
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        let listeners = self.listeners.lock().expect("listener registry poisoned");
        listeners.get(&kind).map(Vec::len).unwrap_or(0)
    }
}
