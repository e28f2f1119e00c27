use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::messaging::{ClientEvent, EventBus};
use crate::socket::{SocketSink, WireFrame};
use crate::types::{MailboxError, Result};

/// Connection lifecycle states.
///
/// Transitions: `Disconnected → Connecting → Connected → (Disconnecting →
/// Disconnected) | (Reconnecting → Connecting | Disconnected)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Owns the transport sink and the connection state.
///
/// State is mutated only through [`transition`](Self::transition), which
/// emits a `StateChange` event for every mutation.
pub struct ConnectionManager {
    sink: Mutex<Option<Box<dyn SocketSink>>>,
    state: RwLock<ConnectionState>,
    events: Arc<EventBus>,
}

impl ConnectionManager {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            sink: Mutex::new(None),
            state: RwLock::new(ConnectionState::Disconnected),
            events,
        }
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Moves to `to`, emitting a state-change event. Same-state transitions
    /// are no-ops.
    pub async fn transition(&self, to: ConnectionState) {
        let from = {
            let mut state = self.state.write().await;
            let from = *state;
            if from == to {
                return;
            }
            *state = to;
            from
        };
        tracing::debug!("Connection state: {} -> {}", from, to);
        self.events.emit(&ClientEvent::StateChange { from, to });
    }

    /// Installs the outbound half after a successful connect.
    pub async fn set_sink(&self, sink: Box<dyn SocketSink>) {
        let mut guard = self.sink.lock().await;
        *guard = Some(sink);
    }

    /// Sends one text frame through the transport.
    pub async fn send_text(&self, text: String) -> Result<()> {
        let mut guard = self.sink.lock().await;
        match guard.as_mut() {
            Some(sink) => sink.send(WireFrame::Text(text)).await,
            None => Err(MailboxError::NotConnected),
        }
    }

    /// Closes the transport if open and drops the sink.
    pub async fn close(&self, code: u16, reason: &str) -> Result<()> {
        let mut guard = self.sink.lock().await;
        if let Some(sink) = guard.as_mut() {
            sink.close(code, reason).await?;
        }
        *guard = None;
        Ok(())
    }
}
