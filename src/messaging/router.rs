use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::{ClientEvent, EventBus};
use crate::client::ClientState;
use crate::types::{close_codes, MailboxError, ServerMessage, ServerMessageType};

/// What the read loop should do after one message is routed.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Continue,
    /// A server disconnect notice severs the connection; the read loop owns
    /// the teardown.
    Disconnected { code: u16, reason: String },
}

/// Routes validated inbound messages to the correlator and the event bus.
pub struct MessageRouter {
    state: Arc<RwLock<ClientState>>,
    events: Arc<EventBus>,
}

impl MessageRouter {
    pub fn new(state: Arc<RwLock<ClientState>>, events: Arc<EventBus>) -> Self {
        Self { state, events }
    }

    pub async fn route(&self, message: ServerMessage) -> RouteOutcome {
        if message.is_disconnect() {
            let reason = disconnect_reason(&message.data.response);
            tracing::warn!("Server disconnect notice on '{}': {}", message.channel, reason);
            return RouteOutcome::Disconnected {
                code: close_codes::SERVER_DISCONNECT,
                reason,
            };
        }

        if message.is_error() {
            self.route_error(message).await;
            return RouteOutcome::Continue;
        }

        match message.r#type {
            ServerMessageType::Data => self.route_data(message).await,
            ServerMessageType::Update => {
                tracing::debug!("Update push on channel '{}'", message.channel);
                self.events.emit(&ClientEvent::Update {
                    channel: message.channel,
                    payload: message.data.response,
                });
            }
            // handled above
            ServerMessageType::Disconnect => unreachable!("disconnect routed before type match"),
        }
        RouteOutcome::Continue
    }

    /// Rejects the matching pending request, or degrades to an error event.
    async fn route_error(&self, message: ServerMessage) {
        let error = MailboxError::Server {
            code: message.data.code,
            name: message.error_name().unwrap_or("unknown").to_string(),
        };

        let handled = {
            let mut state = self.state.write().await;
            state.pending.reject(&message.channel, error)
        };

        if let Some(unclaimed) = handled.err() {
            tracing::warn!(
                "Server error on channel '{}' with no pending request: {}",
                message.channel,
                unclaimed
            );
            self.events.emit(&ClientEvent::Error(Arc::new(unclaimed)));
        }
    }

    /// Resolves the matching pending request, or broadcasts a passive data
    /// event.
    async fn route_data(&self, message: ServerMessage) {
        let handled = {
            let mut state = self.state.write().await;
            state
                .pending
                .resolve(&message.channel, message.data.response.clone())
        };

        if !handled {
            tracing::debug!("Passive data frame on channel '{}'", message.channel);
            self.events.emit(&ClientEvent::Data {
                channel: message.channel,
                payload: message.data.response,
            });
        }
    }
}

fn disconnect_reason(response: &Value) -> String {
    response
        .get("reason")
        .or_else(|| response.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("server requested disconnect")
        .to_string()
}
