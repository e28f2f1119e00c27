use tokio::task::JoinHandle;

use super::pending::PendingRequests;
use super::subscriptions::SubscriptionRegistry;
use crate::infrastructure::{Backoff, TaskManager};

/// Credentials carried on behalf of the caller; captured at `connect()`,
/// retained only for reconnection replay, cleared on disconnect.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    pub access_token: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Reconnection bookkeeping. `attempt` resets to 0 on every successful
/// connection.
#[derive(Debug, Clone)]
pub struct ReconnectContext {
    pub attempt: u32,
    pub backoff: Backoff,
    /// 0 = unlimited
    pub max_attempts: u32,
}

impl ReconnectContext {
    pub fn new(backoff: Backoff, max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            backoff,
            max_attempts,
        }
    }

    /// Delay before the next attempt, from the pre-increment attempt count.
    pub fn next_delay(&self) -> std::time::Duration {
        self.backoff.delay_for(self.attempt)
    }

    pub fn exhausted(&self) -> bool {
        self.max_attempts != 0 && self.attempt >= self.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Consolidated mutable state for the client, behind one lock.
pub struct ClientState {
    pub credentials: Option<Credentials>,
    pub subscriptions: SubscriptionRegistry,
    pub pending: PendingRequests,
    pub reconnect: ReconnectContext,
    /// Pending backoff sleep + reattempt, if one is scheduled
    pub reconnect_task: Option<JoinHandle<()>>,
    /// Background read tasks
    pub task_manager: TaskManager,
    /// Identifies the current transport session; closure reports from a
    /// superseded session are ignored
    pub epoch: u64,
}

impl ClientState {
    pub fn new(reconnect: ReconnectContext) -> Self {
        Self {
            credentials: None,
            subscriptions: SubscriptionRegistry::new(),
            pending: PendingRequests::new(),
            reconnect,
            reconnect_task: None,
            task_manager: TaskManager::new(),
            epoch: 0,
        }
    }

    /// Cancels a scheduled reconnection attempt, if any.
    pub fn cancel_reconnect(&mut self) {
        if let Some(handle) = self.reconnect_task.take() {
            handle.abort();
        }
    }
}
