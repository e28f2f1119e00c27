use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::types::MailboxError;

/// Outcome delivered to a waiting caller.
pub type ReplyResult = std::result::Result<Value, MailboxError>;

struct PendingEntry {
    seq: u64,
    tx: oneshot::Sender<ReplyResult>,
}

/// Correlation table for in-flight subscribe/fetch requests.
///
/// Entries are keyed solely by channel name, matching the wire protocol: a
/// reply carries no request identifier, only its channel. Registering a
/// second request on a channel overwrites the first entry; the displaced
/// waiter is woken with [`MailboxError::RequestSuperseded`]. The sequence
/// number lets a timed-out caller remove its own entry without clobbering a
/// successor's.
#[derive(Default)]
pub struct PendingRequests {
    entries: HashMap<String, PendingEntry>,
    next_seq: u64,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending request on `channel`, displacing any prior entry.
    pub fn register(&mut self, channel: &str) -> (u64, oneshot::Receiver<ReplyResult>) {
        self.next_seq += 1;
        let seq = self.next_seq;
        let (tx, rx) = oneshot::channel();

        if let Some(prior) = self.entries.insert(channel.to_string(), PendingEntry { seq, tx }) {
            tracing::warn!(
                "Replacing in-flight request on channel '{}'; the earlier caller is superseded",
                channel
            );
            let _ = prior
                .tx
                .send(Err(MailboxError::RequestSuperseded(channel.to_string())));
        }

        (seq, rx)
    }

    /// Delivers a successful reply; returns false when nothing was pending.
    pub fn resolve(&mut self, channel: &str, response: Value) -> bool {
        match self.entries.remove(channel) {
            Some(entry) => {
                let _ = entry.tx.send(Ok(response));
                true
            }
            None => false,
        }
    }

    /// Delivers an error reply. When nothing is pending the error is handed
    /// back to the caller for passive surfacing.
    pub fn reject(
        &mut self,
        channel: &str,
        error: MailboxError,
    ) -> std::result::Result<(), MailboxError> {
        match self.entries.remove(channel) {
            Some(entry) => {
                let _ = entry.tx.send(Err(error));
                Ok(())
            }
            None => Err(error),
        }
    }

    /// Removes an entry only if it still belongs to the caller identified by
    /// `seq` (a timed-out request must not clear its successor).
    pub fn remove_if_seq(&mut self, channel: &str, seq: u64) -> bool {
        if self.entries.get(channel).map(|e| e.seq) == Some(seq) {
            self.entries.remove(channel);
            true
        } else {
            false
        }
    }

    /// Rejects every pending request with a uniform error.
    pub fn reject_all<F>(&mut self, make_error: F)
    where
        F: Fn() -> MailboxError,
    {
        for (channel, entry) in self.entries.drain() {
            tracing::debug!("Rejecting pending request on channel '{}'", channel);
            let _ = entry.tx.send(Err(make_error()));
        }
    }

    pub fn is_pending(&self, channel: &str) -> bool {
        self.entries.contains_key(channel)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
