use std::time::SystemTime;

use serde_json::Value;

/// One live channel subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionState {
    pub channel: String,
    /// Caller-supplied parameters, stored unmerged so replay picks up the
    /// credentials current at replay time.
    pub params: Value,
    pub active: bool,
    pub subscribed_at: SystemTime,
}

/// Tracks which channels are actively subscribed and their parameters.
///
/// Insertion-ordered with at most one entry per channel; replay after a
/// reconnect walks a stable snapshot in this order.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<SubscriptionState>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful subscribe. An existing entry keeps its position
    /// and is overwritten with fresh params.
    pub fn upsert(&mut self, channel: &str, params: Value) {
        let now = SystemTime::now();
        match self.entries.iter_mut().find(|e| e.channel == channel) {
            Some(entry) => {
                entry.params = params;
                entry.active = true;
                entry.subscribed_at = now;
            }
            None => self.entries.push(SubscriptionState {
                channel: channel.to_string(),
                params,
                active: true,
                subscribed_at: now,
            }),
        }
    }

    pub fn remove(&mut self, channel: &str) -> Option<SubscriptionState> {
        let index = self.entries.iter().position(|e| e.channel == channel)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.entries.iter().any(|e| e.channel == channel)
    }

    /// Marks every entry inactive (the connection carrying them is gone).
    pub fn deactivate_all(&mut self) {
        for entry in &mut self.entries {
            entry.active = false;
        }
    }

    /// Stable snapshot for sequential replay.
    pub fn snapshot(&self) -> Vec<SubscriptionState> {
        self.entries.clone()
    }

    pub fn channels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.channel.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_keeps_single_entry_per_channel() {
        let mut registry = SubscriptionRegistry::new();
        registry.upsert("messages", json!({"mailboxId": "inbox"}));
        registry.upsert("messages", json!({"mailboxId": "archive"}));

        assert_eq!(registry.len(), 1);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].params, json!({"mailboxId": "archive"}));
        assert!(snapshot[0].active);
    }

    #[test]
    fn test_snapshot_preserves_insertion_order() {
        let mut registry = SubscriptionRegistry::new();
        registry.upsert("mailboxes", json!({}));
        registry.upsert("messages", json!({}));
        registry.upsert("settings", json!({}));
        // refreshing an early entry must not move it
        registry.upsert("mailboxes", json!({"refreshed": true}));

        assert_eq!(registry.channels(), vec!["mailboxes", "messages", "settings"]);
    }

    #[test]
    fn test_remove_unknown_channel_is_none() {
        let mut registry = SubscriptionRegistry::new();
        assert!(registry.remove("filters").is_none());
    }

    #[test]
    fn test_remove_returns_entry() {
        let mut registry = SubscriptionRegistry::new();
        registry.upsert("filters", json!({}));
        let removed = registry.remove("filters").unwrap();
        assert_eq!(removed.channel, "filters");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_deactivate_all() {
        let mut registry = SubscriptionRegistry::new();
        registry.upsert("mailboxes", json!({}));
        registry.upsert("messages", json!({}));
        registry.deactivate_all();
        assert!(registry.snapshot().iter().all(|e| !e.active));
    }
}
