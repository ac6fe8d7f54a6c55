//! Shared connection state.
//!
//! Everything in this module is touched from both the reader task and
//! concurrently spawned handler tasks, so each structure carries its own
//! synchronization.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// The connection lifecycle.
///
/// ```text
/// Disconnected -> Connecting -> Authenticating -> Active
///      ^                                            |
///      | stop()                              failure signal
///      +------ Active <- Reconnecting <- Failed <---+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport; the initial and terminal state.
    Disconnected,
    /// Opening the transport.
    Connecting,
    /// Transport open; sending PASS/NICK/USER.
    Authenticating,
    /// Registered and listening.
    Active,
    /// The connection is believed down.
    Failed,
    /// Retrying the connect sequence.
    Reconnecting,
}

/// The ordered set of channels the client intends to be joined to.
///
/// Source of truth for rejoin-after-reconnect. Inserts are idempotent and
/// preserve join order; removals of non-members are silent no-ops.
#[derive(Default)]
pub(crate) struct ChannelSet {
    inner: Mutex<Vec<String>>,
}

impl ChannelSet {
    /// Record a membership intent. Returns false if already a member.
    pub(crate) fn insert(&self, channel: &str) -> bool {
        let mut list = self.inner.lock();
        if list.iter().any(|c| c == channel) {
            return false;
        }
        list.push(channel.to_owned());
        true
    }

    /// Drop a membership intent. Returns false if not a member.
    pub(crate) fn remove(&self, channel: &str) -> bool {
        let mut list = self.inner.lock();
        match list.iter().position(|c| c == channel) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<String> {
        self.inner.lock().clone()
    }
}

/// A cached channel topic and when it was last updated.
#[derive(Clone, Debug)]
pub(crate) struct TopicEntry {
    /// `None` until a topic reply or push has arrived.
    pub topic: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Topic cache with wakeups for blocked `topic()` callers.
///
/// Entries are created lazily with an unset sentinel; `wait_for_update`
/// resolves once the entry's timestamp moves past the caller's baseline.
#[derive(Default)]
pub(crate) struct TopicCache {
    entries: DashMap<String, TopicEntry>,
    changed: Notify,
}

impl TopicCache {
    /// Ensure an entry exists and return the caller's baseline timestamp.
    pub(crate) fn ensure_pending(&self, channel: &str) -> DateTime<Utc> {
        self.entries
            .entry(channel.to_owned())
            .or_insert_with(|| TopicEntry {
                topic: None,
                updated_at: Utc::now(),
            })
            .updated_at
    }

    /// Record a topic update and wake any blocked callers.
    pub(crate) fn update(&self, channel: &str, topic: String) {
        self.entries.insert(
            channel.to_owned(),
            TopicEntry {
                topic: Some(topic),
                updated_at: Utc::now(),
            },
        );
        self.changed.notify_waiters();
    }

    /// The currently cached topic, if any reply has arrived.
    pub(crate) fn get(&self, channel: &str) -> Option<String> {
        self.entries.get(channel).and_then(|e| e.topic.clone())
    }

    /// Block until the entry for `channel` is updated past `baseline`.
    ///
    /// There is intentionally no timeout; callers that need one wrap this
    /// in `tokio::time::timeout`.
    pub(crate) async fn wait_for_update(
        &self,
        channel: &str,
        baseline: DateTime<Utc>,
    ) -> String {
        loop {
            // Register for the next wakeup before checking, so an update
            // landing between the check and the await is not missed.
            let notified = self.changed.notified();
            if let Some(entry) = self.entries.get(channel) {
                if entry.updated_at != baseline {
                    return entry.topic.clone().unwrap_or_default();
                }
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_channel_insert_is_idempotent() {
        let channels = ChannelSet::default();
        assert!(channels.insert("#x"));
        assert!(!channels.insert("#x"));
        assert_eq!(channels.snapshot(), vec!["#x".to_string()]);
    }

    #[test]
    fn test_channel_order_preserved() {
        let channels = ChannelSet::default();
        channels.insert("#b");
        channels.insert("#a");
        assert_eq!(
            channels.snapshot(),
            vec!["#b".to_string(), "#a".to_string()]
        );
    }

    #[test]
    fn test_remove_non_member_is_noop() {
        let channels = ChannelSet::default();
        channels.insert("#x");
        assert!(!channels.remove("#y"));
        assert_eq!(channels.snapshot(), vec!["#x".to_string()]);
    }

    #[tokio::test]
    async fn test_topic_wait_resolves_on_update() {
        let cache = Arc::new(TopicCache::default());
        let baseline = cache.ensure_pending("#x");

        let waiter = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.wait_for_update("#x", baseline).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.update("#x", "fresh topic".into());

        let topic = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter resolved")
            .unwrap();
        assert_eq!(topic, "fresh topic");
    }

    #[tokio::test]
    async fn test_topic_wait_blocks_without_update() {
        let cache = TopicCache::default();
        let baseline = cache.ensure_pending("#x");

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            cache.wait_for_update("#x", baseline),
        )
        .await;
        assert!(blocked.is_err());
    }

    #[test]
    fn test_topic_get_before_reply_is_none() {
        let cache = TopicCache::default();
        cache.ensure_pending("#x");
        assert_eq!(cache.get("#x"), None);
    }
}
