// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entry kinds stored by the provider and consumer engines.

use super::{CacheEntry, CacheKind, MergeResult};
use crate::types::{
    AccessPolicy, ChannelId, ConsumerId, MessageId, ProviderId, ProviderState, SyncType, Topic,
    TopicState,
};
use crate::wire::Connection;

// ============================================================================
// Provider side
// ============================================================================

/// One consumer's observe registrations on the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRecord {
    pub consumer_id: ConsumerId,
    pub message_channel: ChannelId,
    pub sync_channel: ChannelId,
    pub remote_message_channel: ChannelId,
    pub remote_sync_channel: ChannelId,
    /// Shared by all four channels; only accept/deny changes it.
    pub accepted: bool,
}

impl SubscriberRecord {
    #[must_use]
    pub fn new(consumer_id: ConsumerId) -> Self {
        Self {
            consumer_id,
            message_channel: ChannelId::NONE,
            sync_channel: ChannelId::NONE,
            remote_message_channel: ChannelId::NONE,
            remote_sync_channel: ChannelId::NONE,
            accepted: false,
        }
    }

    /// True if any of the four channels equals `channel`.
    #[must_use]
    pub fn owns_channel(&self, channel: ChannelId) -> bool {
        channel.is_set()
            && [
                self.message_channel,
                self.sync_channel,
                self.remote_message_channel,
                self.remote_sync_channel,
            ]
            .contains(&channel)
    }

    /// Local then remote message channels that are set.
    pub fn message_channels(&self) -> impl Iterator<Item = ChannelId> {
        [self.message_channel, self.remote_message_channel]
            .into_iter()
            .filter(|c| c.is_set())
    }

    /// Local then remote sync channels that are set.
    pub fn sync_channels(&self) -> impl Iterator<Item = ChannelId> {
        [self.sync_channel, self.remote_sync_channel]
            .into_iter()
            .filter(|c| c.is_set())
    }
}

impl CacheEntry for SubscriberRecord {
    type Key = ConsumerId;
    const KIND: CacheKind = CacheKind::Subscriber;

    fn key(&self) -> ConsumerId {
        self.consumer_id
    }

    /// Non-zero incoming channels overwrite the matching slot.
    fn merge(&mut self, incoming: Self) -> MergeResult {
        let mut changed = false;
        for (slot, value) in [
            (&mut self.message_channel, incoming.message_channel),
            (&mut self.sync_channel, incoming.sync_channel),
            (&mut self.remote_message_channel, incoming.remote_message_channel),
            (&mut self.remote_sync_channel, incoming.remote_sync_channel),
        ] {
            if value.is_set() && *slot != value {
                *slot = value;
                changed = true;
            }
        }
        if changed {
            MergeResult::Merged
        } else {
            MergeResult::Unchanged
        }
    }
}

/// Topic offered by the provider application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTopic {
    pub name: String,
    pub state: TopicState,
}

impl RegisteredTopic {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TopicState::Unsubscribed,
        }
    }

    #[must_use]
    pub fn to_topic(&self) -> Topic {
        Topic::new(self.name.clone(), self.state)
    }
}

impl CacheEntry for RegisteredTopic {
    type Key = String;
    const KIND: CacheKind = CacheKind::RegisteredTopic;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// A consumer's opt-in to one registered topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSelection {
    pub consumer_id: ConsumerId,
    pub topic_name: String,
    pub state: TopicState,
}

impl TopicSelection {
    #[must_use]
    pub fn subscribed(consumer_id: ConsumerId, topic_name: impl Into<String>) -> Self {
        Self {
            consumer_id,
            topic_name: topic_name.into(),
            state: TopicState::Subscribed,
        }
    }
}

impl CacheEntry for TopicSelection {
    type Key = (ConsumerId, String);
    const KIND: CacheKind = CacheKind::ConsumerTopic;

    fn key(&self) -> (ConsumerId, String) {
        (self.consumer_id, self.topic_name.clone())
    }
}

// ============================================================================
// Consumer side
// ============================================================================

/// Last known read/dismiss state of a received message.
///
/// Providers number their messages independently, so the key carries the
/// sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSyncEntry {
    pub provider_id: ProviderId,
    pub message_id: MessageId,
    pub state: SyncType,
}

impl CacheEntry for MessageSyncEntry {
    type Key = (ProviderId, MessageId);
    const KIND: CacheKind = CacheKind::MessageSync;

    fn key(&self) -> (ProviderId, MessageId) {
        (self.provider_id, self.message_id)
    }

    fn merge(&mut self, incoming: Self) -> MergeResult {
        if self.state == incoming.state {
            return MergeResult::Unchanged;
        }
        self.state = incoming.state;
        MergeResult::Merged
    }
}

/// Provider seen by consumer discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredProvider {
    pub provider_id: ProviderId,
    pub access_policy: AccessPolicy,
    /// Last state reported to the application.
    pub state: Option<ProviderState>,
    pub user_info: Option<String>,
    /// Topic catalog as last fetched from the provider.
    pub topics: Vec<Topic>,
    pub connections: Vec<Connection>,
}

impl DiscoveredProvider {
    #[must_use]
    pub fn new(provider_id: ProviderId, access_policy: AccessPolicy, connection: Connection) -> Self {
        Self {
            provider_id,
            access_policy,
            state: None,
            user_info: None,
            topics: Vec::new(),
            connections: vec![connection],
        }
    }

    #[must_use]
    pub fn has_address(&self, address: &str) -> bool {
        self.connections.iter().any(|c| c.address == address)
    }

    /// True if any path has a subscribe outstanding or established.
    #[must_use]
    pub fn is_subscribing(&self) -> bool {
        self.connections.iter().any(|c| c.is_subscribing)
    }

    /// Path used for requests: the subscribing one, else the first known.
    #[must_use]
    pub fn active_connection(&self) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.is_subscribing)
            .or_else(|| self.connections.first())
    }

    /// Mark every path as (not) subscribing.
    pub fn set_subscribing(&mut self, subscribing: bool) {
        for connection in &mut self.connections {
            connection.is_subscribing = subscribing;
        }
    }
}

impl CacheEntry for DiscoveredProvider {
    type Key = ProviderId;
    const KIND: CacheKind = CacheKind::DiscoveredProvider;

    fn key(&self) -> ProviderId {
        self.provider_id
    }

    /// Keep known connections, append new (address, transport) pairs.
    fn merge(&mut self, incoming: Self) -> MergeResult {
        let mut changed = false;
        if self.access_policy != incoming.access_policy {
            self.access_policy = incoming.access_policy;
            changed = true;
        }
        if incoming.user_info.is_some() && self.user_info != incoming.user_info {
            self.user_info = incoming.user_info;
            changed = true;
        }
        for connection in incoming.connections {
            let known = self
                .connections
                .iter()
                .any(|c| c.address == connection.address && c.transport == connection.transport);
            if !known {
                self.connections.push(connection);
                changed = true;
            }
        }
        if changed {
            MergeResult::Merged
        } else {
            MergeResult::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, WriteOutcome};
    use crate::error::Error;
    use crate::types::{SubscriptionPolicy, TransportType};

    fn with_channels(consumer_id: ConsumerId, msg: u32, sync: u32) -> SubscriberRecord {
        SubscriberRecord {
            message_channel: ChannelId(msg),
            sync_channel: ChannelId(sync),
            ..SubscriberRecord::new(consumer_id)
        }
    }

    #[test]
    fn test_subscriber_merge_keeps_unset_channels() {
        let consumer = ConsumerId::random();
        let mut store = CacheStore::new();
        store.write(with_channels(consumer, 7, 0)).unwrap();
        store.write(with_channels(consumer, 0, 9)).unwrap();

        let record = store.read(&consumer).unwrap();
        assert_eq!(record.message_channel, ChannelId(7));
        assert_eq!(record.sync_channel, ChannelId(9));
        assert!(!record.accepted);
    }

    #[test]
    fn test_subscriber_merge_never_touches_accepted() {
        let consumer = ConsumerId::random();
        let mut store = CacheStore::new();
        store.write(with_channels(consumer, 7, 0)).unwrap();
        store.update(&consumer, |r| r.accepted = true);

        let mut incoming = with_channels(consumer, 8, 0);
        incoming.accepted = false;
        store.write(incoming).unwrap();

        let record = store.read(&consumer).unwrap();
        assert!(record.accepted);
        assert_eq!(record.message_channel, ChannelId(8));
    }

    #[test]
    fn test_subscriber_merge_idempotent() {
        let consumer = ConsumerId::random();
        let mut once = CacheStore::new();
        once.write(with_channels(consumer, 3, 4)).unwrap();

        let mut twice = CacheStore::new();
        twice.write(with_channels(consumer, 3, 4)).unwrap();
        let outcome = twice.write(with_channels(consumer, 3, 4)).unwrap();

        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert_eq!(once.read(&consumer), twice.read(&consumer));
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn test_owns_channel_checks_all_slots() {
        let mut record = SubscriberRecord::new(ConsumerId::random());
        record.remote_sync_channel = ChannelId(44);
        assert!(record.owns_channel(ChannelId(44)));
        assert!(!record.owns_channel(ChannelId(45)));
        assert!(!record.owns_channel(ChannelId::NONE));
        assert_eq!(record.sync_channels().collect::<Vec<_>>(), [ChannelId(44)]);
        assert_eq!(record.message_channels().count(), 0);
    }

    #[test]
    fn test_unique_kinds_hold_at_most_one_entry_per_key() {
        let names = ["weather", "sports", "news", "traffic"];
        let consumers = [ConsumerId::random(), ConsumerId::random()];
        let mut topics = CacheStore::new();
        let mut selections = CacheStore::new();

        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..500 {
            let name = names[rng.usize(..names.len())];
            let consumer = consumers[rng.usize(..consumers.len())];
            match rng.u8(..4) {
                0 => {
                    let _ = topics.write(RegisteredTopic::new(name));
                }
                1 => {
                    topics.delete(name);
                }
                2 => {
                    let _ = selections.write(TopicSelection::subscribed(consumer, name));
                }
                _ => {
                    selections.delete(&(consumer, name.to_string()));
                }
            }

            for name in names {
                assert!(topics.iter().filter(|t| t.name == name).count() <= 1);
                for consumer in consumers {
                    let count = selections
                        .iter()
                        .filter(|s| s.consumer_id == consumer && s.topic_name == name)
                        .count();
                    assert!(count <= 1);
                }
            }
        }
    }

    #[test]
    fn test_duplicate_selection_rejected() {
        let consumer = ConsumerId::random();
        let mut store = CacheStore::new();
        store.write(TopicSelection::subscribed(consumer, "weather")).unwrap();
        let err = store
            .write(TopicSelection::subscribed(consumer, "weather"))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyPresent { .. }));

        // Same topic for another consumer is a different key.
        store
            .write(TopicSelection::subscribed(ConsumerId::random(), "weather"))
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_message_sync_merge_only_on_change() {
        let mut store = CacheStore::new();
        let provider = ProviderId::random();
        let entry = MessageSyncEntry {
            provider_id: provider,
            message_id: MessageId(20),
            state: SyncType::Unread,
        };
        store.write(entry).unwrap();
        assert_eq!(store.write(entry).unwrap(), WriteOutcome::Unchanged);

        let read = MessageSyncEntry {
            state: SyncType::Read,
            ..entry
        };
        assert_eq!(store.write(read).unwrap(), WriteOutcome::Merged);
        assert_eq!(
            store.read(&(provider, MessageId(20))).unwrap().state,
            SyncType::Read
        );

        // Same id from another provider is a separate message.
        let other = MessageSyncEntry {
            provider_id: ProviderId::random(),
            ..entry
        };
        assert_eq!(store.write(other).unwrap(), WriteOutcome::Inserted);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_provider_merge_appends_new_transports() {
        let provider = ProviderId::random();
        let policy = SubscriptionPolicy::ProviderDecides;
        let mut store = CacheStore::new();

        let mut first = DiscoveredProvider::new(
            provider,
            policy,
            Connection::new("10.0.0.2:5683", TransportType::Ip),
        );
        first.set_subscribing(true);
        store.write(first).unwrap();

        let same = DiscoveredProvider::new(
            provider,
            policy,
            Connection::new("10.0.0.2:5683", TransportType::Ip),
        );
        assert_eq!(store.write(same).unwrap(), WriteOutcome::Unchanged);

        let ble = DiscoveredProvider::new(
            provider,
            policy,
            Connection::new("AA:BB:CC:DD:EE:FF", TransportType::Ble),
        );
        assert_eq!(store.write(ble).unwrap(), WriteOutcome::Merged);

        let record = store.read(&provider).unwrap();
        assert_eq!(record.connections.len(), 2);
        // The existing connection kept its subscribing flag.
        assert!(record.connections[0].is_subscribing);
        assert!(!record.connections[1].is_subscribing);
        assert!(record.has_address("AA:BB:CC:DD:EE:FF"));
        assert_eq!(
            record.active_connection().map(|c| c.address.as_str()),
            Some("10.0.0.2:5683")
        );
    }
}
