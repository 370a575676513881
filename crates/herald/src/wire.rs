// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boundary with the wire/resource layer.
//!
//! The engine never encodes bytes or touches sockets. Outbound traffic goes
//! through [`ResourceLayer`] (provider) and [`ConsumerLink`] (consumer); inbound
//! traffic arrives as typed tasks built from the structs in this module.

use crate::error::Result;
use crate::types::{
    AccessPolicy, ChannelId, ConsumerId, Message, ProviderId, SyncInfo, Topic, TransportType,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable resources exposed by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Notification messages (and ALLOW/DENY/TOPIC control messages).
    Message,
    /// Read/dismiss sync records.
    Sync,
    /// Topic catalog.
    Topic,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Message => "message",
            ResourceKind::Sync => "sync",
            ResourceKind::Topic => "topic",
        };
        f.write_str(name)
    }
}

/// Opaque handle of an inbound request awaiting a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestHandle(pub u64);

/// Outcome attached to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Ok,
    NotFound,
    Error,
}

/// Structured payload handed to the wire layer for encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Message(Message),
    Sync(SyncInfo),
    Topics {
        /// Set when the list is one consumer's view of the catalog.
        consumer_id: Option<ConsumerId>,
        topics: Vec<Topic>,
    },
}

impl Payload {
    /// Resource the payload belongs to.
    #[must_use]
    pub fn resource(&self) -> ResourceKind {
        match self {
            Payload::Message(_) => ResourceKind::Message,
            Payload::Sync(_) => ResourceKind::Sync,
            Payload::Topics { .. } => ResourceKind::Topic,
        }
    }
}

/// Outbound side of the provider's resource layer.
pub trait ResourceLayer: Send + Sync {
    /// Push `payload` to every observer registered under `channels`.
    fn notify_recipients(
        &self,
        resource: ResourceKind,
        channels: &[ChannelId],
        payload: &Payload,
    ) -> Result<()>;

    /// Answer a pending inbound request.
    fn send_response(
        &self,
        request: RequestHandle,
        payload: Option<&Payload>,
        status: ResponseStatus,
    ) -> Result<()>;

    /// Announce the provider on the network. Optional.
    fn publish_presence(&self, presence: &Presence) -> Result<()> {
        let _ = presence;
        Ok(())
    }
}

/// What a provider announces about itself; the wire layer adds addressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub provider_id: ProviderId,
    pub access_policy: AccessPolicy,
    pub user_info: Option<String>,
    /// Resources require a secured transport.
    pub secured: bool,
}

/// Observe registration received by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub consumer_id: ConsumerId,
    pub channel: ChannelId,
    /// `Message` or `Sync`; other kinds are ignored.
    pub resource: ResourceKind,
    /// Arrived through a remote relay rather than the local network.
    pub remote: bool,
}

impl SubscriptionRequest {
    #[must_use]
    pub fn local(consumer_id: ConsumerId, channel: ChannelId, resource: ResourceKind) -> Self {
        Self {
            consumer_id,
            channel,
            resource,
            remote: false,
        }
    }

    #[must_use]
    pub fn remote(consumer_id: ConsumerId, channel: ChannelId, resource: ResourceKind) -> Self {
        Self {
            remote: true,
            ..Self::local(consumer_id, channel, resource)
        }
    }
}

/// Presence response describing a reachable provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAdvert {
    pub provider_id: ProviderId,
    pub address: String,
    pub transport: TransportType,
    pub access_policy: AccessPolicy,
    #[serde(default)]
    pub user_info: Option<String>,
}

/// One network path to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub address: String,
    pub transport: TransportType,
    /// A subscribe request is outstanding or established on this path.
    pub is_subscribing: bool,
}

impl Connection {
    #[must_use]
    pub fn new(address: impl Into<String>, transport: TransportType) -> Self {
        Self {
            address: address.into(),
            transport,
            is_subscribing: false,
        }
    }
}

/// Outbound side of the consumer's wire layer.
///
/// `fetch_topics` is fire-and-forget; the provider's answer comes back
/// through `Consumer::handle_topic_list`.
pub trait ConsumerLink: Send + Sync {
    fn request_subscribe(&self, provider_id: ProviderId, connection: &Connection) -> Result<()>;

    fn request_unsubscribe(&self, provider_id: ProviderId, connection: &Connection) -> Result<()>;

    fn send_sync(&self, provider_id: ProviderId, connection: &Connection, sync: &SyncInfo)
        -> Result<()>;

    fn post_topics(&self, provider_id: ProviderId, connection: &Connection, topics: &[Topic])
        -> Result<()>;

    fn fetch_topics(&self, provider_id: ProviderId, connection: &Connection) -> Result<()>;

    /// Re-run presence discovery.
    fn rescan(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageId, SyncType};

    #[test]
    fn test_payload_resource() {
        let msg = Payload::Message(Message::new(MessageId(12)));
        assert_eq!(msg.resource(), ResourceKind::Message);

        let sync = Payload::Sync(SyncInfo::new(MessageId(12), None, SyncType::Read));
        assert_eq!(sync.resource(), ResourceKind::Sync);

        let topics = Payload::Topics {
            consumer_id: None,
            topics: vec![Topic::unsubscribed("weather")],
        };
        assert_eq!(topics.resource(), ResourceKind::Topic);
    }

    #[test]
    fn test_payload_is_tagged() {
        let payload = Payload::Topics {
            consumer_id: None,
            topics: vec![Topic::subscribed("sports")],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "topics");
        assert_eq!(json["topics"][0]["name"], "sports");
    }

    #[test]
    fn test_remote_request() {
        let consumer = ConsumerId::random();
        let req = SubscriptionRequest::remote(consumer, ChannelId(4), ResourceKind::Sync);
        assert!(req.remote);
        assert_eq!(req.channel, ChannelId(4));
    }
}
