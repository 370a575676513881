// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data types shared by the provider and consumer engines.

mod ids;
mod message;
mod topic;

pub use ids::{ChannelId, ConsumerId, MessageId, ProviderId, RESERVED_MESSAGE_ID};
pub use message::{ControlCode, MediaContents, Message, MessageType, SyncInfo, SyncType};
pub use topic::{
    AccessPolicy, ProviderState, SubscriptionPolicy, Topic, TopicFilterMode, TopicState,
    TransportType,
};
