// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consumer task variants, one enum per scheduler.

use crate::cache::DiscoveredProvider;
use crate::error::Result;
use crate::scheduler::{Responder, SchedulerId, Task, TaskQueue};
use crate::types::{ControlCode, Message, ProviderId, ProviderState, SyncInfo, Topic};
use crate::wire::ProviderAdvert;
use std::sync::Arc;

#[derive(Debug)]
pub enum DiscoveryTask {
    ProviderDiscovered(ProviderAdvert),
    ProviderLost { provider_id: ProviderId },
    /// ALLOW, DENY or TOPIC control message from a provider.
    ProviderChanged {
        provider_id: ProviderId,
        code: ControlCode,
    },
    TopicListReceived {
        provider_id: ProviderId,
        topics: Vec<Topic>,
    },
    QueryTopics {
        provider_id: ProviderId,
        reply: Responder<Result<Vec<Topic>>>,
    },
    Rescan,
}

#[derive(Debug)]
pub enum SubscriptionTask {
    Subscribe { provider_id: ProviderId },
    Unsubscribe { provider_id: ProviderId },
    SendSync { provider_id: ProviderId, sync: SyncInfo },
    PostTopics {
        provider_id: ProviderId,
        topics: Vec<Topic>,
    },
}

/// Inbound traffic on the message and sync resources.
#[derive(Debug)]
pub enum NotificationTask {
    MessageReceived(Message),
    SyncReceived(SyncInfo),
}

#[derive(Debug)]
pub enum CallbackTask {
    ProviderDiscovered(DiscoveredProvider),
    ProviderStateChanged {
        provider_id: ProviderId,
        state: ProviderState,
    },
    MessageReceived(Message),
    SyncReceived(SyncInfo),
}

impl Task for DiscoveryTask {
    fn kind(&self) -> &'static str {
        match self {
            DiscoveryTask::ProviderDiscovered(_) => "ProviderDiscovered",
            DiscoveryTask::ProviderLost { .. } => "ProviderLost",
            DiscoveryTask::ProviderChanged { .. } => "ProviderChanged",
            DiscoveryTask::TopicListReceived { .. } => "TopicListReceived",
            DiscoveryTask::QueryTopics { .. } => "QueryTopics",
            DiscoveryTask::Rescan => "Rescan",
        }
    }
}

impl Task for SubscriptionTask {
    fn kind(&self) -> &'static str {
        match self {
            SubscriptionTask::Subscribe { .. } => "Subscribe",
            SubscriptionTask::Unsubscribe { .. } => "Unsubscribe",
            SubscriptionTask::SendSync { .. } => "SendSync",
            SubscriptionTask::PostTopics { .. } => "PostTopics",
        }
    }
}

impl Task for NotificationTask {
    fn kind(&self) -> &'static str {
        match self {
            NotificationTask::MessageReceived(_) => "MessageReceived",
            NotificationTask::SyncReceived(_) => "SyncReceived",
        }
    }
}

impl Task for CallbackTask {
    fn kind(&self) -> &'static str {
        match self {
            CallbackTask::ProviderDiscovered(_) => "ProviderDiscovered",
            CallbackTask::ProviderStateChanged { .. } => "ProviderStateChanged",
            CallbackTask::MessageReceived(_) => "MessageReceived",
            CallbackTask::SyncReceived(_) => "SyncReceived",
        }
    }
}

/// Producer handles to every consumer queue.
pub(crate) struct Dispatcher {
    pub discovery: Arc<TaskQueue<DiscoveryTask>>,
    pub subscription: Arc<TaskQueue<SubscriptionTask>>,
    pub notification: Arc<TaskQueue<NotificationTask>>,
    pub callback: Arc<TaskQueue<CallbackTask>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            discovery: Arc::new(TaskQueue::new(SchedulerId::Discovery)),
            subscription: Arc::new(TaskQueue::new(SchedulerId::Subscription)),
            notification: Arc::new(TaskQueue::new(SchedulerId::Notification)),
            callback: Arc::new(TaskQueue::new(SchedulerId::CallbackResponse)),
        }
    }
}
