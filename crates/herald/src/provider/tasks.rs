// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provider task variants, one enum per scheduler.

use crate::error::Result;
use crate::scheduler::{Responder, SchedulerId, Task, TaskQueue};
use crate::types::{ChannelId, ConsumerId, Message, SyncInfo, Topic};
use crate::wire::{RequestHandle, SubscriptionRequest};
use std::sync::Arc;

/// Presence announcements.
#[derive(Debug)]
pub enum DiscoveryTask {
    /// Publish the provider advert (start, network up).
    Announce,
}

#[derive(Debug)]
pub enum SubscriptionTask {
    /// Observe registration on the message or sync resource.
    ReceiveSubscription(SubscriptionRequest),
    /// Application (or auto-accept) decision for a consumer.
    Accept { consumer_id: ConsumerId, accepted: bool },
    /// Observe cancelled for a channel.
    Unsubscribe { channel: ChannelId },
}

#[derive(Debug)]
pub enum TopicTask {
    Register {
        name: String,
        reply: Responder<Result<()>>,
    },
    Unregister {
        name: String,
        reply: Responder<Result<()>>,
    },
    /// A consumer replaced its selection over the wire.
    PostSelection {
        consumer_id: ConsumerId,
        topics: Vec<Topic>,
    },
    /// The application changed one consumer's selection.
    SetConsumerTopic {
        consumer_id: ConsumerId,
        name: String,
        selected: bool,
        reply: Responder<Result<()>>,
    },
    QueryRegistered {
        reply: Responder<Vec<Topic>>,
    },
    QuerySelections {
        consumer_id: ConsumerId,
        reply: Responder<Vec<Topic>>,
    },
    /// Wire GET of the topic list, answered through the resource layer.
    Request {
        consumer_id: Option<ConsumerId>,
        request: RequestHandle,
    },
}

#[derive(Debug)]
pub enum NotificationTask {
    SendMessage {
        message: Message,
        reply: Responder<Result<()>>,
    },
    SendSync {
        sync: SyncInfo,
        reply: Responder<Result<()>>,
    },
    /// ALLOW or DENY to one consumer's message channels.
    SendPolicy { consumer_id: ConsumerId, accepted: bool },
    /// TOPIC control message; `None` broadcasts to every accepted subscriber.
    TopicChanged { consumer_id: Option<ConsumerId> },
    /// Sync posted by a consumer, re-broadcast then surfaced to the app.
    ReceivedSync(SyncInfo),
}

#[derive(Debug)]
pub enum CallbackTask {
    SubscribeRequest { consumer_id: ConsumerId },
    SyncReceived(SyncInfo),
}

impl Task for DiscoveryTask {
    fn kind(&self) -> &'static str {
        match self {
            DiscoveryTask::Announce => "Announce",
        }
    }
}

impl Task for SubscriptionTask {
    fn kind(&self) -> &'static str {
        match self {
            SubscriptionTask::ReceiveSubscription(_) => "ReceiveSubscription",
            SubscriptionTask::Accept { .. } => "Accept",
            SubscriptionTask::Unsubscribe { .. } => "Unsubscribe",
        }
    }
}

impl Task for TopicTask {
    fn kind(&self) -> &'static str {
        match self {
            TopicTask::Register { .. } => "Register",
            TopicTask::Unregister { .. } => "Unregister",
            TopicTask::PostSelection { .. } => "PostSelection",
            TopicTask::SetConsumerTopic { .. } => "SetConsumerTopic",
            TopicTask::QueryRegistered { .. } => "QueryRegistered",
            TopicTask::QuerySelections { .. } => "QuerySelections",
            TopicTask::Request { .. } => "Request",
        }
    }
}

impl Task for NotificationTask {
    fn kind(&self) -> &'static str {
        match self {
            NotificationTask::SendMessage { .. } => "SendMessage",
            NotificationTask::SendSync { .. } => "SendSync",
            NotificationTask::SendPolicy { .. } => "SendPolicy",
            NotificationTask::TopicChanged { .. } => "TopicChanged",
            NotificationTask::ReceivedSync(_) => "ReceivedSync",
        }
    }
}

impl Task for CallbackTask {
    fn kind(&self) -> &'static str {
        match self {
            CallbackTask::SubscribeRequest { .. } => "SubscribeRequest",
            CallbackTask::SyncReceived(_) => "SyncReceived",
        }
    }
}

/// Producer handles to every provider queue.
pub(crate) struct Dispatcher {
    pub discovery: Arc<TaskQueue<DiscoveryTask>>,
    pub subscription: Arc<TaskQueue<SubscriptionTask>>,
    pub notification: Arc<TaskQueue<NotificationTask>>,
    pub callback: Arc<TaskQueue<CallbackTask>>,
    pub topic: Arc<TaskQueue<TopicTask>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            discovery: Arc::new(TaskQueue::new(SchedulerId::Discovery)),
            subscription: Arc::new(TaskQueue::new(SchedulerId::Subscription)),
            notification: Arc::new(TaskQueue::new(SchedulerId::Notification)),
            callback: Arc::new(TaskQueue::new(SchedulerId::CallbackResponse)),
            topic: Arc::new(TaskQueue::new(SchedulerId::Topic)),
        }
    }
}
