// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provider engine.
//!
//! A [`Provider`] owns five schedulers and the stores they share:
//!
//! | Scheduler    | Work                                              |
//! |--------------|---------------------------------------------------|
//! | discovery    | presence announcements                            |
//! | subscription | observe registrations, accept/deny, unsubscribe   |
//! | topic        | topic registry, consumer selections, topic GETs   |
//! | notification | message/sync fan-out, control messages            |
//! | callback     | `ProviderListener` calls                          |
//!
//! Application calls that need an answer (sending, topic registry) block on
//! a rendezvous until the owning worker replies or the configured timeout
//! expires.

mod callback;
mod context;
mod listener;
mod notification;
mod subscription;
mod tasks;
mod topic;

pub use listener::{ClosureProviderListener, NoopProviderListener, ProviderListener};

use crate::cache::SubscriberRecord;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::scheduler::{rendezvous, QueueSnapshot, Responder, Scheduler, SchedulerId, Task, TaskQueue};
use crate::types::{
    ChannelId, ConsumerId, Message, MessageId, ProviderId, SyncInfo, SyncType, Topic,
    RESERVED_MESSAGE_ID,
};
use crate::wire::{RequestHandle, ResourceLayer, SubscriptionRequest};
use callback::{CallbackWorker, DiscoveryWorker};
use context::ProviderContext;
use notification::NotificationWorker;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use subscription::SubscriptionWorker;
use tasks::{CallbackTask, DiscoveryTask, NotificationTask, SubscriptionTask, TopicTask};
use topic::TopicWorker;

/// Inbound wire event for a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// Observe registration on the message or sync resource.
    SubscribeRequest(SubscriptionRequest),
    /// Observe cancelled (or the observer went away) for a channel.
    ObserveCancelled { channel: ChannelId },
    /// A consumer posted a read/dismiss change.
    SyncPosted(SyncInfo),
    /// A consumer posted its topic selection.
    TopicsPosted {
        consumer_id: ConsumerId,
        topics: Vec<Topic>,
    },
    /// A consumer (or anonymous client) asked for the topic list.
    TopicQuery {
        consumer_id: Option<ConsumerId>,
        request: RequestHandle,
    },
    /// Network came (back) up; announce presence again.
    NetworkUp,
}

/// A running notification provider.
///
/// # Example
///
/// ```rust,no_run
/// use herald::{NoopProviderListener, Provider, ProviderConfig, ResourceLayer};
/// use std::sync::Arc;
///
/// fn run(layer: Arc<dyn ResourceLayer>) -> herald::Result<()> {
///     let provider = Provider::start(
///         ProviderConfig::default(),
///         layer,
///         Arc::new(NoopProviderListener),
///     )?;
///     provider.register_topic("weather")?;
///
///     let message = provider.create_message()?.with_title("Storm warning");
///     provider.send_message(message)?;
///
///     provider.stop();
///     Ok(())
/// }
/// ```
pub struct Provider {
    ctx: Arc<ProviderContext>,
    running: AtomicBool,
    next_message_id: AtomicU64,
    discovery: Scheduler<DiscoveryTask, DiscoveryWorker>,
    subscription: Scheduler<SubscriptionTask, SubscriptionWorker>,
    topic: Scheduler<TopicTask, TopicWorker>,
    notification: Scheduler<NotificationTask, NotificationWorker>,
    callback: Scheduler<CallbackTask, CallbackWorker>,
}

impl Provider {
    /// Start a provider with a fresh random identity.
    ///
    /// # Errors
    ///
    /// `Error::Config` if `config` is invalid, `Error::Io` if a worker thread
    /// cannot be spawned (already spawned workers are stopped again).
    pub fn start(
        config: ProviderConfig,
        layer: Arc<dyn ResourceLayer>,
        listener: Arc<dyn ProviderListener>,
    ) -> Result<Self> {
        Self::start_with_id(config, ProviderId::random(), layer, listener)
    }

    /// Start a provider with a known identity.
    pub fn start_with_id(
        config: ProviderConfig,
        provider_id: ProviderId,
        layer: Arc<dyn ResourceLayer>,
        listener: Arc<dyn ProviderListener>,
    ) -> Result<Self> {
        config.validate()?;
        if provider_id.is_nil() {
            return Err(Error::invalid("nil provider id"));
        }

        let ctx = Arc::new(ProviderContext::new(config, provider_id, layer, listener));
        let owner = ctx.config.name.clone();
        let queues = &ctx.queues;

        let discovery = Scheduler::with_queue(
            Arc::clone(&queues.discovery),
            &owner,
            DiscoveryWorker::new(Arc::clone(&ctx)),
        )?;
        let subscription = Scheduler::with_queue(
            Arc::clone(&queues.subscription),
            &owner,
            SubscriptionWorker::new(Arc::clone(&ctx)),
        )?;
        let topic = Scheduler::with_queue(
            Arc::clone(&queues.topic),
            &owner,
            TopicWorker::new(Arc::clone(&ctx)),
        )?;
        let notification = Scheduler::with_queue(
            Arc::clone(&queues.notification),
            &owner,
            NotificationWorker::new(Arc::clone(&ctx)),
        )?;
        let callback = Scheduler::with_queue(
            Arc::clone(&queues.callback),
            &owner,
            CallbackWorker::new(Arc::clone(&ctx)),
        )?;

        log::info!(
            "[Provider] '{}' started as {} (policy {:?})",
            owner,
            provider_id,
            ctx.config.policy
        );
        ctx.queues.discovery.push(DiscoveryTask::Announce);

        Ok(Self {
            ctx,
            running: AtomicBool::new(true),
            next_message_id: AtomicU64::new(RESERVED_MESSAGE_ID + 1),
            discovery,
            subscription,
            topic,
            notification,
            callback,
        })
    }

    /// Stop every worker and release all state. Idempotent.
    ///
    /// Blocked callers of this provider are released with `Error::NotRunning`.
    /// May be called from a `ProviderListener` callback: the callback worker
    /// is then detached rather than joined, and exits when the callback
    /// returns.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.discovery.stop();
        self.subscription.stop();
        self.topic.stop();
        self.notification.stop();
        self.callback.stop();
        self.ctx.clear();
        log::info!("[Provider] '{}' stopped", self.ctx.config.name);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn provider_id(&self) -> ProviderId {
        self.ctx.provider_id
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.ctx.config
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(Error::NotRunning)
        }
    }

    fn push<T: Task>(&self, queue: &TaskQueue<T>, task: T) -> Result<()> {
        self.ensure_running()?;
        if queue.push(task) {
            Ok(())
        } else {
            Err(Error::NotRunning)
        }
    }

    /// Push a task carrying a responder and wait for the worker's reply.
    fn call<T: Task, R>(
        &self,
        queue: &TaskQueue<T>,
        what: &'static str,
        make: impl FnOnce(Responder<R>) -> T,
    ) -> Result<R> {
        self.ensure_running()?;
        let (reply, pending) = rendezvous(what);
        if !queue.push(make(reply)) {
            return Err(Error::NotRunning);
        }
        pending.wait(self.ctx.config.rendezvous_timeout_duration())
    }

    // ========================================================================
    // Messages
    // ========================================================================

    /// Allocate a message with the next id and this provider's identity.
    pub fn create_message(&self) -> Result<Message> {
        self.ensure_running()?;
        let id = MessageId(self.next_message_id.fetch_add(1, Ordering::Relaxed));
        let mut message = Message::new(id);
        message.provider_id = Some(self.ctx.provider_id);
        Ok(message)
    }

    /// Fan `message` out to every eligible subscriber.
    ///
    /// # Errors
    ///
    /// `Error::NoRecipients` when nobody is eligible (nothing is sent),
    /// `Error::DeliveryFailed` when the resource layer refuses the send.
    pub fn send_message(&self, mut message: Message) -> Result<()> {
        if message.id.is_reserved() {
            return Err(Error::invalid(format!(
                "message id {} is reserved",
                message.id
            )));
        }
        match message.provider_id {
            None => message.provider_id = Some(self.ctx.provider_id),
            Some(id) if id != self.ctx.provider_id => {
                return Err(Error::invalid(format!("message from foreign provider {}", id)));
            }
            Some(_) => {}
        }

        self.call(&self.ctx.queues.notification, "send_message", |reply| {
            NotificationTask::SendMessage { message, reply }
        })?
    }

    /// Broadcast a read/dismiss change made on the provider side.
    pub fn send_sync_info(&self, message_id: MessageId, state: SyncType) -> Result<()> {
        if message_id.is_reserved() {
            return Err(Error::invalid(format!("message id {} is reserved", message_id)));
        }
        let sync = SyncInfo::new(message_id, Some(self.ctx.provider_id), state);
        self.call(&self.ctx.queues.notification, "send_sync_info", |reply| {
            NotificationTask::SendSync { sync, reply }
        })?
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Approve or deny a pending (or existing) subscription.
    ///
    /// Applied asynchronously; an unknown consumer is logged and ignored.
    pub fn accept_subscription(&self, consumer_id: ConsumerId, accepted: bool) -> Result<()> {
        if consumer_id.is_nil() {
            return Err(Error::invalid("nil consumer id"));
        }
        self.push(
            &self.ctx.queues.subscription,
            SubscriptionTask::Accept {
                consumer_id,
                accepted,
            },
        )
    }

    /// Snapshot of one subscriber record.
    pub fn subscriber(&self, consumer_id: ConsumerId) -> Result<SubscriberRecord> {
        self.ensure_running()?;
        self.ctx
            .subscribers
            .lock()
            .read(&consumer_id)
            .cloned()
            .ok_or_else(|| Error::not_found("subscriber", consumer_id))
    }

    /// Snapshot of all subscriber records in subscription order.
    pub fn subscribers(&self) -> Result<Vec<SubscriberRecord>> {
        self.ensure_running()?;
        Ok(self.ctx.subscribers.lock().iter().cloned().collect())
    }

    // ========================================================================
    // Topics
    // ========================================================================

    pub fn register_topic(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.call(&self.ctx.queues.topic, "register_topic", |reply| {
            TopicTask::Register { name, reply }
        })?
    }

    /// Remove a topic and every consumer selection referencing it.
    pub fn unregister_topic(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.call(&self.ctx.queues.topic, "unregister_topic", |reply| {
            TopicTask::Unregister { name, reply }
        })?
    }

    /// Select or deselect `name` on behalf of a consumer.
    pub fn set_consumer_topic(&self, consumer_id: ConsumerId, name: &str, selected: bool) -> Result<()> {
        if consumer_id.is_nil() {
            return Err(Error::invalid("nil consumer id"));
        }
        let name = name.to_string();
        self.call(&self.ctx.queues.topic, "set_consumer_topic", |reply| {
            TopicTask::SetConsumerTopic {
                consumer_id,
                name,
                selected,
                reply,
            }
        })?
    }

    /// Registered topics in registration order.
    pub fn get_registered_topics(&self) -> Result<Vec<Topic>> {
        self.call(&self.ctx.queues.topic, "get_registered_topics", |reply| {
            TopicTask::QueryRegistered { reply }
        })
    }

    /// Registered topics with `consumer_id`'s selections marked subscribed.
    pub fn get_consumer_topics(&self, consumer_id: ConsumerId) -> Result<Vec<Topic>> {
        self.call(&self.ctx.queues.topic, "get_consumer_topics", |reply| {
            TopicTask::QuerySelections { consumer_id, reply }
        })
    }

    // ========================================================================
    // Inbound wire events
    // ========================================================================

    /// Route an inbound wire event to its scheduler.
    pub fn submit(&self, event: ProviderEvent) -> Result<()> {
        let queues = &self.ctx.queues;
        match event {
            ProviderEvent::SubscribeRequest(request) => self.push(
                &queues.subscription,
                SubscriptionTask::ReceiveSubscription(request),
            ),
            ProviderEvent::ObserveCancelled { channel } => {
                self.push(&queues.subscription, SubscriptionTask::Unsubscribe { channel })
            }
            ProviderEvent::SyncPosted(sync) => {
                if sync.message_id.is_reserved() {
                    return Err(Error::invalid(format!(
                        "sync for reserved message id {}",
                        sync.message_id
                    )));
                }
                self.push(&queues.notification, NotificationTask::ReceivedSync(sync))
            }
            ProviderEvent::TopicsPosted {
                consumer_id,
                topics,
            } => self.push(
                &queues.topic,
                TopicTask::PostSelection {
                    consumer_id,
                    topics,
                },
            ),
            ProviderEvent::TopicQuery {
                consumer_id,
                request,
            } => self.push(
                &queues.topic,
                TopicTask::Request {
                    consumer_id,
                    request,
                },
            ),
            ProviderEvent::NetworkUp => self.push(&queues.discovery, DiscoveryTask::Announce),
        }
    }

    pub fn handle_subscribe_request(&self, request: SubscriptionRequest) -> Result<()> {
        self.submit(ProviderEvent::SubscribeRequest(request))
    }

    pub fn handle_observe_cancelled(&self, channel: ChannelId) -> Result<()> {
        self.submit(ProviderEvent::ObserveCancelled { channel })
    }

    pub fn handle_sync_post(&self, sync: SyncInfo) -> Result<()> {
        self.submit(ProviderEvent::SyncPosted(sync))
    }

    pub fn handle_topic_post(&self, consumer_id: ConsumerId, topics: Vec<Topic>) -> Result<()> {
        self.submit(ProviderEvent::TopicsPosted {
            consumer_id,
            topics,
        })
    }

    pub fn handle_topic_query(&self, consumer_id: Option<ConsumerId>, request: RequestHandle) -> Result<()> {
        self.submit(ProviderEvent::TopicQuery {
            consumer_id,
            request,
        })
    }

    // ========================================================================
    // Observability
    // ========================================================================

    /// Counters of every scheduler.
    #[must_use]
    pub fn scheduler_metrics(&self) -> Vec<(SchedulerId, QueueSnapshot)> {
        vec![
            (self.discovery.id(), self.discovery.metrics()),
            (self.subscription.id(), self.subscription.metrics()),
            (self.topic.id(), self.topic.metrics()),
            (self.notification.id(), self.notification.metrics()),
            (self.callback.id(), self.callback.metrics()),
        ]
    }
}

impl Drop for Provider {
    fn drop(&mut self) {
        self.stop();
    }
}
