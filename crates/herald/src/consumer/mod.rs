// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consumer engine.
//!
//! A [`Consumer`] discovers providers, subscribes to them and tracks the
//! messages they push. It runs four schedulers: discovery, subscription,
//! notification (the message-state tracker) and callback.

mod callback;
mod context;
mod discovery;
mod listener;
mod message_state;
mod subscription;
mod tasks;

pub use listener::{ConsumerListener, NoopConsumerListener};

use crate::cache::DiscoveredProvider;
use crate::config::ConsumerConfig;
use crate::error::{Error, Result};
use crate::scheduler::{rendezvous, QueueSnapshot, Scheduler, SchedulerId, Task, TaskQueue};
use crate::types::{
    ConsumerId, Message, MessageId, ProviderId, ProviderState, SyncInfo, SyncType, Topic,
};
use crate::wire::{ConsumerLink, ProviderAdvert};
use callback::CallbackWorker;
use context::ConsumerContext;
use discovery::DiscoveryWorker;
use message_state::MessageStateWorker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subscription::SubscriptionWorker;
use tasks::{CallbackTask, DiscoveryTask, NotificationTask, SubscriptionTask};

/// Inbound wire event for a consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumerEvent {
    ProviderDiscovered(ProviderAdvert),
    ProviderLost { provider_id: ProviderId },
    /// Observe notification on a provider's message resource.
    Message(Message),
    /// Observe notification on a provider's sync resource.
    Sync(SyncInfo),
    /// Answer to an earlier `ConsumerLink::fetch_topics`.
    TopicList {
        provider_id: ProviderId,
        topics: Vec<Topic>,
    },
}

/// A running notification consumer.
pub struct Consumer {
    ctx: Arc<ConsumerContext>,
    running: AtomicBool,
    discovery: Scheduler<DiscoveryTask, DiscoveryWorker>,
    subscription: Scheduler<SubscriptionTask, SubscriptionWorker>,
    notification: Scheduler<NotificationTask, MessageStateWorker>,
    callback: Scheduler<CallbackTask, CallbackWorker>,
}

impl Consumer {
    /// Start a consumer with a fresh random identity.
    pub fn start(
        config: ConsumerConfig,
        link: Arc<dyn ConsumerLink>,
        listener: Arc<dyn ConsumerListener>,
    ) -> Result<Self> {
        Self::start_with_id(config, ConsumerId::random(), link, listener)
    }

    /// Start a consumer with a known identity.
    ///
    /// # Errors
    ///
    /// `Error::Config` for an invalid config, `Error::Io` if a worker thread
    /// cannot be spawned.
    pub fn start_with_id(
        config: ConsumerConfig,
        consumer_id: ConsumerId,
        link: Arc<dyn ConsumerLink>,
        listener: Arc<dyn ConsumerListener>,
    ) -> Result<Self> {
        config.validate()?;
        if consumer_id.is_nil() {
            return Err(Error::invalid("nil consumer id"));
        }

        let ctx = Arc::new(ConsumerContext::new(config, consumer_id, link, listener));
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
        let notification = Scheduler::with_queue(
            Arc::clone(&queues.notification),
            &owner,
            MessageStateWorker::new(Arc::clone(&ctx)),
        )?;
        let callback = Scheduler::with_queue(
            Arc::clone(&queues.callback),
            &owner,
            CallbackWorker::new(Arc::clone(&ctx)),
        )?;

        log::info!("[Consumer] '{}' started as {}", owner, consumer_id);
        Ok(Self {
            ctx,
            running: AtomicBool::new(true),
            discovery,
            subscription,
            notification,
            callback,
        })
    }

    /// Stop every worker and release all state. Idempotent.
    ///
    /// May be called from a `ConsumerListener` callback: the callback worker
    /// is then detached rather than joined, and exits when the callback
    /// returns.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.discovery.stop();
        self.subscription.stop();
        self.notification.stop();
        self.callback.stop();
        self.ctx.clear();
        log::info!("[Consumer] '{}' stopped", self.ctx.config.name);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn consumer_id(&self) -> ConsumerId {
        self.ctx.consumer_id
    }

    #[must_use]
    pub fn config(&self) -> &ConsumerConfig {
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

    fn check_provider(provider_id: ProviderId) -> Result<()> {
        if provider_id.is_nil() {
            return Err(Error::invalid("nil provider id"));
        }
        Ok(())
    }

    // ========================================================================
    // Application API
    // ========================================================================

    /// Ask the wire layer to run presence discovery again.
    pub fn rescan(&self) -> Result<()> {
        self.push(&self.ctx.queues.discovery, DiscoveryTask::Rescan)
    }

    /// Subscribe to a discovered provider. Applied asynchronously.
    pub fn subscribe(&self, provider_id: ProviderId) -> Result<()> {
        Self::check_provider(provider_id)?;
        self.push(
            &self.ctx.queues.subscription,
            SubscriptionTask::Subscribe { provider_id },
        )
    }

    pub fn unsubscribe(&self, provider_id: ProviderId) -> Result<()> {
        Self::check_provider(provider_id)?;
        self.push(
            &self.ctx.queues.subscription,
            SubscriptionTask::Unsubscribe { provider_id },
        )
    }

    /// Report a read/dismiss change to the provider.
    pub fn send_sync_info(&self, provider_id: ProviderId, message_id: MessageId, state: SyncType) -> Result<()> {
        Self::check_provider(provider_id)?;
        if message_id.is_reserved() {
            return Err(Error::invalid(format!("message id {} is reserved", message_id)));
        }
        let sync = SyncInfo::new(message_id, Some(provider_id), state);
        self.push(
            &self.ctx.queues.subscription,
            SubscriptionTask::SendSync { provider_id, sync },
        )
    }

    /// Topic catalog last fetched from `provider_id`.
    pub fn get_topic_list(&self, provider_id: ProviderId) -> Result<Vec<Topic>> {
        Self::check_provider(provider_id)?;
        self.ensure_running()?;
        let (reply, pending) = rendezvous("get_topic_list");
        if !self
            .ctx
            .queues
            .discovery
            .push(DiscoveryTask::QueryTopics { provider_id, reply })
        {
            return Err(Error::NotRunning);
        }
        pending.wait(self.ctx.config.rendezvous_timeout_duration())?
    }

    /// Post this consumer's topic selection to `provider_id`.
    pub fn update_topic_list(&self, provider_id: ProviderId, topics: Vec<Topic>) -> Result<()> {
        Self::check_provider(provider_id)?;
        if topics.iter().any(|t| t.name.trim().is_empty()) {
            return Err(Error::invalid("empty topic name"));
        }
        self.push(
            &self.ctx.queues.subscription,
            SubscriptionTask::PostTopics {
                provider_id,
                topics,
            },
        )
    }

    /// Snapshot of a cached provider.
    pub fn provider(&self, provider_id: ProviderId) -> Result<DiscoveredProvider> {
        self.ensure_running()?;
        self.ctx
            .providers
            .lock()
            .read(&provider_id)
            .cloned()
            .ok_or_else(|| Error::not_found("provider", provider_id))
    }

    /// Every cached provider in discovery order.
    pub fn providers(&self) -> Result<Vec<DiscoveredProvider>> {
        self.ensure_running()?;
        Ok(self.ctx.providers.lock().iter().cloned().collect())
    }

    /// Last state reported for `provider_id`; `None` before any report.
    pub fn get_provider_state(&self, provider_id: ProviderId) -> Result<Option<ProviderState>> {
        self.provider(provider_id).map(|p| p.state)
    }

    /// True while a subscribe is outstanding or established.
    pub fn is_subscribed(&self, provider_id: ProviderId) -> Result<bool> {
        self.provider(provider_id).map(|p| p.is_subscribing())
    }

    /// Tracked read/dismiss state of a message sent by `provider_id`.
    pub fn message_state(&self, provider_id: ProviderId, message_id: MessageId) -> Result<Option<SyncType>> {
        self.ensure_running()?;
        Ok(self
            .ctx
            .messages
            .lock()
            .read(&(provider_id, message_id))
            .map(|e| e.state))
    }

    // ========================================================================
    // Inbound wire events
    // ========================================================================

    /// Route an inbound wire event to its scheduler.
    pub fn submit(&self, event: ConsumerEvent) -> Result<()> {
        let queues = &self.ctx.queues;
        match event {
            ConsumerEvent::ProviderDiscovered(advert) => {
                self.push(&queues.discovery, DiscoveryTask::ProviderDiscovered(advert))
            }
            ConsumerEvent::ProviderLost { provider_id } => {
                self.push(&queues.discovery, DiscoveryTask::ProviderLost { provider_id })
            }
            ConsumerEvent::Message(message) => {
                self.push(&queues.notification, NotificationTask::MessageReceived(message))
            }
            ConsumerEvent::Sync(sync) => {
                self.push(&queues.notification, NotificationTask::SyncReceived(sync))
            }
            ConsumerEvent::TopicList {
                provider_id,
                topics,
            } => self.push(
                &queues.discovery,
                DiscoveryTask::TopicListReceived {
                    provider_id,
                    topics,
                },
            ),
        }
    }

    pub fn handle_provider_discovered(&self, advert: ProviderAdvert) -> Result<()> {
        self.submit(ConsumerEvent::ProviderDiscovered(advert))
    }

    pub fn handle_provider_lost(&self, provider_id: ProviderId) -> Result<()> {
        self.submit(ConsumerEvent::ProviderLost { provider_id })
    }

    pub fn handle_message(&self, message: Message) -> Result<()> {
        self.submit(ConsumerEvent::Message(message))
    }

    pub fn handle_sync(&self, sync: SyncInfo) -> Result<()> {
        self.submit(ConsumerEvent::Sync(sync))
    }

    pub fn handle_topic_list(&self, provider_id: ProviderId, topics: Vec<Topic>) -> Result<()> {
        self.submit(ConsumerEvent::TopicList {
            provider_id,
            topics,
        })
    }

    #[must_use]
    pub fn scheduler_metrics(&self) -> Vec<(SchedulerId, QueueSnapshot)> {
        vec![
            (self.discovery.id(), self.discovery.metrics()),
            (self.subscription.id(), self.subscription.metrics()),
            (self.notification.id(), self.notification.metrics()),
            (self.callback.id(), self.callback.metrics()),
        ]
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.stop();
    }
}
