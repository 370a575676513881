// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription state machine.
//!
//! ```text
//! unsubscribed --request--> pending --accept--> accepted
//!                                   \--deny---> denied
//! ```
//!
//! Only a request on the message resource runs the policy. A sync-resource
//! request just records its channel.

use super::context::ProviderContext;
use super::tasks::{CallbackTask, NotificationTask, SubscriptionTask};
use crate::cache::SubscriberRecord;
use crate::error::{Error, Result};
use crate::scheduler::TaskHandler;
use crate::types::{ChannelId, ConsumerId, SubscriptionPolicy};
use crate::wire::{ResourceKind, SubscriptionRequest};
use std::sync::Arc;

pub(crate) struct SubscriptionWorker {
    ctx: Arc<ProviderContext>,
}

impl SubscriptionWorker {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    fn receive(&mut self, request: SubscriptionRequest) -> Result<()> {
        if request.consumer_id.is_nil() {
            return Err(Error::invalid("subscription without consumer id"));
        }
        if !request.channel.is_set() {
            return Err(Error::invalid("subscription without channel"));
        }

        let mut record = SubscriberRecord::new(request.consumer_id);
        match (request.resource, request.remote) {
            (ResourceKind::Message, false) => record.message_channel = request.channel,
            (ResourceKind::Message, true) => record.remote_message_channel = request.channel,
            (ResourceKind::Sync, false) => record.sync_channel = request.channel,
            (ResourceKind::Sync, true) => record.remote_sync_channel = request.channel,
            (ResourceKind::Topic, _) => {
                return Err(Error::invalid("topic resource is not observable"));
            }
        }

        let outcome = self.ctx.subscribers.lock().write(record)?;
        log::debug!(
            "[Subscription] {} {} channel {} ({:?})",
            request.consumer_id,
            request.resource,
            request.channel,
            outcome
        );

        if request.resource != ResourceKind::Message {
            return Ok(());
        }

        match self.ctx.config.policy {
            SubscriptionPolicy::ProviderDecides => {
                self.ctx.queues.callback.push(CallbackTask::SubscribeRequest {
                    consumer_id: request.consumer_id,
                });
            }
            SubscriptionPolicy::ConsumerDecides => {
                self.ctx.queues.subscription.push(SubscriptionTask::Accept {
                    consumer_id: request.consumer_id,
                    accepted: true,
                });
            }
        }
        Ok(())
    }

    fn accept(&mut self, consumer_id: ConsumerId, accepted: bool) -> Result<()> {
        self.ctx
            .subscribers
            .lock()
            .update(&consumer_id, |record| record.accepted = accepted)
            .ok_or_else(|| Error::not_found("subscriber", consumer_id))?;

        log::info!(
            "[Subscription] {} {}",
            consumer_id,
            if accepted { "accepted" } else { "denied" }
        );
        self.ctx.queues.notification.push(NotificationTask::SendPolicy {
            consumer_id,
            accepted,
        });
        Ok(())
    }

    /// Drop every record holding `channel` on any of its four slots.
    fn unsubscribe(&mut self, channel: ChannelId) -> Result<()> {
        if !channel.is_set() {
            return Err(Error::invalid("unsubscribe without channel"));
        }

        let mut store = self.ctx.subscribers.lock();
        let mut removed = 0usize;
        while let Some(record) = store.delete_where(|r| r.owns_channel(channel)) {
            log::info!("[Subscription] {} unsubscribed", record.consumer_id);
            removed += 1;
        }
        if removed == 0 {
            log::debug!("[Subscription] no subscriber on channel {}", channel);
        }
        Ok(())
    }
}

impl TaskHandler<SubscriptionTask> for SubscriptionWorker {
    fn handle(&mut self, task: SubscriptionTask) -> Result<()> {
        match task {
            SubscriptionTask::ReceiveSubscription(request) => self.receive(request),
            SubscriptionTask::Accept {
                consumer_id,
                accepted,
            } => self.accept(consumer_id, accepted),
            SubscriptionTask::Unsubscribe { channel } => self.unsubscribe(channel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::provider::testing::context_with;

    fn request(consumer: ConsumerId, channel: u32, resource: ResourceKind) -> SubscriptionTask {
        SubscriptionTask::ReceiveSubscription(SubscriptionRequest::local(
            consumer,
            ChannelId(channel),
            resource,
        ))
    }

    #[test]
    fn test_provider_decides_asks_application() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));
        let consumer = ConsumerId::random();

        worker.handle(request(consumer, 7, ResourceKind::Message)).unwrap();

        assert_eq!(ctx.queues.callback.len(), 1);
        assert!(ctx.queues.subscription.is_empty());
        let record = ctx.subscribers.lock().read(&consumer).cloned().unwrap();
        assert_eq!(record.message_channel, ChannelId(7));
        assert!(!record.accepted);
    }

    #[test]
    fn test_consumer_decides_enqueues_accept() {
        let config = ProviderConfig::default().policy(SubscriptionPolicy::ConsumerDecides);
        let (ctx, _layer) = context_with(config);
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));
        let consumer = ConsumerId::random();

        worker.handle(request(consumer, 7, ResourceKind::Message)).unwrap();
        assert!(ctx.queues.callback.is_empty());

        let accept = ctx.queues.subscription.pop_blocking().unwrap();
        assert!(matches!(
            accept,
            SubscriptionTask::Accept { accepted: true, consumer_id } if consumer_id == consumer
        ));
        worker.handle(accept).unwrap();

        assert!(ctx.subscribers.lock().read(&consumer).unwrap().accepted);
        assert!(matches!(
            ctx.queues.notification.pop_blocking(),
            Some(NotificationTask::SendPolicy { accepted: true, .. })
        ));
    }

    #[test]
    fn test_sync_request_records_channel_only() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));
        let consumer = ConsumerId::random();

        worker.handle(request(consumer, 9, ResourceKind::Sync)).unwrap();

        assert!(ctx.queues.callback.is_empty());
        let record = ctx.subscribers.lock().read(&consumer).cloned().unwrap();
        assert_eq!(record.sync_channel, ChannelId(9));
        assert_eq!(record.message_channel, ChannelId::NONE);
    }

    #[test]
    fn test_remote_request_fills_remote_slot() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));
        let consumer = ConsumerId::random();

        worker
            .handle(SubscriptionTask::ReceiveSubscription(SubscriptionRequest::remote(
                consumer,
                ChannelId(30),
                ResourceKind::Message,
            )))
            .unwrap();

        let record = ctx.subscribers.lock().read(&consumer).cloned().unwrap();
        assert_eq!(record.remote_message_channel, ChannelId(30));
        assert_eq!(record.message_channel, ChannelId::NONE);
    }

    #[test]
    fn test_malformed_requests_rejected() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));

        assert!(worker.handle(request(ConsumerId::random(), 0, ResourceKind::Message)).is_err());
        let nil = ConsumerId::from_uuid(uuid::Uuid::nil());
        assert!(worker.handle(request(nil, 3, ResourceKind::Message)).is_err());
        assert!(worker.handle(request(ConsumerId::random(), 3, ResourceKind::Topic)).is_err());
        assert!(ctx.subscribers.lock().is_empty());
    }

    #[test]
    fn test_accept_unknown_consumer_is_not_found() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));

        let err = worker
            .handle(SubscriptionTask::Accept {
                consumer_id: ConsumerId::random(),
                accepted: true,
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(ctx.queues.notification.is_empty());
    }

    #[test]
    fn test_deny_is_exclusive_with_accept() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));
        let consumer = ConsumerId::random();
        worker.handle(request(consumer, 7, ResourceKind::Message)).unwrap();

        for accepted in [true, false, true, false] {
            worker
                .handle(SubscriptionTask::Accept {
                    consumer_id: consumer,
                    accepted,
                })
                .unwrap();
            assert_eq!(ctx.subscribers.lock().read(&consumer).unwrap().accepted, accepted);
        }
    }

    #[test]
    fn test_unsubscribe_by_any_channel() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));
        let first = ConsumerId::random();
        let second = ConsumerId::random();
        worker.handle(request(first, 7, ResourceKind::Message)).unwrap();
        worker.handle(request(first, 8, ResourceKind::Sync)).unwrap();
        worker.handle(request(second, 9, ResourceKind::Message)).unwrap();

        worker
            .handle(SubscriptionTask::Unsubscribe {
                channel: ChannelId(8),
            })
            .unwrap();

        let store = ctx.subscribers.lock();
        assert!(store.read(&first).is_none());
        assert!(store.read(&second).is_some());
    }

    #[test]
    fn test_unsubscribe_unknown_channel_is_noop() {
        let (ctx, _layer) = context_with(ProviderConfig::default());
        let mut worker = SubscriptionWorker::new(Arc::clone(&ctx));
        worker
            .handle(SubscriptionTask::Unsubscribe {
                channel: ChannelId(55),
            })
            .unwrap();
    }
}
