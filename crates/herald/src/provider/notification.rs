// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Notification fan-out.
//!
//! Recipients are computed from the subscriber store (insertion order) and,
//! for topic-tagged messages, from the consumers' topic selections. The two
//! stores are read one after the other.

use super::context::ProviderContext;
use super::tasks::{CallbackTask, NotificationTask};
use crate::cache::SubscriberRecord;
use crate::error::{Error, Result};
use crate::scheduler::TaskHandler;
use crate::types::{
    ChannelId, ConsumerId, ControlCode, Message, SyncInfo, TopicFilterMode, TopicState,
};
use crate::wire::{Payload, ResourceKind};
use std::sync::Arc;

pub(crate) struct NotificationWorker {
    ctx: Arc<ProviderContext>,
}

fn channels_for(record: &SubscriberRecord, resource: ResourceKind) -> Vec<ChannelId> {
    match resource {
        ResourceKind::Sync => record.sync_channels().collect(),
        _ => record.message_channels().collect(),
    }
}

impl NotificationWorker {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    /// Channels of accepted subscribers that should receive `topic`.
    fn recipients(&self, resource: ResourceKind, topic: Option<&str>) -> Vec<ChannelId> {
        let candidates: Vec<(ConsumerId, Vec<ChannelId>)> = self
            .ctx
            .subscribers
            .lock()
            .iter()
            .filter(|r| r.accepted)
            .map(|r| (r.consumer_id, channels_for(r, resource)))
            .collect();

        let Some(topic) = topic else {
            return candidates.into_iter().flat_map(|(_, c)| c).collect();
        };

        let mode = self.ctx.config.topic_filter;
        let selections = self.ctx.selections.lock();
        candidates
            .into_iter()
            .filter(|(consumer_id, _)| {
                let mut has_any = false;
                for selection in selections.iter().filter(|s| s.consumer_id == *consumer_id) {
                    if selection.topic_name == topic && selection.state == TopicState::Subscribed {
                        return true;
                    }
                    has_any = true;
                }
                !has_any && mode == TopicFilterMode::ReceiveAllUntilSelected
            })
            .flat_map(|(_, c)| c)
            .collect()
    }

    fn deliver(&self, resource: ResourceKind, channels: &[ChannelId], payload: &Payload) -> Result<()> {
        self.ctx
            .layer
            .notify_recipients(resource, channels, payload)
            .map_err(|e| match e {
                Error::DeliveryFailed(_) => e,
                other => Error::DeliveryFailed(other.to_string()),
            })
    }

    fn send_message(&mut self, message: Message) -> Result<()> {
        let id = message.id;
        let channels = self.recipients(ResourceKind::Message, message.topic_name());
        let payload = Payload::Message(message);
        self.ctx.publish_resource(&payload);

        if channels.is_empty() {
            log::debug!("[Notification] message {} has no recipients", id);
            return Err(Error::NoRecipients {
                what: format!("message {}", id),
            });
        }

        log::debug!("[Notification] message {} -> {} channel(s)", id, channels.len());
        self.deliver(ResourceKind::Message, &channels, &payload)
    }

    fn send_sync(&mut self, sync: SyncInfo) -> Result<()> {
        let payload = Payload::Sync(sync);
        self.ctx.publish_resource(&payload);

        let channels = self.recipients(ResourceKind::Sync, None);
        if channels.is_empty() {
            return Err(Error::NoRecipients {
                what: format!("sync of message {}", sync.message_id),
            });
        }
        self.deliver(ResourceKind::Sync, &channels, &payload)
    }

    /// ALLOW or DENY on the consumer's message channels only.
    fn send_policy(&mut self, consumer_id: ConsumerId, accepted: bool) -> Result<()> {
        let channels: Vec<ChannelId> = self
            .ctx
            .subscribers
            .lock()
            .read(&consumer_id)
            .ok_or_else(|| Error::not_found("subscriber", consumer_id))?
            .message_channels()
            .collect();
        if channels.is_empty() {
            return Err(Error::NoRecipients {
                what: format!("policy for {}", consumer_id),
            });
        }

        let code = if accepted {
            ControlCode::Allow
        } else {
            ControlCode::Deny
        };
        let payload = Payload::Message(Message::control(self.ctx.provider_id, code));
        self.deliver(ResourceKind::Message, &channels, &payload)
    }

    fn topic_changed(&mut self, consumer_id: Option<ConsumerId>) -> Result<()> {
        let channels: Vec<ChannelId> = {
            let subscribers = self.ctx.subscribers.lock();
            subscribers
                .iter()
                .filter(|r| r.accepted && consumer_id.map_or(true, |id| id == r.consumer_id))
                .flat_map(SubscriberRecord::message_channels)
                .collect()
        };
        if channels.is_empty() {
            log::debug!("[Notification] topic change has no recipients");
            return Ok(());
        }

        let payload = Payload::Message(Message::control(self.ctx.provider_id, ControlCode::Topic));
        self.deliver(ResourceKind::Message, &channels, &payload)
    }

    /// Fan a consumer's sync post out to every subscriber, then tell the app.
    fn received_sync(&mut self, sync: SyncInfo) -> Result<()> {
        let payload = Payload::Sync(sync);
        self.ctx.publish_resource(&payload);

        let channels = self.recipients(ResourceKind::Sync, None);
        if channels.is_empty() {
            log::debug!("[Notification] no sync observers for message {}", sync.message_id);
        } else if let Err(e) = self.deliver(ResourceKind::Sync, &channels, &payload) {
            log::warn!("[Notification] sync re-broadcast failed: {}", e);
        }

        self.ctx.queues.callback.push(CallbackTask::SyncReceived(sync));
        Ok(())
    }
}

impl TaskHandler<NotificationTask> for NotificationWorker {
    fn handle(&mut self, task: NotificationTask) -> Result<()> {
        match task {
            NotificationTask::SendMessage { message, reply } => reply.send(self.send_message(message)),
            NotificationTask::SendSync { sync, reply } => reply.send(self.send_sync(sync)),
            NotificationTask::SendPolicy {
                consumer_id,
                accepted,
            } => return self.send_policy(consumer_id, accepted),
            NotificationTask::TopicChanged { consumer_id } => return self.topic_changed(consumer_id),
            NotificationTask::ReceivedSync(sync) => return self.received_sync(sync),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TopicSelection;
    use crate::config::ProviderConfig;
    use crate::provider::testing::{context_with, RecordingLayer};
    use crate::types::{MessageId, SyncType};

    fn subscriber(ctx: &ProviderContext, msg: u32, sync: u32, accepted: bool) -> ConsumerId {
        let consumer = ConsumerId::random();
        let record = SubscriberRecord {
            message_channel: ChannelId(msg),
            sync_channel: ChannelId(sync),
            accepted,
            ..SubscriberRecord::new(consumer)
        };
        ctx.subscribers.lock().write(record).unwrap();
        consumer
    }

    fn select(ctx: &ProviderContext, consumer: ConsumerId, topic: &str) {
        ctx.selections
            .lock()
            .write(TopicSelection::subscribed(consumer, topic))
            .unwrap();
    }

    fn setup(config: ProviderConfig) -> (NotificationWorker, Arc<ProviderContext>, Arc<RecordingLayer>) {
        let (ctx, layer) = context_with(config);
        (NotificationWorker::new(Arc::clone(&ctx)), ctx, layer)
    }

    #[test]
    fn test_only_accepted_subscribers_receive() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        subscriber(&ctx, 1, 0, true);
        subscriber(&ctx, 2, 0, false);
        subscriber(&ctx, 3, 0, true);

        worker.send_message(Message::new(MessageId(11))).unwrap();

        let sent = layer.notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ResourceKind::Message);
        assert_eq!(sent[0].1, [ChannelId(1), ChannelId(3)]);
    }

    #[test]
    fn test_no_recipients_skips_notify() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        subscriber(&ctx, 1, 0, false);

        let err = worker.send_message(Message::new(MessageId(11))).unwrap_err();
        assert!(matches!(err, Error::NoRecipients { .. }));
        assert!(layer.notifications().is_empty());
        // The resource still holds the latest payload.
        assert!(ctx.resources.lock().contains_key(&ResourceKind::Message));
    }

    #[test]
    fn test_topic_filter_receive_all_until_selected() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        let fan = subscriber(&ctx, 1, 0, true);
        let other = subscriber(&ctx, 2, 0, true);
        let _fresh = subscriber(&ctx, 3, 0, true);
        select(&ctx, fan, "sports");
        select(&ctx, other, "weather");

        worker
            .send_message(Message::new(MessageId(11)).with_topic("sports"))
            .unwrap();

        assert_eq!(layer.notifications()[0].1, [ChannelId(1), ChannelId(3)]);
    }

    #[test]
    fn test_topic_filter_strict_selection() {
        let config = ProviderConfig::default().topic_filter(TopicFilterMode::StrictSelection);
        let (mut worker, ctx, layer) = setup(config);
        let fan = subscriber(&ctx, 1, 0, true);
        subscriber(&ctx, 3, 0, true);
        select(&ctx, fan, "sports");

        worker
            .send_message(Message::new(MessageId(11)).with_topic("sports"))
            .unwrap();
        assert_eq!(layer.notifications()[0].1, [ChannelId(1)]);

        // Untagged messages still reach everyone.
        worker.send_message(Message::new(MessageId(12))).unwrap();
        assert_eq!(layer.notifications()[1].1, [ChannelId(1), ChannelId(3)]);
    }

    #[test]
    fn test_sync_goes_to_sync_channels() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        subscriber(&ctx, 1, 21, true);
        subscriber(&ctx, 2, 0, true);

        let sync = SyncInfo::new(MessageId(11), Some(ctx.provider_id), SyncType::Read);
        worker.send_sync(sync).unwrap();

        let sent = layer.notifications();
        assert_eq!(sent[0].0, ResourceKind::Sync);
        assert_eq!(sent[0].1, [ChannelId(21)]);
        assert_eq!(sent[0].2, Payload::Sync(sync));
    }

    #[test]
    fn test_policy_targets_message_channels_only() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        let consumer = subscriber(&ctx, 7, 8, false);
        subscriber(&ctx, 9, 0, true);

        worker.send_policy(consumer, false).unwrap();

        let sent = layer.notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, [ChannelId(7)]);
        let Payload::Message(msg) = &sent[0].2 else {
            panic!("expected message payload");
        };
        assert_eq!(msg.control_code(), Some(ControlCode::Deny));
    }

    #[test]
    fn test_topic_change_broadcast_and_unicast() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        let first = subscriber(&ctx, 1, 0, true);
        subscriber(&ctx, 2, 0, true);
        subscriber(&ctx, 3, 0, false);

        worker.topic_changed(None).unwrap();
        worker.topic_changed(Some(first)).unwrap();

        let sent = layer.notifications();
        assert_eq!(sent[0].1, [ChannelId(1), ChannelId(2)]);
        assert_eq!(sent[1].1, [ChannelId(1)]);
    }

    #[test]
    fn test_topic_change_without_subscribers_is_quiet() {
        let (mut worker, _ctx, layer) = setup(ProviderConfig::default());
        worker.topic_changed(None).unwrap();
        assert!(layer.notifications().is_empty());
    }

    #[test]
    fn test_received_sync_rebroadcast_then_callback() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        subscriber(&ctx, 1, 11, true);
        subscriber(&ctx, 2, 12, true);

        let sync = SyncInfo::new(MessageId(40), None, SyncType::Deleted);
        worker.received_sync(sync).unwrap();

        assert_eq!(layer.notifications()[0].1, [ChannelId(11), ChannelId(12)]);
        assert!(matches!(
            ctx.queues.callback.pop_blocking(),
            Some(CallbackTask::SyncReceived(s)) if s == sync
        ));
    }

    #[test]
    fn test_layer_error_becomes_delivery_failure() {
        let (mut worker, ctx, layer) = setup(ProviderConfig::default());
        subscriber(&ctx, 1, 0, true);
        layer.fail_next("link down");

        let err = worker.send_message(Message::new(MessageId(11))).unwrap_err();
        assert!(matches!(err, Error::DeliveryFailed(_)));
    }
}
