// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message-state tracker.
//!
//! Remembers the read/dismiss state of every message received so far, keyed
//! by sending provider and message id. The store deduplicates deliveries
//! arriving over several transports and decides when a sync event is worth
//! reporting. Control messages (reserved ids) are routed to discovery instead.

use super::context::ConsumerContext;
use super::tasks::{CallbackTask, DiscoveryTask, NotificationTask};
use crate::cache::MessageSyncEntry;
use crate::error::{Error, Result};
use crate::scheduler::TaskHandler;
use crate::types::{Message, SyncInfo, SyncType};
use std::sync::Arc;

pub(crate) struct MessageStateWorker {
    ctx: Arc<ConsumerContext>,
}

impl MessageStateWorker {
    pub fn new(ctx: Arc<ConsumerContext>) -> Self {
        Self { ctx }
    }

    fn message(&mut self, message: Message) -> Result<()> {
        if message.id.is_reserved() {
            return self.control(&message);
        }

        let provider_id = message
            .provider_id
            .ok_or_else(|| Error::invalid(format!("message {} without provider id", message.id)))?;

        {
            let mut messages = self.ctx.messages.lock();
            if messages.contains(&(provider_id, message.id)) {
                log::trace!(
                    "[MessageState] duplicate message {} from {}",
                    message.id,
                    provider_id
                );
                return Ok(());
            }
            messages.write(MessageSyncEntry {
                provider_id,
                message_id: message.id,
                state: SyncType::Unread,
            })?;
        }

        log::debug!("[MessageState] new message {}", message.id);
        self.ctx
            .queues
            .callback
            .push(CallbackTask::MessageReceived(message));
        Ok(())
    }

    fn control(&mut self, message: &Message) -> Result<()> {
        let code = message
            .control_code()
            .ok_or_else(|| Error::invalid(format!("unknown control id {}", message.id)))?;
        let provider_id = message
            .provider_id
            .ok_or_else(|| Error::invalid("control message without provider id"))?;

        self.ctx
            .queues
            .discovery
            .push(DiscoveryTask::ProviderChanged { provider_id, code });
        Ok(())
    }

    fn sync(&mut self, sync: SyncInfo) -> Result<()> {
        if sync.message_id.is_reserved() {
            return Err(Error::invalid(format!(
                "sync for reserved id {}",
                sync.message_id
            )));
        }

        let provider_id = sync.provider_id.ok_or_else(|| {
            Error::invalid(format!("sync for message {} without provider id", sync.message_id))
        })?;
        let key = (provider_id, sync.message_id);

        let changed = {
            let mut messages = self.ctx.messages.lock();
            let previous = messages.read(&key).map(|e| e.state);
            match (previous, sync.state) {
                (Some(state), incoming) if state == incoming => false,
                (Some(_), SyncType::Deleted) => {
                    messages.delete(&key);
                    true
                }
                // Untracked and deleted: nothing to remember, still a change.
                (None, SyncType::Deleted) => true,
                (_, state) => {
                    messages.write(MessageSyncEntry {
                        provider_id,
                        message_id: sync.message_id,
                        state,
                    })?;
                    true
                }
            }
        };

        if !changed {
            log::trace!(
                "[MessageState] message {} already {}",
                sync.message_id,
                sync.state
            );
            return Ok(());
        }

        log::debug!(
            "[MessageState] message {} -> {}",
            sync.message_id,
            sync.state
        );
        self.ctx.queues.callback.push(CallbackTask::SyncReceived(sync));
        Ok(())
    }
}

impl TaskHandler<NotificationTask> for MessageStateWorker {
    fn handle(&mut self, task: NotificationTask) -> Result<()> {
        match task {
            NotificationTask::MessageReceived(message) => self.message(message),
            NotificationTask::SyncReceived(sync) => self.sync(sync),
        }
    }
}
