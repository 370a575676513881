// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application callbacks and presence announcements.

use super::context::ProviderContext;
use super::tasks::{CallbackTask, DiscoveryTask};
use crate::error::Result;
use crate::scheduler::TaskHandler;
use crate::wire::Presence;
use std::sync::Arc;

/// Runs `ProviderListener` callbacks off the wire and worker threads.
pub(crate) struct CallbackWorker {
    ctx: Arc<ProviderContext>,
}

impl CallbackWorker {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }
}

impl TaskHandler<CallbackTask> for CallbackWorker {
    fn handle(&mut self, task: CallbackTask) -> Result<()> {
        match task {
            CallbackTask::SubscribeRequest { consumer_id } => {
                log::debug!("[Callback] subscribe request from {}", consumer_id);
                self.ctx.listener.on_subscribe_request(consumer_id);
            }
            CallbackTask::SyncReceived(sync) => {
                log::debug!(
                    "[Callback] message {} is now {}",
                    sync.message_id,
                    sync.state
                );
                self.ctx.listener.on_sync_info(&sync);
            }
        }
        Ok(())
    }
}

pub(crate) struct DiscoveryWorker {
    ctx: Arc<ProviderContext>,
}

impl DiscoveryWorker {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }
}

impl TaskHandler<DiscoveryTask> for DiscoveryWorker {
    fn handle(&mut self, task: DiscoveryTask) -> Result<()> {
        match task {
            DiscoveryTask::Announce => {
                let presence = Presence {
                    provider_id: self.ctx.provider_id,
                    access_policy: self.ctx.config.policy,
                    user_info: self.ctx.config.user_info.clone(),
                    secured: self.ctx.config.resource_security,
                };
                self.ctx.layer.publish_presence(&presence)?;
                log::info!("[Discovery] announced provider {}", presence.provider_id);
            }
        }
        Ok(())
    }
}
