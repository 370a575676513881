// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::context::ConsumerContext;
use super::tasks::CallbackTask;
use crate::error::Result;
use crate::scheduler::TaskHandler;
use std::sync::Arc;

/// Runs `ConsumerListener` callbacks.
pub(crate) struct CallbackWorker {
    ctx: Arc<ConsumerContext>,
}

impl CallbackWorker {
    pub fn new(ctx: Arc<ConsumerContext>) -> Self {
        Self { ctx }
    }
}

impl TaskHandler<CallbackTask> for CallbackWorker {
    fn handle(&mut self, task: CallbackTask) -> Result<()> {
        let listener = &self.ctx.listener;
        match task {
            CallbackTask::ProviderDiscovered(provider) => listener.on_provider_discovered(&provider),
            CallbackTask::ProviderStateChanged { provider_id, state } => {
                listener.on_provider_state_changed(provider_id, state);
            }
            CallbackTask::MessageReceived(message) => listener.on_message_received(&message),
            CallbackTask::SyncReceived(sync) => listener.on_sync_info_received(&sync),
        }
        Ok(())
    }
}
