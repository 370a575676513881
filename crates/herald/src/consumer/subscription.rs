// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outbound requests to providers.

use super::context::ConsumerContext;
use super::tasks::SubscriptionTask;
use crate::error::{Error, Result};
use crate::scheduler::TaskHandler;
use crate::types::{ProviderId, SyncInfo, Topic};
use crate::wire::Connection;
use std::sync::Arc;

pub(crate) struct SubscriptionWorker {
    ctx: Arc<ConsumerContext>,
}

impl SubscriptionWorker {
    pub fn new(ctx: Arc<ConsumerContext>) -> Self {
        Self { ctx }
    }

    /// Connection to use for `provider_id`, and whether it is subscribing.
    fn route(&self, provider_id: ProviderId) -> Result<(Connection, bool)> {
        let providers = self.ctx.providers.lock();
        let provider = providers
            .read(&provider_id)
            .ok_or_else(|| Error::not_found("provider", provider_id))?;
        let connection = provider
            .active_connection()
            .cloned()
            .ok_or_else(|| Error::invalid(format!("provider {} has no connection", provider_id)))?;
        Ok((connection, provider.is_subscribing()))
    }

    fn set_subscribing(&self, provider_id: ProviderId, address: Option<&str>, subscribing: bool) {
        self.ctx.providers.lock().update(&provider_id, |p| {
            for connection in &mut p.connections {
                if address.map_or(true, |a| a == connection.address) {
                    connection.is_subscribing = subscribing;
                }
            }
        });
    }

    fn subscribe(&mut self, provider_id: ProviderId) -> Result<()> {
        let (connection, subscribing) = self.route(provider_id)?;
        if subscribing {
            log::debug!("[Subscription] already subscribing to {}", provider_id);
            return Ok(());
        }

        self.ctx.link.request_subscribe(provider_id, &connection)?;
        self.set_subscribing(provider_id, Some(connection.address.as_str()), true);
        log::info!(
            "[Subscription] subscribing to {} via {}",
            provider_id,
            connection.address
        );
        Ok(())
    }

    fn unsubscribe(&mut self, provider_id: ProviderId) -> Result<()> {
        let connections: Vec<Connection> = {
            let providers = self.ctx.providers.lock();
            let provider = providers
                .read(&provider_id)
                .ok_or_else(|| Error::not_found("provider", provider_id))?;
            provider
                .connections
                .iter()
                .filter(|c| c.is_subscribing)
                .cloned()
                .collect()
        };

        // Each path is cleared as soon as the wire confirms it; the first
        // failure is reported after every path was tried.
        let mut first_err = None;
        for connection in &connections {
            match self.ctx.link.request_unsubscribe(provider_id, connection) {
                Ok(()) => {
                    self.set_subscribing(provider_id, Some(connection.address.as_str()), false);
                }
                Err(e) => {
                    log::warn!(
                        "[Subscription] unsubscribe from {} via {} failed: {}",
                        provider_id,
                        connection.address,
                        e
                    );
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                log::info!("[Subscription] unsubscribed from {}", provider_id);
                Ok(())
            }
        }
    }

    fn send_sync(&mut self, provider_id: ProviderId, sync: SyncInfo) -> Result<()> {
        let (connection, _) = self.route(provider_id)?;
        self.ctx.link.send_sync(provider_id, &connection, &sync)
    }

    fn post_topics(&mut self, provider_id: ProviderId, topics: Vec<Topic>) -> Result<()> {
        let (connection, _) = self.route(provider_id)?;
        self.ctx.link.post_topics(provider_id, &connection, &topics)
    }
}

impl TaskHandler<SubscriptionTask> for SubscriptionWorker {
    fn handle(&mut self, task: SubscriptionTask) -> Result<()> {
        match task {
            SubscriptionTask::Subscribe { provider_id } => self.subscribe(provider_id),
            SubscriptionTask::Unsubscribe { provider_id } => self.unsubscribe(provider_id),
            SubscriptionTask::SendSync { provider_id, sync } => self.send_sync(provider_id, sync),
            SubscriptionTask::PostTopics {
                provider_id,
                topics,
            } => self.post_topics(provider_id, topics),
        }
    }
}
