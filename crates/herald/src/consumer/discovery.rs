// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provider discovery and cache.
//!
//! Providers are deduplicated by network address first, then by identity.
//! A provider reachable over several transports keeps one record with one
//! connection per (address, transport).

use super::context::ConsumerContext;
use super::tasks::{CallbackTask, DiscoveryTask, SubscriptionTask};
use crate::cache::DiscoveredProvider;
use crate::error::{Error, Result};
use crate::scheduler::TaskHandler;
use crate::types::{ControlCode, ProviderId, ProviderState, SubscriptionPolicy, Topic};
use crate::wire::{Connection, ProviderAdvert};
use std::sync::Arc;

pub(crate) struct DiscoveryWorker {
    ctx: Arc<ConsumerContext>,
}

fn state_for(code: ControlCode) -> ProviderState {
    match code {
        ControlCode::Allow => ProviderState::Allow,
        ControlCode::Deny => ProviderState::Deny,
        ControlCode::Topic => ProviderState::Topic,
    }
}

impl DiscoveryWorker {
    pub fn new(ctx: Arc<ConsumerContext>) -> Self {
        Self { ctx }
    }

    fn discovered(&mut self, advert: ProviderAdvert) -> Result<()> {
        if advert.provider_id.is_nil() {
            return Err(Error::invalid("advert without provider id"));
        }
        if advert.address.is_empty() {
            return Err(Error::invalid("advert without address"));
        }
        let provider_id = advert.provider_id;

        let announce = {
            let mut providers = self.ctx.providers.lock();

            let by_address = providers
                .find(|p| p.has_address(&advert.address))
                .map(|p| (p.provider_id, p.is_subscribing()));
            match by_address {
                Some((known, subscribing)) if known == provider_id => {
                    if subscribing {
                        log::trace!("[Discovery] duplicate advert from {}", provider_id);
                        return Ok(());
                    }
                    let snapshot = providers.update(&provider_id, |p| {
                        p.state = Some(ProviderState::Discovered);
                        p.clone()
                    });
                    drop(providers);
                    if let Some(snapshot) = snapshot {
                        self.ctx
                            .queues
                            .callback
                            .push(CallbackTask::ProviderDiscovered(snapshot));
                    }
                    return Ok(());
                }
                Some((stale, _)) => {
                    // Address now belongs to another provider.
                    log::info!(
                        "[Discovery] {} replaced {} at {}",
                        provider_id,
                        stale,
                        advert.address
                    );
                    providers.delete(&stale);
                }
                None => {}
            }

            let mut incoming = DiscoveredProvider::new(
                provider_id,
                advert.access_policy,
                Connection::new(advert.address.as_str(), advert.transport),
            );
            incoming.user_info = advert.user_info;
            let outcome = providers.write(incoming)?;
            log::debug!(
                "[Discovery] {} at {} ({:?})",
                provider_id,
                advert.address,
                outcome
            );

            providers
                .read(&provider_id)
                .filter(|p| !p.is_subscribing())
                .map(|p| (p.access_policy, p.clone()))
        };

        let Some((policy, snapshot)) = announce else {
            return Ok(());
        };
        match policy {
            SubscriptionPolicy::ConsumerDecides => {
                self.ctx.providers.lock().update(&provider_id, |p| {
                    p.state = Some(ProviderState::Discovered);
                });
                self.ctx
                    .queues
                    .callback
                    .push(CallbackTask::ProviderDiscovered(snapshot));
            }
            SubscriptionPolicy::ProviderDecides => {
                self.ctx
                    .queues
                    .subscription
                    .push(SubscriptionTask::Subscribe { provider_id });
            }
        }
        Ok(())
    }

    fn lost(&mut self, provider_id: ProviderId) -> Result<()> {
        if self.ctx.providers.lock().delete(&provider_id).is_none() {
            log::debug!("[Discovery] lost unknown provider {}", provider_id);
            return Ok(());
        }
        log::info!("[Discovery] provider {} stopped", provider_id);
        self.ctx.queues.callback.push(CallbackTask::ProviderStateChanged {
            provider_id,
            state: ProviderState::Stopped,
        });
        Ok(())
    }

    fn changed(&mut self, provider_id: ProviderId, code: ControlCode) -> Result<()> {
        let state = state_for(code);
        let (changed, connection) = self
            .ctx
            .providers
            .lock()
            .update(&provider_id, |p| {
                let changed = p.state != Some(state);
                p.state = Some(state);
                (changed, p.active_connection().cloned())
            })
            .ok_or_else(|| Error::not_found("provider", provider_id))?;

        if changed {
            log::info!("[Discovery] provider {} is now {}", provider_id, state);
            self.ctx
                .queues
                .callback
                .push(CallbackTask::ProviderStateChanged { provider_id, state });
        }

        // A catalog change makes the cached list stale even when the state
        // was already Topic.
        if code == ControlCode::Topic {
            if let Some(connection) = connection {
                self.ctx.link.fetch_topics(provider_id, &connection)?;
            }
        }
        Ok(())
    }

    fn topic_list(&mut self, provider_id: ProviderId, topics: Vec<Topic>) -> Result<()> {
        self.ctx
            .providers
            .lock()
            .update(&provider_id, |p| p.topics = topics)
            .ok_or_else(|| Error::not_found("provider", provider_id))
    }

    fn query_topics(&self, provider_id: ProviderId) -> Result<Vec<Topic>> {
        self.ctx
            .providers
            .lock()
            .read(&provider_id)
            .map(|p| p.topics.clone())
            .ok_or_else(|| Error::not_found("provider", provider_id))
    }
}

impl TaskHandler<DiscoveryTask> for DiscoveryWorker {
    fn handle(&mut self, task: DiscoveryTask) -> Result<()> {
        match task {
            DiscoveryTask::ProviderDiscovered(advert) => self.discovered(advert),
            DiscoveryTask::ProviderLost { provider_id } => self.lost(provider_id),
            DiscoveryTask::ProviderChanged { provider_id, code } => self.changed(provider_id, code),
            DiscoveryTask::TopicListReceived {
                provider_id,
                topics,
            } => self.topic_list(provider_id, topics),
            DiscoveryTask::QueryTopics { provider_id, reply } => {
                reply.send(self.query_topics(provider_id));
                Ok(())
            }
            DiscoveryTask::Rescan => self.ctx.link.rescan(),
        }
    }
}
