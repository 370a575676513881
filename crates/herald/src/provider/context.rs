// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! State shared by the provider's workers.

use super::listener::ProviderListener;
use super::tasks::Dispatcher;
use crate::cache::{CacheStore, RegisteredTopic, SubscriberRecord, TopicSelection};
use crate::config::ProviderConfig;
use crate::types::ProviderId;
use crate::wire::{Payload, ResourceKind, ResourceLayer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a provider worker can touch.
///
/// One lock per store. A handler that needs two stores takes them one after
/// the other, never both at once.
pub(crate) struct ProviderContext {
    pub config: ProviderConfig,
    pub provider_id: ProviderId,
    pub layer: Arc<dyn ResourceLayer>,
    pub listener: Arc<dyn ProviderListener>,
    pub queues: Dispatcher,
    pub subscribers: Mutex<CacheStore<SubscriberRecord>>,
    pub topics: Mutex<CacheStore<RegisteredTopic>>,
    pub selections: Mutex<CacheStore<TopicSelection>>,
    /// Latest payload published on each resource.
    pub resources: Mutex<HashMap<ResourceKind, Payload>>,
}

impl ProviderContext {
    pub fn new(
        config: ProviderConfig,
        provider_id: ProviderId,
        layer: Arc<dyn ResourceLayer>,
        listener: Arc<dyn ProviderListener>,
    ) -> Self {
        Self {
            config,
            provider_id,
            layer,
            listener,
            queues: Dispatcher::new(),
            subscribers: Mutex::new(CacheStore::new()),
            topics: Mutex::new(CacheStore::new()),
            selections: Mutex::new(CacheStore::new()),
            resources: Mutex::new(HashMap::new()),
        }
    }

    /// Record `payload` as the current representation of its resource.
    pub fn publish_resource(&self, payload: &Payload) {
        self.resources
            .lock()
            .insert(payload.resource(), payload.clone());
    }

    /// Release every store entry.
    pub fn clear(&self) {
        let subscribers = self.subscribers.lock().clear();
        let topics = self.topics.lock().clear();
        let selections = self.selections.lock().clear();
        self.resources.lock().clear();
        log::debug!(
            "[Provider] released {} subscribers, {} topics, {} selections",
            subscribers,
            topics,
            selections
        );
    }
}
