// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! State shared by the consumer's workers.

use super::listener::ConsumerListener;
use super::tasks::Dispatcher;
use crate::cache::{CacheStore, DiscoveredProvider, MessageSyncEntry};
use crate::config::ConsumerConfig;
use crate::types::ConsumerId;
use crate::wire::ConsumerLink;
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) struct ConsumerContext {
    pub config: ConsumerConfig,
    pub consumer_id: ConsumerId,
    pub link: Arc<dyn ConsumerLink>,
    pub listener: Arc<dyn ConsumerListener>,
    pub queues: Dispatcher,
    pub providers: Mutex<CacheStore<DiscoveredProvider>>,
    pub messages: Mutex<CacheStore<MessageSyncEntry>>,
}

impl ConsumerContext {
    pub fn new(
        config: ConsumerConfig,
        consumer_id: ConsumerId,
        link: Arc<dyn ConsumerLink>,
        listener: Arc<dyn ConsumerListener>,
    ) -> Self {
        Self {
            config,
            consumer_id,
            link,
            listener,
            queues: Dispatcher::new(),
            providers: Mutex::new(CacheStore::new()),
            messages: Mutex::new(CacheStore::new()),
        }
    }

    pub fn clear(&self) {
        let providers = self.providers.lock().clear();
        let messages = self.messages.lock().clear();
        log::debug!(
            "[Consumer] released {} providers, {} message states",
            providers,
            messages
        );
    }
}
