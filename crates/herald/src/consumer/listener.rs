// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consumer application callbacks.

use crate::cache::DiscoveredProvider;
use crate::types::{Message, ProviderId, ProviderState, SyncInfo};

/// Callbacks raised on the consumer's callback worker.
///
/// All methods default to no-ops.
pub trait ConsumerListener: Send + Sync {
    /// A provider that leaves the subscription decision to this consumer
    /// was found. Call `Consumer::subscribe` to follow it.
    fn on_provider_discovered(&self, provider: &DiscoveredProvider) {
        let _ = provider;
    }

    /// A provider allowed, denied, changed its topics or went away.
    fn on_provider_state_changed(&self, provider_id: ProviderId, state: ProviderState) {
        let _ = (provider_id, state);
    }

    /// A new (not yet seen) notification arrived.
    fn on_message_received(&self, message: &Message) {
        let _ = message;
    }

    /// The read/dismiss state of a message changed.
    fn on_sync_info_received(&self, sync: &SyncInfo) {
        let _ = sync;
    }
}

/// Listener that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConsumerListener;

impl ConsumerListener for NoopConsumerListener {}
