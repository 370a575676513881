// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provider application callbacks.

use crate::types::{ConsumerId, SyncInfo};

/// Callbacks raised on the provider's callback worker.
///
/// All methods have default no-op implementations. Callbacks should return
/// quickly; a panicking callback is logged and the worker carries on.
///
/// # Example
///
/// ```rust,no_run
/// use herald::{ConsumerId, ProviderListener};
///
/// struct Approver;
///
/// impl ProviderListener for Approver {
///     fn on_subscribe_request(&self, consumer_id: ConsumerId) {
///         println!("{} wants to subscribe", consumer_id);
///     }
/// }
/// ```
pub trait ProviderListener: Send + Sync {
    /// A consumer asked to subscribe under `ProviderDecides` policy.
    ///
    /// Answer with `Provider::accept_subscription`.
    fn on_subscribe_request(&self, consumer_id: ConsumerId) {
        let _ = consumer_id;
    }

    /// A consumer reported a read/dismiss change.
    fn on_sync_info(&self, sync: &SyncInfo) {
        let _ = sync;
    }
}

/// Listener that ignores every callback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProviderListener;

impl ProviderListener for NoopProviderListener {}

type SubscribeFn = Box<dyn Fn(ConsumerId) + Send + Sync>;
type SyncFn = Box<dyn Fn(&SyncInfo) + Send + Sync>;

/// Closure-based provider listener.
///
/// ```rust,no_run
/// use herald::ClosureProviderListener;
///
/// let listener = ClosureProviderListener::new()
///     .on_subscribe_request(|consumer| println!("request from {}", consumer))
///     .on_sync_info(|sync| println!("message {} is {}", sync.message_id, sync.state));
/// ```
#[derive(Default)]
pub struct ClosureProviderListener {
    subscribe: Option<SubscribeFn>,
    sync: Option<SyncFn>,
}

impl ClosureProviderListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_subscribe_request(mut self, f: impl Fn(ConsumerId) + Send + Sync + 'static) -> Self {
        self.subscribe = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_sync_info(mut self, f: impl Fn(&SyncInfo) + Send + Sync + 'static) -> Self {
        self.sync = Some(Box::new(f));
        self
    }
}

impl ProviderListener for ClosureProviderListener {
    fn on_subscribe_request(&self, consumer_id: ConsumerId) {
        if let Some(f) = &self.subscribe {
            f(consumer_id);
        }
    }

    fn on_sync_info(&self, sync: &SyncInfo) {
        if let Some(f) = &self.sync {
            f(sync);
        }
    }
}
