// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Herald
//!
//! Embedded publish/subscribe notification engine.
//!
//! A [`Provider`] publishes notification messages to subscribed consumers,
//! keeps a topic catalog and relays read/dismiss state between them. A
//! [`Consumer`] discovers providers, subscribes, and tracks the state of every
//! message it received.
//!
//! Both engines are driven by FIFO schedulers: one worker thread per concern,
//! each owning a task queue. Bytes and sockets stay outside the crate; the host
//! plugs a [`ResourceLayer`] into the provider and a [`ConsumerLink`] into the
//! consumer, then feeds inbound wire events through `submit`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use herald::{Consumer, ConsumerConfig, ConsumerLink, NoopConsumerListener};
//! use std::sync::Arc;
//!
//! fn run(link: Arc<dyn ConsumerLink>) -> herald::Result<()> {
//!     let config = ConsumerConfig::from_file("consumer.toml")?;
//!     config.init_logging()?;
//!     let consumer = Consumer::start(
//!         config,
//!         link,
//!         Arc::new(NoopConsumerListener),
//!     )?;
//!     consumer.rescan()?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod consumer;
pub mod error;
pub mod logging;
pub mod provider;
pub mod scheduler;
pub mod types;
pub mod wire;

pub use cache::{DiscoveredProvider, MessageSyncEntry, SubscriberRecord};
pub use config::{ConfigError, ConsumerConfig, ProviderConfig};
pub use consumer::{Consumer, ConsumerEvent, ConsumerListener, NoopConsumerListener};
pub use error::{Error, Result};
pub use logging::{init_logging, init_logging_env, init_logging_with_filter, LogLevel};
pub use provider::{
    ClosureProviderListener, NoopProviderListener, Provider, ProviderEvent, ProviderListener,
};
pub use scheduler::{QueueSnapshot, SchedulerId};
pub use types::{
    AccessPolicy, ChannelId, ConsumerId, ControlCode, MediaContents, Message, MessageId,
    MessageType, ProviderId, ProviderState, SubscriptionPolicy, SyncInfo, SyncType, Topic,
    TopicFilterMode, TopicState, TransportType, RESERVED_MESSAGE_ID,
};
pub use wire::{
    Connection, ConsumerLink, Payload, Presence, ProviderAdvert, RequestHandle, ResourceKind,
    ResourceLayer, ResponseStatus, SubscriptionRequest,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
