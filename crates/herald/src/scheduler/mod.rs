// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Worker schedulers.
//!
//! Each scheduler is a FIFO [`TaskQueue`] drained by one dedicated worker
//! thread. Producers (API calls, wire-layer callbacks, other workers) push
//! typed tasks; the worker hands them one at a time to a [`TaskHandler`].
//!
//! # Architecture
//!
//! ```text
//! API / wire thread --push--> TaskQueue --pop--> worker thread --> TaskHandler
//!        ^                                                          |
//!        +------------ Pending::wait <---- Responder::send ----------+
//! ```
//!
//! Ordering is FIFO within a scheduler only. Handler errors and panics are
//! logged and counted; the worker always moves on to the next task.

mod queue;
pub mod rendezvous;
mod worker;

pub use queue::{QueueMetrics, QueueSnapshot, TaskQueue};
pub use rendezvous::{rendezvous, Pending, Responder};
pub use worker::{Scheduler, TaskHandler};

use std::fmt;

/// The logical schedulers of a provider or consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchedulerId {
    Discovery,
    Subscription,
    Notification,
    CallbackResponse,
    Topic,
}

impl SchedulerId {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SchedulerId::Discovery => "discovery",
            SchedulerId::Subscription => "subscription",
            SchedulerId::Notification => "notification",
            SchedulerId::CallbackResponse => "callback",
            SchedulerId::Topic => "topic",
        }
    }
}

impl fmt::Display for SchedulerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit of work carried by a scheduler.
pub trait Task: Send + 'static {
    /// Variant name, for logs.
    fn kind(&self) -> &'static str;
}
