// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One-shot reply channel between an API caller and a worker.
//!
//! The [`Responder`] travels inside the task; the caller keeps the
//! [`Pending`] half and blocks on it. If the task is dropped unprocessed
//! (scheduler stopped) the sender goes with it and the caller is released
//! with `Error::NotRunning`.

use crate::error::{Error, Result};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Worker half of a rendezvous.
#[derive(Debug)]
pub struct Responder<T> {
    tx: Sender<T>,
    what: &'static str,
}

/// Caller half of a rendezvous.
#[derive(Debug)]
pub struct Pending<T> {
    rx: Receiver<T>,
    what: &'static str,
}

/// Create a rendezvous for the operation named `what`.
#[must_use]
pub fn rendezvous<T>(what: &'static str) -> (Responder<T>, Pending<T>) {
    let (tx, rx) = channel::bounded(1);
    (Responder { tx, what }, Pending { rx, what })
}

impl<T> Responder<T> {
    /// Deliver the result; a caller that already gave up is not an error.
    pub fn send(self, value: T) {
        if self.tx.send(value).is_err() {
            log::debug!("[rendezvous] caller of {} no longer waiting", self.what);
        }
    }
}

impl<T> Pending<T> {
    /// Wait up to `timeout` for the worker's reply.
    ///
    /// # Errors
    ///
    /// `Error::Timeout` if nothing arrives in time, `Error::NotRunning` if
    /// the task was dropped without a reply.
    pub fn wait(self, timeout: Duration) -> Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("[rendezvous] {} timed out after {:?}", self.what, timeout);
                Err(Error::Timeout(self.what))
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::NotRunning),
        }
    }
}
