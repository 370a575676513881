// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scheduler worker thread lifecycle.

use super::queue::{QueueSnapshot, TaskQueue};
use super::{SchedulerId, Task};
use crate::error::Result;
use parking_lot::Mutex;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Processes the tasks of one scheduler.
pub trait TaskHandler<T>: Send + 'static {
    /// Process one task. Errors are logged by the worker, never propagated.
    fn handle(&mut self, task: T) -> Result<()>;

    /// Release a task left in the queue at stop.
    ///
    /// Dropping the task releases everything it owns, including any
    /// rendezvous responder, so the default is enough for most handlers.
    fn discard(&mut self, task: T) {
        drop(task);
    }
}

/// A task queue plus the background thread draining it.
///
/// The worker owns the handler while running and hands it back through its
/// join handle, so leftovers can go through [`TaskHandler::discard`].
pub struct Scheduler<T: Task, H: TaskHandler<T>> {
    queue: Arc<TaskQueue<T>>,
    handle: Mutex<Option<JoinHandle<H>>>,
}

impl<T: Task, H: TaskHandler<T>> Scheduler<T, H> {
    /// Spawn the worker thread `"{owner}-{id}"`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn start(id: SchedulerId, owner: &str, handler: H) -> io::Result<Self> {
        Self::with_queue(Arc::new(TaskQueue::new(id)), owner, handler)
    }

    /// Spawn a worker over a queue created beforehand.
    ///
    /// Lets handlers hold producer handles to each other's queues.
    pub fn with_queue(queue: Arc<TaskQueue<T>>, owner: &str, handler: H) -> io::Result<Self> {
        let id = queue.id();
        let worker_queue = Arc::clone(&queue);

        let handle = thread::Builder::new()
            .name(format!("{}-{}", owner, id))
            .spawn(move || worker_loop(&worker_queue, handler))?;

        log::debug!("[{}] worker started for {}", id, owner);
        Ok(Self {
            queue,
            handle: Mutex::new(Some(handle)),
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SchedulerId {
        self.queue.id()
    }

    /// Enqueue a task; `false` if the scheduler is stopped.
    #[inline]
    pub fn push(&self, task: T) -> bool {
        self.queue.push(task)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.queue.is_running()
    }

    #[must_use]
    pub fn metrics(&self) -> QueueSnapshot {
        self.queue.metrics().snapshot()
    }

    /// Stop the worker, join it and discard whatever is still queued.
    ///
    /// Idempotent. Called from this scheduler's own worker (a handler that
    /// stops its service), the queue is closed and emptied but the thread is
    /// detached instead of joined; it exits once the current task returns.
    pub fn stop(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        self.queue.close();

        if handle.thread().id() == thread::current().id() {
            log::warn!("[{}] stopped from its own worker, detaching", self.id());
            // The handler is busy on this very stack; leftovers are dropped.
            drop(self.queue.drain());
            return;
        }

        match handle.join() {
            Ok(mut handler) => {
                for task in self.queue.drain() {
                    log::debug!("[{}] discarding {}", self.id(), task.kind());
                    handler.discard(task);
                }
            }
            Err(_) => {
                // Handler panics are caught per task; this is a loop bug.
                log::error!("[{}] worker thread panicked", self.id());
                drop(self.queue.drain());
            }
        }
        log::debug!("[{}] worker stopped", self.id());
    }
}

impl<T: Task, H: TaskHandler<T>> Drop for Scheduler<T, H> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop<T: Task, H: TaskHandler<T>>(queue: &TaskQueue<T>, mut handler: H) -> H {
    let id = queue.id();
    let metrics = queue.metrics();

    while let Some(task) = queue.pop_blocking() {
        let kind = task.kind();
        log::trace!("[{}] dispatch {}", id, kind);

        match catch_unwind(AssertUnwindSafe(|| handler.handle(task))) {
            Ok(Ok(())) => {
                metrics.handled.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                metrics.failed.fetch_add(1, Ordering::Relaxed);
                log::warn!("[{}] {} failed: {}", id, kind, e);
            }
            Err(_) => {
                metrics.failed.fetch_add(1, Ordering::Relaxed);
                metrics.panicked.fetch_add(1, Ordering::Relaxed);
                log::error!("[{}] {} handler panicked", id, kind);
            }
        }
    }

    handler
}
