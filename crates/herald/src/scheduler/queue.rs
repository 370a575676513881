// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! FIFO task queue with blocking pop.

use super::{SchedulerId, Task};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-queue counters.
///
/// Relaxed atomics; readers only take monotonic snapshots.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    pub pushed: AtomicU64,
    /// Pushes refused because the scheduler was not running.
    pub dropped: AtomicU64,
    pub handled: AtomicU64,
    /// Handlers that returned an error or panicked.
    pub failed: AtomicU64,
    pub panicked: AtomicU64,
    /// Tasks released unprocessed at stop.
    pub drained: AtomicU64,
}

/// Point-in-time copy of [`QueueMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub pushed: u64,
    pub dropped: u64,
    pub handled: u64,
    pub failed: u64,
    pub panicked: u64,
    pub drained: u64,
}

impl QueueMetrics {
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pushed: self.pushed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
        }
    }
}

struct QueueState<T> {
    tasks: VecDeque<T>,
    running: bool,
}

/// Multi-producer, single-consumer FIFO.
///
/// The running flag lives under the same lock as the deque, so a push either
/// lands before `close` (and is later handled or drained) or is refused.
pub struct TaskQueue<T> {
    id: SchedulerId,
    state: Mutex<QueueState<T>>,
    ready: Condvar,
    metrics: QueueMetrics,
}

impl<T: Task> TaskQueue<T> {
    /// Create a running, empty queue.
    #[must_use]
    pub fn new(id: SchedulerId) -> Self {
        Self {
            id,
            state: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                running: true,
            }),
            ready: Condvar::new(),
            metrics: QueueMetrics::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SchedulerId {
        self.id
    }

    /// Append a task and wake the worker.
    ///
    /// Returns `false` (and drops the task) when the queue is closed.
    pub fn push(&self, task: T) -> bool {
        let mut state = self.state.lock();
        if !state.running {
            drop(state);
            self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!("[{}] not running, dropping {}", self.id, task.kind());
            return false;
        }
        state.tasks.push_back(task);
        drop(state);

        self.metrics.pushed.fetch_add(1, Ordering::Relaxed);
        self.ready.notify_one();
        true
    }

    /// Block until a task is available; `None` once the queue is closed.
    pub fn pop_blocking(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if !state.running {
                return None;
            }
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            self.ready.wait(&mut state);
        }
    }

    /// Stop accepting tasks and wake the worker.
    pub fn close(&self) {
        self.state.lock().running = false;
        self.ready.notify_all();
    }

    /// Take every queued task, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let tasks: Vec<T> = self.state.lock().tasks.drain(..).collect();
        self.metrics
            .drained
            .fetch_add(tasks.len() as u64, Ordering::Relaxed);
        tasks
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct Job(u32);

    impl Task for Job {
        fn kind(&self) -> &'static str {
            "Job"
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new(SchedulerId::Topic);
        for i in 0..5 {
            assert!(queue.push(Job(i)));
        }
        for i in 0..5 {
            assert_eq!(queue.pop_blocking(), Some(Job(i)));
        }
        assert!(queue.is_empty());
        assert_eq!(queue.metrics().snapshot().pushed, 5);
    }

    #[test]
    fn test_push_after_close_is_dropped() {
        let queue = TaskQueue::new(SchedulerId::Notification);
        queue.close();
        assert!(!queue.push(Job(1)));
        assert!(queue.is_empty());
        assert_eq!(queue.metrics().snapshot().dropped, 1);
        assert_eq!(queue.pop_blocking(), None);
    }

    #[test]
    fn test_close_wakes_blocked_worker() {
        let queue = Arc::new(TaskQueue::<Job>::new(SchedulerId::Discovery));
        let worker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking())
        };
        thread::sleep(std::time::Duration::from_millis(20));
        queue.close();
        assert_eq!(worker.join().unwrap(), None);
    }

    #[test]
    fn test_drain_returns_leftovers() {
        let queue = TaskQueue::new(SchedulerId::Subscription);
        queue.push(Job(1));
        queue.push(Job(2));
        queue.close();
        assert_eq!(queue.drain(), vec![Job(1), Job(2)]);
        assert_eq!(queue.metrics().snapshot().drained, 2);
    }

    #[test]
    fn test_concurrent_producers_keep_per_producer_order() {
        let queue = Arc::new(TaskQueue::new(SchedulerId::CallbackResponse));
        let producers: Vec<_> = (0..4u32)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..100 {
                        queue.push(Job(p * 1000 + i));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut last = [None::<u32>; 4];
        for _ in 0..400 {
            let Job(value) = queue.pop_blocking().unwrap();
            let slot = &mut last[(value / 1000) as usize];
            if let Some(prev) = *slot {
                assert!(value > prev);
            }
            *slot = Some(value);
        }
    }
}
