//! Shared deferred-event queue and the cross-thread wait model.
//!
//! The queue is the only piece of the engine touched by more than one
//! thread. Submitting threads enqueue under a single mutex and signal a
//! condition variable; the engine thread drains due entries once per tick
//! and may park on the condition variable while idle. State callbacks never
//! run while the lock is held.

use crate::core::{DeferredEvent, Event};
use crate::engine::error::SendError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

pub(crate) struct SharedQueue {
    inner: Mutex<VecDeque<DeferredEvent>>,
    ready: Condvar,
    stopped: AtomicBool,
    capacity: usize,
}

impl SharedQueue {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            ready: Condvar::new(),
            stopped: AtomicBool::new(false),
            capacity,
        })
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DeferredEvent>> {
        // A poisoning panic can only originate outside the engine; the
        // queue itself is left consistent by every operation here.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an event due after `delay_ms`, failing without side effects
    /// when the queue is at capacity.
    pub fn enqueue(&self, event: Event, delay_ms: u32) -> Result<(), SendError> {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            tracing::error!(kind = %event.kind, "failed to queue new event");
            return Err(SendError::QueueFull {
                capacity: self.capacity,
            });
        }
        tracing::debug!(kind = %event.kind, arg = event.arg, delay_ms, "new event arrived");
        queue.push_back(DeferredEvent {
            event,
            remaining_micros: u64::from(delay_ms) * 1000,
        });
        drop(queue);
        self.ready.notify_one();
        Ok(())
    }

    /// Park until an event is queued or a stop is requested, at most
    /// `timeout`. A zero timeout returns immediately.
    pub fn wait_ready(&self, timeout: Duration) {
        if timeout.is_zero() {
            return;
        }
        let queue = self.lock();
        let _ = self
            .ready
            .wait_timeout_while(queue, timeout, |queue| {
                queue.is_empty() && !self.stopped.load(Ordering::Relaxed)
            })
            .unwrap_or_else(|e| e.into_inner());
    }

    /// One in-order pass over the queue: remove and return entries due
    /// within `elapsed_micros`, decrement the remaining delay of the rest.
    ///
    /// Untouched entries keep their relative order. Entries appended while
    /// the returned events are being dispatched belong to the next tick.
    pub fn collect_due(&self, elapsed_micros: u64) -> Vec<Event> {
        let mut queue = self.lock();
        let mut due = Vec::new();
        let mut pending = VecDeque::with_capacity(queue.len());
        for mut entry in queue.drain(..) {
            if entry.remaining_micros <= elapsed_micros {
                due.push(entry.event);
            } else {
                entry.remaining_micros -= elapsed_micros;
                pending.push_back(entry);
            }
        }
        *queue = pending;
        due
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        // Wake a parked engine so the stop flag is observed promptly.
        self.ready.notify_all();
    }

    pub fn clear_stop(&self) {
        self.stopped.store(false, Ordering::Relaxed);
    }

    pub fn stop_requested(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Cloneable handle for submitting events from any thread.
///
/// Obtained from [`Engine::sender`](crate::Engine::sender). Submission is
/// the only engine operation that is safe across threads; the handle can
/// also request a cooperative stop.
///
/// # Example
///
/// ```rust
/// use statecraft::{Engine, Event, EventKind};
///
/// let engine = Engine::new();
/// let sender = engine.sender();
///
/// let worker = std::thread::spawn(move || {
///     sender.send(Event::signal(EventKind(1))).unwrap();
/// });
/// worker.join().unwrap();
/// ```
#[derive(Clone)]
pub struct EventSender {
    shared: Arc<SharedQueue>,
}

impl EventSender {
    pub(crate) fn new(shared: Arc<SharedQueue>) -> Self {
        Self { shared }
    }

    /// Submit an event for the next engine tick.
    pub fn send(&self, event: Event) -> Result<(), SendError> {
        self.shared.enqueue(event, 0)
    }

    /// Submit an event to be dispatched no earlier than `delay_ms` from now.
    pub fn send_delayed(&self, event: Event, delay_ms: u32) -> Result<(), SendError> {
        self.shared.enqueue(event, delay_ms)
    }

    /// Request a cooperative engine stop, waking a parked `update()`.
    pub fn stop(&self) {
        self.shared.request_stop();
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("queued", &self.shared.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventKind;

    #[test]
    fn enqueue_beyond_capacity_fails_without_side_effects() {
        let queue = SharedQueue::new(3);
        for i in 0..3 {
            queue.enqueue(Event::new(EventKind(1), i), 0).unwrap();
        }
        let err = queue.enqueue(Event::new(EventKind(1), 99), 0);
        assert!(matches!(err, Err(SendError::QueueFull { capacity: 3 })));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn immediate_events_are_due_on_the_next_pass() {
        let queue = SharedQueue::new(4);
        queue.enqueue(Event::signal(EventKind(1)), 0).unwrap();
        let due = queue.collect_due(0);
        assert_eq!(due, vec![Event::signal(EventKind(1))]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn delays_decay_across_passes_without_reordering() {
        let queue = SharedQueue::new(4);
        queue.enqueue(Event::new(EventKind(1), 1), 5).unwrap();
        queue.enqueue(Event::new(EventKind(2), 2), 1).unwrap();

        // 2 ms elapsed: only the 1 ms entry is due.
        let due = queue.collect_due(2_000);
        assert_eq!(due, vec![Event::new(EventKind(2), 2)]);
        assert_eq!(queue.len(), 1);

        // Another 3 ms: the 5 ms entry has fully decayed.
        let due = queue.collect_due(3_000);
        assert_eq!(due, vec![Event::new(EventKind(1), 1)]);
    }

    #[test]
    fn due_events_preserve_insertion_order() {
        let queue = SharedQueue::new(8);
        for i in 0..5 {
            queue.enqueue(Event::new(EventKind(1), i), 0).unwrap();
        }
        let due = queue.collect_due(0);
        let args: Vec<usize> = due.iter().map(|e| e.arg).collect();
        assert_eq!(args, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn stop_request_wakes_a_parked_waiter() {
        let queue = SharedQueue::new(4);
        let waiter = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                let start = std::time::Instant::now();
                queue.wait_ready(Duration::from_secs(10));
                start.elapsed()
            })
        };
        std::thread::sleep(Duration::from_millis(20));
        queue.request_stop();
        let waited = waiter.join().unwrap();
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn sender_clones_feed_the_same_queue() {
        let queue = SharedQueue::new(4);
        let sender = EventSender::new(Arc::clone(&queue));
        let clone = sender.clone();
        sender.send(Event::signal(EventKind(1))).unwrap();
        clone.send(Event::signal(EventKind(2))).unwrap();
        assert_eq!(queue.len(), 2);
    }
}
