//! Fixed-capacity FIFO with atomic bulk operations and a wake hook.

use crate::error::QueueError;
use codetriever_config::constants::{bulk_queue_full_retry_count, bulk_queue_retry_base_delay};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type WakeHook = Arc<dyn Fn() + Send + Sync>;

struct Inner<T> {
    items: VecDeque<T>,
    capacity: usize,
    closed: bool,
}

/// A thread-safe, fixed-capacity FIFO queue.
///
/// Single-item and bulk operations share one [`Mutex`], which is what makes
/// `put_many`/`get_many` atomic with respect to each other: a `get_many`
/// can never observe a `put_many` that is only half-applied, because the
/// half-applied state never exists — a `put_many` either fits under the
/// capacity check while holding the lock, or nothing from that call is
/// enqueued and the caller retries the whole batch.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    wake: Mutex<Option<WakeHook>>,
}

impl<T> BoundedQueue<T> {
    /// Create a queue that holds at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                closed: false,
            }),
            wake: Mutex::new(None),
        }
    }

    /// Install a hook invoked on every successful put, before the item(s)
    /// become visible to consumers. Used to resurrect an idled-out
    /// [`crate::SelfTerminatingWorker`] via `ensure_running`.
    pub fn set_wake(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.wake.lock().expect("queue wake lock poisoned") = Some(Arc::new(hook));
    }

    fn wake_consumer(&self) {
        if let Some(hook) = self.wake.lock().expect("queue wake lock poisoned").as_ref() {
            hook();
        }
    }

    /// Enqueue a single item, failing immediately if the queue is full.
    ///
    /// # Errors
    /// Returns [`QueueError::Full`] (carrying `item` back) if there is no
    /// room, or [`QueueError::Closed`] if the queue was closed.
    pub fn put_nowait(&self, item: T) -> Result<(), QueueError<T>> {
        self.wake_consumer();
        let mut inner = self.inner.lock().expect("queue lock poisoned");
        if inner.closed {
            return Err(QueueError::Closed);
        }
        if inner.items.len() >= inner.capacity {
            return Err(QueueError::Full(vec![item]));
        }
        inner.items.push_back(item);
        Ok(())
    }

    /// Dequeue a single item, failing immediately if none are available.
    ///
    /// # Errors
    /// Returns [`QueueError::Empty`] if the queue has nothing to return.
    pub fn get_nowait(&self) -> Result<T, QueueError<T>> {
        let mut inner = self.inner.lock().expect("queue lock poisoned");
        inner.items.pop_front().ok_or(QueueError::Empty)
    }

    /// Enqueue every item in `items` atomically: either all of them become
    /// visible at once, or (when capacity is exhausted) none do and the
    /// whole batch is retried after an exponential backoff, capped at 1s,
    /// for up to the configured retry count — an explicit loop, never
    /// recursion, so retry count can't grow the call stack.
    ///
    /// # Errors
    /// Returns [`QueueError::Full`] (carrying the un-enqueued `items`) once
    /// retries are exhausted, or [`QueueError::Closed`] if closed.
    pub fn put_many(&self, items: Vec<T>) -> Result<(), QueueError<T>> {
        if items.is_empty() {
            return Ok(());
        }

        let max_retries = bulk_queue_full_retry_count();
        let base_delay = bulk_queue_retry_base_delay();
        let mut pending = items;

        for attempt in 0..=max_retries {
            self.wake_consumer();
            {
                let mut inner = self.inner.lock().expect("queue lock poisoned");
                if inner.closed {
                    return Err(QueueError::Closed);
                }
                let room = inner.capacity.saturating_sub(inner.items.len());
                if room >= pending.len() {
                    inner.items.extend(pending);
                    return Ok(());
                }
            }

            if attempt == max_retries {
                break;
            }
            let delay = backoff_delay(base_delay, attempt);
            std::thread::sleep(delay);
        }

        Err(QueueError::Full(pending_into_vec(&mut pending)))
    }

    /// Dequeue up to `k` items atomically; may return fewer, including
    /// zero, when fewer than `k` are available.
    #[must_use]
    pub fn get_many(&self, k: usize) -> Vec<T> {
        let mut inner = self.inner.lock().expect("queue lock poisoned");
        let take = k.min(inner.items.len());
        inner.items.drain(..take).collect()
    }

    /// Current number of items held by the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue lock poisoned").items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark the queue closed: further puts fail, existing items can still
    /// be drained with `get_many`/`get_nowait`.
    pub fn close(&self) {
        self.inner.lock().expect("queue lock poisoned").closed = true;
    }
}

/// `base * 2^attempt`, capped at 1 second.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    base.checked_mul(factor.try_into().unwrap_or(u32::MAX))
        .unwrap_or(Duration::from_secs(1))
        .min(Duration::from_secs(1))
}

fn pending_into_vec<T>(pending: &mut Vec<T>) -> Vec<T> {
    std::mem::take(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn put_and_get_nowait_roundtrip() {
        let q = BoundedQueue::new(2);
        q.put_nowait(1).unwrap();
        q.put_nowait(2).unwrap();
        assert!(matches!(q.put_nowait(3), Err(QueueError::Full(v)) if v == vec![3]));
        assert_eq!(q.get_nowait().unwrap(), 1);
        assert_eq!(q.get_nowait().unwrap(), 2);
        assert!(matches!(q.get_nowait(), Err(QueueError::Empty)));
    }

    #[test]
    fn put_many_is_all_or_nothing_even_under_partial_capacity() {
        let q: BoundedQueue<i32> = BoundedQueue::new(3);
        q.put_nowait(0).unwrap();
        // Only 2 slots remain, we try to push 3 -> must retry-then-fail, not partially apply.
        std::env::set_var("BULK_QUEUE_FULL_RETRY_COUNT", "0");
        let err = q.put_many(vec![1, 2, 3]).unwrap_err();
        match err {
            QueueError::Full(items) => assert_eq!(items, vec![1, 2, 3]),
            other => panic!("unexpected {other:?}"),
        }
        // Nothing beyond the original item was enqueued.
        assert_eq!(q.len(), 1);
        std::env::remove_var("BULK_QUEUE_FULL_RETRY_COUNT");
    }

    #[test]
    fn put_many_succeeds_when_capacity_suffices() {
        let q: BoundedQueue<i32> = BoundedQueue::new(5);
        q.put_many(vec![1, 2, 3]).unwrap();
        assert_eq!(q.get_many(10), vec![1, 2, 3]);
    }

    #[test]
    fn get_many_returns_fewer_when_queue_has_fewer() {
        let q: BoundedQueue<i32> = BoundedQueue::new(5);
        q.put_nowait(1).unwrap();
        assert_eq!(q.get_many(10), vec![1]);
        assert!(q.get_many(10).is_empty());
    }

    #[test]
    fn wake_hook_fires_on_every_put() {
        let q: BoundedQueue<i32> = BoundedQueue::new(5);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        q.set_wake(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        q.put_nowait(1).unwrap();
        q.put_many(vec![2, 3]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_delay_is_capped_at_one_second() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 10), Duration::from_secs(1));
    }
}
