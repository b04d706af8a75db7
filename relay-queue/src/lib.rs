//! An unbounded double-ended queue with blocking, timeout-capable removal.
//!
//! Producers insert at the back (or, as an escape hatch, the front) and
//! never block. Consumers remove from the front and block until an element
//! is available, optionally giving up after a timeout.
//!
//! # Design
//!
//! The queue pairs a mutex-protected [`VecDeque`] with a counting
//! [`Semaphore`] from `relay-sync`:
//!
//! - Every insert stores one element under the lock, then posts one permit.
//! - Every removal takes one permit, then removes one element under the lock.
//!
//! Permits and occupancy move in lockstep, so a consumer whose semaphore
//! wait succeeds walks straight into a non-empty queue — the lock is held
//! only for the removal itself, never across the blocking wait.
//!
//! The one place the accounting can skew is [`clear`](BlockingQueue::clear),
//! which removes elements wholesale. `clear` reclaims as many permits as it
//! removed elements, and the pop path additionally tolerates a stale permit
//! (a wake that finds the queue already emptied) by re-waiting instead of
//! returning a phantom value. See [`clear`](BlockingQueue::clear) for the
//! exact interleaving this covers.
//!
//! The two halves — the locked deque and the semaphore — sit on separate
//! cache lines so producers posting permits don't contend with the lock
//! word itself.
//!
//! # Example
//!
//! ```
//! use relay_queue::BlockingQueue;
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let queue = Arc::new(BlockingQueue::new());
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         // Blocks until the producer below catches up.
//!         let first = queue.pop();
//!         // Bounded wait: reports absence instead of hanging.
//!         let second = queue.pop_timeout(Duration::from_millis(200));
//!         (first, second)
//!     })
//! };
//!
//! queue.push(1u64);
//! queue.push(2u64);
//!
//! let (first, second) = consumer.join().unwrap();
//! assert_eq!(first, 1);
//! assert_eq!(second, Some(2));
//! ```
//!
//! # When to Use This
//!
//! Use `relay_queue` when:
//! - Any number of producers feed any number of consumers
//! - Consumers should sleep, not spin, while the queue is empty
//! - Producers must never block (the queue is unbounded)
//! - A consumer needs a bounded wait with a clean "nothing arrived" outcome
//!
//! Consider alternatives when:
//! - You need backpressure → use a bounded channel
//! - You need `select!` support → use `crossbeam-channel`
//! - Sub-microsecond latency matters more than sleeping consumers → use a
//!   lock-free ring buffer and spin

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use core::fmt;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use relay_sync::Semaphore;

/// An unbounded blocking queue.
///
/// All methods take `&self`; share an instance between threads with
/// [`Arc`](std::sync::Arc). Inserts never block. Removals block on a
/// counting semaphore while the queue is empty and hold the lock only for
/// the removal itself.
///
/// Dropping the queue drops any remaining elements. A consumer blocked in
/// [`pop`](BlockingQueue::pop) keeps its `Arc` clone alive, so the queue
/// cannot be freed out from under it — but nothing wakes it either. Callers
/// that need shutdown must layer it on top, typically by using
/// [`pop_timeout`](BlockingQueue::pop_timeout) and checking a stop flag
/// between waits.
pub struct BlockingQueue<T> {
    items: CachePadded<Mutex<VecDeque<T>>>,
    available: CachePadded<Semaphore>,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: CachePadded::new(Mutex::new(VecDeque::new())),
            available: CachePadded::new(Semaphore::new(0)),
        }
    }

    /// Pushes a value onto the back of the queue.
    ///
    /// Takes ownership of the value; callers that still need it can use
    /// [`push_cloned`](BlockingQueue::push_cloned) instead. Never blocks.
    /// Wakes at most one blocked consumer.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_queue::BlockingQueue;
    ///
    /// let queue = BlockingQueue::new();
    /// queue.push(String::from("hello"));
    /// assert_eq!(queue.pop(), "hello");
    /// ```
    pub fn push(&self, value: T) {
        self.items.lock().push_back(value);
        self.available.post();
    }

    /// Pushes a value onto the *front* of the queue, ahead of everything
    /// already stored.
    ///
    /// The escape hatch for high-priority items: the next pop returns this
    /// value. Otherwise identical to [`push`](BlockingQueue::push).
    ///
    /// # Example
    ///
    /// ```
    /// use relay_queue::BlockingQueue;
    ///
    /// let queue = BlockingQueue::new();
    /// queue.push(1);
    /// queue.push(2);
    /// queue.push_front(3);
    ///
    /// assert_eq!(queue.pop(), 3);
    /// assert_eq!(queue.pop(), 1);
    /// assert_eq!(queue.pop(), 2);
    /// ```
    pub fn push_front(&self, value: T) {
        self.items.lock().push_front(value);
        self.available.post();
    }

    /// Pushes a clone of `value` onto the back of the queue, leaving the
    /// original with the caller.
    ///
    /// The borrowing counterpart to [`push`](BlockingQueue::push): use this
    /// when the caller still needs the value, `push` when ownership can be
    /// transferred without a copy.
    pub fn push_cloned(&self, value: &T)
    where
        T: Clone,
    {
        self.push(value.clone());
    }

    /// Removes and returns the front element, blocking while the queue is
    /// empty.
    ///
    /// There is no timeout and no disconnection: the only way this returns
    /// is a matching insert. Use [`pop_timeout`](BlockingQueue::pop_timeout)
    /// if the wait must be bounded.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_queue::BlockingQueue;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let queue = Arc::new(BlockingQueue::new());
    ///
    /// let consumer = {
    ///     let queue = Arc::clone(&queue);
    ///     thread::spawn(move || queue.pop())
    /// };
    ///
    /// queue.push(42u64);
    /// assert_eq!(consumer.join().unwrap(), 42);
    /// ```
    pub fn pop(&self) -> T {
        loop {
            self.available.wait();
            if let Some(value) = self.items.lock().pop_front() {
                return value;
            }
            // Stale permit: a clear() emptied the queue between our wake
            // and taking the lock. Wait for the next insert.
        }
    }

    /// Removes and returns the front element, giving up after `timeout`.
    ///
    /// Returns `None` if the queue stayed empty for the full duration.
    /// Expiry has no side effect: no permit is consumed and no element is
    /// touched. The timeout is a single deadline — a wake that loses its
    /// element to a racing [`clear`](BlockingQueue::clear) re-waits for the
    /// *remaining* time, not a fresh timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_queue::BlockingQueue;
    /// use std::time::Duration;
    ///
    /// let queue = BlockingQueue::<u64>::new();
    /// assert_eq!(queue.pop_timeout(Duration::from_millis(10)), None);
    ///
    /// queue.push(7);
    /// assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(7));
    /// ```
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        // A timeout too large to express as a deadline is an unbounded wait.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.pop());
        };
        loop {
            if !self.available.wait_until(deadline) {
                return None;
            }
            if let Some(value) = self.items.lock().pop_front() {
                return Some(value);
            }
        }
    }

    /// Removes and returns the front element if one is immediately
    /// available.
    ///
    /// Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        if !self.available.try_wait() {
            return None;
        }
        // A racing clear() may have reclaimed the element behind this
        // permit; absence is the honest answer then.
        self.items.lock().pop_front()
    }

    /// Removes all elements.
    ///
    /// Holding the lock, this empties the deque and then reclaims up to one
    /// permit per removed element via non-blocking semaphore takes. The
    /// reclaim can come up short: a consumer that already took a permit but
    /// has not yet locked the deque owns one of the removed elements'
    /// permits. That consumer finds the deque empty and re-waits, which is
    /// exactly the accounting this shortfall requires — one element and one
    /// permit disappeared together.
    ///
    /// After `clear` returns and concurrent pops have settled, a
    /// [`pop_timeout`](BlockingQueue::pop_timeout) observes an empty queue
    /// rather than a phantom wakeup.
    pub fn clear(&self) {
        let mut items = self.items.lock();
        let removed = items.len();
        items.clear();
        for _ in 0..removed {
            if !self.available.try_wait() {
                break;
            }
        }
    }

    /// Returns the number of elements currently stored.
    ///
    /// A snapshot only; concurrent pushes and pops move it immediately.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns `true` if the queue currently stores no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
