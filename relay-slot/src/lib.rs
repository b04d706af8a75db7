//! A single-value blocking mailbox.
//!
//! One value at a time, last write wins. Writers overwrite freely and never
//! block; a reader blocks until a write has happened, optionally with a
//! timeout. This is the "hand the latest result to whoever is waiting"
//! pattern: command/response exchanges, latest-config handoff, one-shot
//! completion signaling where only the newest value matters.
//!
//! # Design
//!
//! The slot pairs a mutex-protected `Option<T>` with a [`BinarySemaphore`]
//! from `relay-sync`:
//!
//! - [`set`](BlockingSlot::set) stores the value under the lock, then posts
//!   the semaphore. Posting saturates: any number of sets before a read
//!   collapse into a single pending wakeup, and `set` reports whether it was
//!   the call that armed the signal.
//! - [`get`](BlockingSlot::get) waits on the semaphore, then reads whatever
//!   is *currently* stored — which may be a later write than the one that
//!   produced the wakeup. The value stays in the slot; reading clones it.
//! - [`clear`](BlockingSlot::clear) empties the slot without touching a
//!   signal that is already pending. A reader woken by that signal finds the
//!   slot empty and reports absence; it does not block retroactively.
//!
//! The lock is never held across the blocking wait, and the lock-protected
//! value and the semaphore sit on separate cache lines.
//!
//! # Example
//!
//! ```
//! use relay_slot::BlockingSlot;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let slot = Arc::new(BlockingSlot::new());
//!
//! let reader = {
//!     let slot = Arc::clone(&slot);
//!     thread::spawn(move || slot.get())
//! };
//!
//! assert!(slot.set(42u64)); // first set arms the signal
//! assert_eq!(reader.join().unwrap(), Some(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use core::fmt;
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use relay_sync::BinarySemaphore;

/// A single-value blocking mailbox.
///
/// All methods take `&self`; share an instance between threads with
/// [`Arc`](std::sync::Arc). Writers never block; readers block on a binary
/// semaphore until a write arms it.
///
/// Reads return `Option<T>` for two distinct reasons: the bounded waits
/// time out, and a [`clear`](BlockingSlot::clear) can empty the slot after
/// the signal was armed, in which case a woken reader honestly reports that
/// there is nothing to read.
pub struct BlockingSlot<T> {
    value: CachePadded<Mutex<Option<T>>>,
    ready: CachePadded<BinarySemaphore>,
}

impl<T> BlockingSlot<T> {
    /// Creates an empty, unsignaled slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: CachePadded::new(Mutex::new(None)),
            ready: CachePadded::new(BinarySemaphore::new()),
        }
    }

    /// Stores a value, overwriting any previous one, and arms the ready
    /// signal.
    ///
    /// Returns `true` if this call transitioned the signal from unarmed to
    /// armed — i.e. this is the set that wakes a waiting reader. Returns
    /// `false` if a previous unconsumed set already armed it; the value is
    /// still overwritten (last write wins). Never blocks.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_slot::BlockingSlot;
    ///
    /// let slot = BlockingSlot::new();
    /// assert!(slot.set(10));   // arms the signal
    /// assert!(!slot.set(20));  // already armed, value overwritten
    /// assert_eq!(slot.get(), Some(20));
    /// ```
    pub fn set(&self, value: T) -> bool {
        *self.value.lock() = Some(value);
        self.ready.post()
    }

    /// Waits until the ready signal is armed, then returns a clone of the
    /// currently stored value.
    ///
    /// The wait is unbounded; use [`get_timeout`](BlockingSlot::get_timeout)
    /// if it must not be. The returned value is whatever the slot holds at
    /// read time — a later [`set`](BlockingSlot::set) than the one that
    /// armed the signal wins. The value stays in the slot for later reads
    /// (each of which needs its own set to re-arm the signal).
    ///
    /// Returns `None` only if a [`clear`](BlockingSlot::clear) emptied the
    /// slot between the arming set and this read.
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        self.ready.wait();
        self.value.lock().clone()
    }

    /// As [`get`](BlockingSlot::get), but gives up after `timeout`.
    ///
    /// Returns `None` if no set arrived in time (the signal is left
    /// untouched) or if the slot was cleared after the arming set.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_slot::BlockingSlot;
    /// use std::time::Duration;
    ///
    /// let slot = BlockingSlot::<u64>::new();
    /// assert_eq!(slot.get_timeout(Duration::from_millis(10)), None);
    ///
    /// slot.set(3);
    /// assert_eq!(slot.get_timeout(Duration::from_millis(10)), Some(3));
    /// ```
    pub fn get_timeout(&self, timeout: Duration) -> Option<T>
    where
        T: Clone,
    {
        // A timeout too large to express as a deadline is an unbounded wait.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.get();
        };
        if !self.ready.wait_until(deadline) {
            return None;
        }
        self.value.lock().clone()
    }

    /// Consumes the ready signal if armed and returns a clone of the stored
    /// value.
    ///
    /// Never blocks. Returns `None` if no unconsumed set is pending, even
    /// if the slot still holds a value from an earlier, already-read set —
    /// use [`is_set`](BlockingSlot::is_set) to peek at occupancy instead.
    pub fn try_get(&self) -> Option<T>
    where
        T: Clone,
    {
        if !self.ready.try_wait() {
            return None;
        }
        self.value.lock().clone()
    }

    /// Empties the slot.
    ///
    /// Deliberately leaves the ready signal alone: a reader already woken
    /// (or about to be woken) by a prior set finds the slot empty and
    /// returns `None` rather than being re-suspended.
    pub fn clear(&self) {
        *self.value.lock() = None;
    }

    /// Returns whether the slot currently holds a value.
    ///
    /// Does not touch the ready signal. A snapshot only.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<T> Default for BlockingSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BlockingSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingSlot")
            .field("is_set", &self.is_set())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    // ============================================================================
    // Signal Semantics
    // ============================================================================

    #[test]
    fn first_set_arms_later_sets_saturate() {
        let slot = BlockingSlot::new();

        assert!(slot.set(10u64));
        assert!(!slot.set(20));
        assert!(!slot.set(30));

        assert_eq!(slot.get(), Some(30));
    }

    #[test]
    fn last_write_wins() {
        let slot = BlockingSlot::new();

        slot.set(1u64);
        slot.set(2);

        assert_eq!(slot.get(), Some(2));
    }

    #[test]
    fn each_get_needs_its_own_set() {
        let slot = BlockingSlot::new();

        slot.set(5u64);
        assert_eq!(slot.get(), Some(5));

        // Signal consumed; the value is still there but a bounded read
        // finds no pending set.
        assert!(slot.is_set());
        assert_eq!(slot.get_timeout(Duration::from_millis(20)), None);

        assert!(slot.set(6));
        assert_eq!(slot.get(), Some(6));
    }

    #[test]
    fn try_get_consumes_signal() {
        let slot = BlockingSlot::new();

        assert_eq!(slot.try_get(), None);
        slot.set(7u64);
        assert_eq!(slot.try_get(), Some(7));
        assert_eq!(slot.try_get(), None);
    }

    // ============================================================================
    // Timeouts
    // ============================================================================

    #[test]
    fn get_timeout_on_empty_slot_expires() {
        let slot = BlockingSlot::<u64>::new();

        let start = Instant::now();
        assert_eq!(slot.get_timeout(Duration::from_millis(50)), None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn get_timeout_with_huge_duration_returns_set_value() {
        let slot = BlockingSlot::new();
        slot.set(4u64);

        // Duration::MAX has no representable deadline; the wait must
        // degrade to unbounded instead of panicking on Instant overflow.
        assert_eq!(slot.get_timeout(Duration::MAX), Some(4));
    }

    #[test]
    fn get_timeout_sees_concurrent_set() {
        let slot = Arc::new(BlockingSlot::new());

        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                slot.set(8u64);
            })
        };

        assert_eq!(slot.get_timeout(Duration::from_secs(5)), Some(8));
        writer.join().unwrap();
    }

    // ============================================================================
    // Blocking
    // ============================================================================

    #[test]
    fn get_blocks_until_set() {
        let slot = Arc::new(BlockingSlot::new());

        let reader = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.get())
        };

        thread::sleep(Duration::from_millis(20));
        slot.set(13u64);
        assert_eq!(reader.join().unwrap(), Some(13));
    }

    // ============================================================================
    // Clear
    // ============================================================================

    #[test]
    fn clear_empties_without_unsignaling() {
        let slot = BlockingSlot::new();

        slot.set(1u64);
        slot.clear();
        assert!(!slot.is_set());

        // The signal from set() is still pending: the read wakes
        // immediately but finds nothing.
        let start = Instant::now();
        assert_eq!(slot.get(), None);
        assert!(start.elapsed() < Duration::from_secs(1));

        // Signal now consumed; a bounded read times out.
        assert_eq!(slot.get_timeout(Duration::from_millis(20)), None);
    }

    #[test]
    fn set_after_clear_reads_normally() {
        let slot = BlockingSlot::new();

        slot.set(1u64);
        slot.clear();
        slot.set(2);

        assert_eq!(slot.get(), Some(2));
        assert!(slot.is_set());
    }

    // ============================================================================
    // Cross-Thread
    // ============================================================================

    #[test]
    fn conflated_writes_read_monotonically() {
        let slot = Arc::new(BlockingSlot::new());
        let done = Arc::new(BlockingSlot::new());

        let reader = {
            let slot = Arc::clone(&slot);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut last = 0u64;
                loop {
                    if let Some(v) = slot.get_timeout(Duration::from_millis(10)) {
                        assert!(v >= last, "conflated reads must be monotonic");
                        last = v;
                    }
                    if done.is_set() {
                        return last;
                    }
                }
            })
        };

        for i in 1..=50_000u64 {
            slot.set(i);
        }
        done.set(());

        let last = reader.join().unwrap();
        assert!(last <= 50_000);
    }

    #[test]
    fn ping_pong() {
        let request = Arc::new(BlockingSlot::new());
        let response = Arc::new(BlockingSlot::new());

        let echo = {
            let request = Arc::clone(&request);
            let response = Arc::clone(&response);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let v: u64 = request.get().unwrap();
                    response.set(v + 1);
                }
            })
        };

        for i in 0..1_000u64 {
            request.set(i);
            assert_eq!(response.get(), Some(i + 1));
        }

        echo.join().unwrap();
    }
}
