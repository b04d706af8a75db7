//! Counting and binary semaphores with timeout-capable waits.
//!
//! These are the wait/wake building blocks for the blocking containers in
//! `relay-queue` and `relay-slot`. Both primitives share the same shape:
//! `post` makes the semaphore available and wakes a waiter, `wait` blocks
//! until available, and the `_timeout`/`_until` forms bound the wait and
//! report expiry as `false` without consuming anything.
//!
//! # Design
//!
//! Each semaphore is a [`parking_lot::Mutex`] around its availability state
//! plus a [`parking_lot::Condvar`]. Waits re-check the state in a loop, so
//! spurious condvar wakes are invisible to callers, and a `post` racing a
//! deadline is never dropped: a timed-out wake re-checks availability one
//! last time before giving up.
//!
//! The mutex is only ever held for a few instructions; no caller-visible
//! operation blocks while holding it.
//!
//! # Example
//!
//! ```
//! use relay_sync::Semaphore;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let gate = Arc::new(Semaphore::new(0));
//!
//! let waiter = {
//!     let gate = Arc::clone(&gate);
//!     thread::spawn(move || gate.wait())
//! };
//!
//! gate.post();
//! waiter.join().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use core::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A counting semaphore.
///
/// Holds a non-negative permit count. [`post`](Semaphore::post) increments
/// the count and wakes one waiter; [`wait`](Semaphore::wait) blocks until
/// the count is positive, then decrements it. Permits accumulate: `n` posts
/// satisfy exactly `n` waits, in any interleaving.
///
/// Wake order among multiple waiters is whatever the underlying condvar
/// provides — at least one waiter is woken per post, but not necessarily
/// the oldest.
///
/// # Example
///
/// ```
/// use relay_sync::Semaphore;
///
/// let sem = Semaphore::new(2);
/// assert!(sem.try_wait());
/// assert!(sem.try_wait());
/// assert!(!sem.try_wait()); // drained
///
/// sem.post();
/// assert!(sem.try_wait());
/// ```
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with the given initial permit count.
    #[must_use]
    pub const fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Adds one permit and wakes one waiter, if any.
    ///
    /// Never blocks beyond the bounded critical section.
    pub fn post(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        drop(permits);
        self.available.notify_one();
    }

    /// Blocks until a permit is available, then takes it.
    pub fn wait(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// As [`wait`](Semaphore::wait), but gives up at `deadline`.
    ///
    /// Returns `true` if a permit was taken, `false` if the deadline passed
    /// first. On `false` no permit has been consumed.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self.available.wait_until(&mut permits, deadline).timed_out() && *permits == 0 {
                return false;
            }
        }
        *permits -= 1;
        true
    }

    /// As [`wait`](Semaphore::wait), but gives up after `timeout`.
    ///
    /// Returns `true` if a permit was taken, `false` on expiry. A timeout
    /// too large to express as a deadline degrades to an unbounded wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            None => {
                self.wait();
                true
            }
        }
    }

    /// Takes a permit if one is immediately available.
    ///
    /// Never blocks. Returns `true` if a permit was taken.
    pub fn try_wait(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Returns the current permit count.
    ///
    /// Only a snapshot: another thread may post or wait immediately after
    /// this returns. Useful for diagnostics and tests, not for control flow.
    #[must_use]
    pub fn permits(&self) -> usize {
        *self.permits.lock()
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("permits", &self.permits())
            .finish_non_exhaustive()
    }
}

/// A binary semaphore.
///
/// Two states, signaled and unsignaled. [`post`](BinarySemaphore::post)
/// saturates at signaled — posting an already-signaled semaphore is a no-op
/// and reports `false` — while [`wait`](BinarySemaphore::wait) blocks until
/// signaled and clears the flag on the way out. Any number of posts before a
/// wait collapse into a single wakeup.
///
/// # Example
///
/// ```
/// use relay_sync::BinarySemaphore;
///
/// let sem = BinarySemaphore::new();
/// assert!(sem.post());  // unsignaled -> signaled
/// assert!(!sem.post()); // already signaled, saturates
///
/// sem.wait(); // consumes the single pending signal
/// assert!(!sem.is_signaled());
/// ```
pub struct BinarySemaphore {
    signaled: Mutex<bool>,
    available: Condvar,
}

impl BinarySemaphore {
    /// Creates an unsignaled binary semaphore.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signaled: Mutex::new(false),
            available: Condvar::new(),
        }
    }

    /// Signals the semaphore, waking one waiter if any.
    ///
    /// Returns `true` if this call transitioned the semaphore from
    /// unsignaled to signaled, `false` if it was already signaled.
    pub fn post(&self) -> bool {
        let mut signaled = self.signaled.lock();
        let transitioned = !*signaled;
        *signaled = true;
        drop(signaled);
        if transitioned {
            self.available.notify_one();
        }
        transitioned
    }

    /// Blocks until signaled, then clears the signal.
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            self.available.wait(&mut signaled);
        }
        *signaled = false;
    }

    /// As [`wait`](BinarySemaphore::wait), but gives up at `deadline`.
    ///
    /// Returns `true` if the signal was consumed, `false` if the deadline
    /// passed first. On `false` the signal state is untouched.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut signaled = self.signaled.lock();
        while !*signaled {
            if self.available.wait_until(&mut signaled, deadline).timed_out() && !*signaled {
                return false;
            }
        }
        *signaled = false;
        true
    }

    /// As [`wait`](BinarySemaphore::wait), but gives up after `timeout`.
    ///
    /// A timeout too large to express as a deadline degrades to an
    /// unbounded wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_until(deadline),
            None => {
                self.wait();
                true
            }
        }
    }

    /// Consumes the signal if currently pending.
    ///
    /// Never blocks. Returns `true` if the signal was consumed.
    pub fn try_wait(&self) -> bool {
        let mut signaled = self.signaled.lock();
        let was_signaled = *signaled;
        *signaled = false;
        was_signaled
    }

    /// Returns whether the semaphore is currently signaled, without
    /// consuming the signal.
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BinarySemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinarySemaphore")
            .field("signaled", &self.is_signaled())
            .finish_non_exhaustive()
    }
}
