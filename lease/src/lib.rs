//! A shared/exclusive spinlock packed into one atomic word.
//!
//! [`SharedMutex`] keeps an exclusive-wanted bit and a shared-holder count in
//! a single machine word, which makes "no exclusive wanted and no shared
//! holders" a single atomic load. Exclusive waiters are preferred: once the
//! bit is set, no new shared lease is granted until it clears, so exclusive
//! mode makes progress under any amount of shared churn.
//!
//! All waits spin and yield the scheduling quantum each iteration; there are
//! no timeouts and no failure paths, so every operation runs to completion.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

pub mod sync;

#[cfg(all(test, not(feature = "loom")))]
mod tests;


use core::fmt;

use crate::sync::{AtomicUsize, Ordering, yield_now};

/// High bit of the state word: an exclusive lease is wanted or held.
const EXCLUSIVE: usize = 1 << (usize::BITS - 1);

/// A shared/exclusive mutex in one atomic word.
///
/// Shared leases are concurrent; the exclusive lease is solitary and blocks
/// all shared traffic. The word is zero when the mutex is free.
///
/// # Example
///
/// ```
/// use lease::SharedMutex;
///
/// let mutex = SharedMutex::new();
/// {
///     let _read = mutex.lock_shared();
///     assert_eq!(mutex.use_count(), 1);
/// }
/// let _write = mutex.lock_exclusive();
/// assert_eq!(mutex.use_count(), 0);
/// ```
pub struct SharedMutex {
    state: AtomicUsize,
}

impl SharedMutex {
    /// Create a free mutex.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicUsize::new(0),
        }
    }

    /// Take a shared lease, waiting out any exclusive holder.
    ///
    /// The increment is optimistic: if the exclusive bit was set at the time,
    /// the acquisition retreats, spin-yields until the bit clears, and tries
    /// again. The lease is released when the guard drops.
    pub fn lock_shared(&self) -> SharedGuard<'_> {
        loop {
            let prev = self.state.fetch_add(1, Ordering::Acquire);
            if prev & EXCLUSIVE == 0 {
                return SharedGuard { mutex: self };
            }
            // Retreat: the word belongs to the exclusive waiter until it
            // clears the bit.
            self.state.fetch_sub(1, Ordering::Release);
            while self.state.load(Ordering::Relaxed) & EXCLUSIVE != 0 {
                yield_now();
            }
        }
    }

    /// Take the exclusive lease, waiting for the shared holder count to
    /// reach zero.
    ///
    /// Setting the bit first shuts out new shared leases, so the holder
    /// count can only drain. The lease is released when the guard drops.
    pub fn lock_exclusive(&self) -> ExclusiveGuard<'_> {
        while self.state.fetch_or(EXCLUSIVE, Ordering::Acquire) & EXCLUSIVE != 0 {
            yield_now();
        }
        // The bit is ours; wait out the shared leases that got in first.
        while self.state.load(Ordering::Acquire) & !EXCLUSIVE != 0 {
            yield_now();
        }
        ExclusiveGuard { mutex: self }
    }

    /// Current shared-holder count.
    ///
    /// A snapshot: acquisitions in flight may have bumped it already.
    #[inline]
    #[must_use]
    pub fn use_count(&self) -> usize {
        self.state.load(Ordering::Relaxed) & !EXCLUSIVE
    }
}

impl Default for SharedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = self.state.load(Ordering::Relaxed);
        f.debug_struct("SharedMutex")
            .field("exclusive", &(word & EXCLUSIVE != 0))
            .field("use_count", &(word & !EXCLUSIVE))
            .finish()
    }
}

/// RAII shared lease. Released on drop.
#[must_use = "the lease is released as soon as the guard is dropped"]
pub struct SharedGuard<'a> {
    mutex: &'a SharedMutex,
}

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        self.mutex.state.fetch_sub(1, Ordering::Release);
    }
}

/// RAII exclusive lease. Released on drop.
#[must_use = "the lease is released as soon as the guard is dropped"]
pub struct ExclusiveGuard<'a> {
    mutex: &'a SharedMutex,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        // Clearing the bit is the last action of the release; anything the
        // holder did is ordered before waiters observe the word as free.
        self.mutex.state.fetch_and(!EXCLUSIVE, Ordering::Release);
    }
}
