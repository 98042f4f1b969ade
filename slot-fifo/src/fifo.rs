//! Bounded-but-growable MPMC queue over a slab of tagged slots.

use alloc::vec::Vec;
use core::cell::UnsafeCell;
use core::fmt;

use lease::sync::{AtomicUsize, Ordering, yield_now};
use lease::{SharedGuard, SharedMutex};

use crate::error::PushError;
use crate::slot::{Slot, SlotState};

/// Slab capacity used by [`Fifo::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

/// A multi-producer multi-consumer queue that stays off conventional locks
/// on its fast path.
///
/// A producer claims a slot index with one atomic increment, then writes the
/// payload and publishes it under a shared lease. A consumer scans the
/// published region for a `Ready` slot, claims it with one compare-and-set,
/// and retires drained slots as the read counter advances. The rare
/// structural operations need exclusive access: slab growth and the counter
/// reset take the exclusive lease of a [`SharedMutex`], which shuts out all
/// slot traffic for their duration, and [`clear`](Self::clear) takes
/// `&mut self`.
///
/// Every pushed value is delivered exactly once, but global FIFO order is
/// approximate: concurrent producers may publish out of claim order, and
/// consumers skip past slots that are still mid-publish.
///
/// # Example
///
/// ```
/// use slot_fifo::Fifo;
///
/// let queue = Fifo::new();
/// queue.push(7).unwrap();
/// queue.push(9).unwrap();
/// assert_eq!(queue.pop(), Some(7));
/// assert_eq!(queue.pop(), Some(9));
/// assert_eq!(queue.pop(), None);
/// assert!(queue.is_empty());
/// ```
pub struct Fifo<T> {
    /// Backing slots. Reallocated only under the exclusive lease; slot cells
    /// are reached through short-lived references while a lease is held.
    slab: UnsafeCell<Vec<Slot<T>>>,
    /// Published slab capacity, always equal to `slab.len()`. Read without a
    /// lease by producers racing the grow protocol.
    size: AtomicUsize,
    /// Index of the next unretired slot.
    read: AtomicUsize,
    /// Next index to claim for producing.
    write: AtomicUsize,
    lock: SharedMutex,
}

// SAFETY: slot access follows the lease discipline. A slot's value cell has
// a single writer (the producer that claimed its index) before `Ready` and a
// single reader (the consumer that won the `Ready -> Done` claim) after, and
// the slab vector itself is only reallocated under the exclusive lease.
unsafe impl<T: Send> Send for Fifo<T> {}
unsafe impl<T: Send> Sync for Fifo<T> {}

impl<T> Fifo<T> {
    /// Create an empty queue with the default slab capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty queue with at least `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        let mut slab = Vec::new();
        slab.resize_with(capacity, Slot::new);
        Self {
            slab: UnsafeCell::new(slab),
            size: AtomicUsize::new(capacity),
            read: AtomicUsize::new(0),
            write: AtomicUsize::new(0),
            lock: SharedMutex::new(),
        }
    }

    /// Enqueue one value.
    ///
    /// Claims the next write index with a single atomic increment, growing
    /// the slab first when the claim lands at or past the current capacity.
    /// Fails only when the write counter itself is exhausted; the value is
    /// handed back untouched and the queue is unchanged.
    pub fn push(&self, value: T) -> Result<(), PushError<T>> {
        let mut observed = self.write.load(Ordering::SeqCst);
        let claimed = loop {
            let Some(next) = observed.checked_add(1) else {
                return Err(PushError::Overflow(value));
            };
            match self
                .write
                .compare_exchange_weak(observed, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break observed,
                Err(current) => observed = current,
            }
        };

        loop {
            let size = self.size.load(Ordering::Acquire);
            if claimed < size {
                break;
            }
            if claimed == size {
                self.grow(claimed);
            } else {
                yield_now();
            }
        }

        let _shared = self.lock.lock_shared();
        // SAFETY: `claimed < size`, the slab never shrinks, and the shared
        // lease keeps the vector in place.
        let slot = unsafe { &(&*self.slab.get())[claimed] };
        // SAFETY: the claim made this thread the slot's unique writer, and
        // the slot is invisible to consumers until the `Ready` store below.
        unsafe { (*slot.value.get()).write(value) };
        slot.state.store(SlotState::Ready, Ordering::Release);
        Ok(())
    }

    /// Dequeue one value, if any slot in the published region is consumable.
    ///
    /// Non-blocking: returns `None` when nothing is visible. Consumers scan
    /// upward from the read counter rather than claiming it, so a slot whose
    /// producer is still mid-publish is skipped instead of waited on.
    pub fn pop(&self) -> Option<T> {
        let mut shared = self.lock.lock_shared();

        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        if read >= write {
            return None;
        }

        let size = self.size.load(Ordering::Acquire);
        let until = write.min(size);
        for index in read..until {
            // SAFETY: `index < size` and the shared lease keeps the vector
            // in place.
            let slot = unsafe { &(&*self.slab.get())[index] };
            if slot.state.load(Ordering::Acquire) != SlotState::Ready {
                continue;
            }
            if !slot.state.transition(SlotState::Ready, SlotState::Done) {
                continue;
            }
            // SAFETY: winning the `Ready -> Done` claim makes this thread
            // the slot's unique reader, and the producer's release store on
            // the tag ordered the payload write before it.
            let value = unsafe { (*slot.value.get()).assume_init_read() };
            if index == self.read.load(Ordering::Acquire) {
                shared = self.advance_read(index, shared);
            }
            drop(shared);
            return Some(value);
        }
        None
    }

    /// Drain the queue into `sink` by repeated [`pop`](Self::pop).
    pub fn pop_all<E>(&self, sink: &mut E)
    where
        E: Extend<T>,
    {
        sink.extend(core::iter::from_fn(|| self.pop()));
    }

    /// Discard every pending item and reset the queue to empty.
    ///
    /// Payloads of published-but-unconsumed slots are dropped. Callers that
    /// need them should drain with [`pop_all`](Self::pop_all) first.
    ///
    /// Takes `&mut self`: rewinding the write counter is only sound when no
    /// producer holds a claimed-but-unpublished index, and the exclusive
    /// borrow is the proof. (The drained-queue reset in `pop` needs no such
    /// proof because `read == write` already implies claim quiescence.)
    pub fn clear(&mut self) {
        let slab = self.slab.get_mut();
        for slot in slab.iter() {
            if slot.state.load(Ordering::Acquire) == SlotState::Ready {
                // SAFETY: `&mut self` excludes every other thread, and
                // `Ready` slots hold an initialized payload.
                unsafe { (*slot.value.get()).assume_init_drop() };
            }
            slot.state.store(SlotState::Empty, Ordering::Release);
        }
        self.write.store(0, Ordering::SeqCst);
        self.read.store(0, Ordering::SeqCst);
    }

    /// `true` when every claimed index has been retired.
    ///
    /// A snapshot hint: it may be stale by the time the caller acts on it.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read.load(Ordering::Acquire) >= self.write.load(Ordering::Acquire)
    }

    /// Number of claimed-but-unretired indices.
    ///
    /// Counts slots that are still mid-publish as well as published ones; a
    /// snapshot hint like [`is_empty`](Self::is_empty).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        write.saturating_sub(read)
    }

    /// Current slab capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Slab expansion for the producer whose claim landed exactly on the
    /// current capacity. Claims past the boundary wait in `push` until the
    /// published size covers them; this serializes growth no matter how many
    /// producers race past the boundary at once.
    #[cold]
    fn grow(&self, claimed: usize) {
        let _exclusive = self.lock.lock_exclusive();
        // SAFETY: the exclusive lease shuts out every slot access and every
        // other structural mutation, so the vector may be reallocated.
        let slab = unsafe { &mut *self.slab.get() };
        if slab.len() > claimed {
            return;
        }
        let mut new_size = slab.len().max(1) * 2;
        while new_size <= claimed {
            new_size *= 2;
        }
        slab.resize_with(new_size, Slot::new);
        self.size.store(new_size, Ordering::Release);
    }

    /// Retire the contiguous run of `Done` slots starting at the slot this
    /// consumer just drained, advancing the read counter across it.
    ///
    /// When the walk drains the queue, the counters are reset. That needs
    /// the exclusive lease, so the shared lease is given up for the duration;
    /// upgrading in place would deadlock against the exclusive acquirer
    /// waiting for the holder count to reach zero.
    fn advance_read<'a>(&'a self, start: usize, shared: SharedGuard<'a>) -> SharedGuard<'a> {
        let size = self.size.load(Ordering::Acquire);
        let mut index = start;
        while index < size {
            // SAFETY: `index < size` and the shared lease keeps the vector
            // in place.
            let slot = unsafe { &(&*self.slab.get())[index] };
            if !slot.state.transition(SlotState::Done, SlotState::Empty) {
                break;
            }
            self.read.fetch_add(1, Ordering::AcqRel);
            index += 1;
        }

        if self.read.load(Ordering::Acquire) == self.write.load(Ordering::Acquire) {
            drop(shared);
            self.reset_counters();
            return self.lock.lock_shared();
        }
        shared
    }

    /// Zero both counters once the queue has drained. This bounds counter
    /// growth under steady churn, keeping exhaustion out of the normal
    /// operating regime, and reuses the slab from index zero.
    #[cold]
    fn reset_counters(&self) {
        let _exclusive = self.lock.lock_exclusive();
        let write = self.write.load(Ordering::Acquire);
        if self.read.load(Ordering::Acquire) != write {
            return;
        }
        // Producers claim indices without a lease, so the zeroing races any
        // late claim: the reset is forfeited unless `write` still holds the
        // drained value.
        if self
            .write
            .compare_exchange(write, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.read.store(0, Ordering::Release);
        }
    }
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Fifo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fifo")
            .field("read", &self.read.load(Ordering::Relaxed))
            .field("write", &self.write.load(Ordering::Relaxed))
            .field("capacity", &self.size.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> Drop for Fifo<T> {
    fn drop(&mut self) {
        let slab = self.slab.get_mut();
        for slot in slab.iter() {
            if slot.state.load(Ordering::Acquire) == SlotState::Ready {
                // SAFETY: `&mut self` excludes every other thread, and
                // `Ready` slots hold an initialized payload.
                unsafe { (*slot.value.get()).assume_init_drop() };
            }
        }
    }
}

#[cfg(all(test, not(feature = "loom")))]
impl<T> Fifo<T> {
    /// Test hook: place both counters to exercise overflow and reset edges.
    pub(crate) fn set_counters(&self, read: usize, write: usize) {
        self.read.store(read, Ordering::SeqCst);
        self.write.store(write, Ordering::SeqCst);
    }

    /// Test hook: `true` when every slot in the slab carries no tag.
    pub(crate) fn slots_all_empty(&self) -> bool {
        let _shared = self.lock.lock_shared();
        // SAFETY: the shared lease keeps the vector in place.
        let slab = unsafe { &*self.slab.get() };
        slab.iter()
            .all(|slot| slot.state.load(Ordering::Acquire) == SlotState::Empty)
    }
}
