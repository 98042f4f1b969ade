//! Slot storage: one payload cell plus its atomically transitioned tag.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

use lease::sync::{AtomicU8, Ordering};

/// Lifecycle tag of one slot.
///
/// A slot starts `Empty`, is published `Ready` by the producer that claimed
/// its index, is claimed `Done` by exactly one consumer, and is retired back
/// to `Empty` when the read counter advances across it. Only the
/// `Ready -> Done` transition is contended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum SlotState {
    /// No payload: never written, or already retired.
    Empty = 0,
    /// Payload written and visible to consumers.
    Ready = 1,
    /// Payload taken by a consumer (or the index skipped); awaiting retirement.
    Done = 2,
}

pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: SlotState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn load(&self, order: Ordering) -> SlotState {
        decode(self.0.load(order))
    }

    #[inline]
    pub(crate) fn store(&self, state: SlotState, order: Ordering) {
        self.0.store(state as u8, order);
    }

    /// Compare-and-set `from -> to`. Acquire/release on success.
    #[inline]
    pub(crate) fn transition(&self, from: SlotState, to: SlotState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}

#[inline]
fn decode(bits: u8) -> SlotState {
    match bits {
        0 => SlotState::Empty,
        1 => SlotState::Ready,
        _ => SlotState::Done,
    }
}

/// One cell of the queue's slab.
pub(crate) struct Slot<T> {
    pub(crate) value: UnsafeCell<MaybeUninit<T>>,
    pub(crate) state: AtomicState,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: UnsafeCell::new(MaybeUninit::uninit()),
            state: AtomicState::new(SlotState::Empty),
        }
    }
}
