//! Atomic and scheduling shims shared by the workspace crates.
//!
//! With the `loom` feature enabled the re-exports switch to loom's
//! model-checked atomics, so the same code paths run under exhaustive
//! interleaving tests.

#[cfg(not(feature = "loom"))]
pub use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
#[cfg(feature = "loom")]
pub use loom::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Give up the scheduling quantum inside a spin loop.
///
/// Falls back to a spin hint when built without `std`.
#[inline]
pub fn yield_now() {
    #[cfg(feature = "loom")]
    loom::thread::yield_now();

    #[cfg(all(not(feature = "loom"), feature = "std"))]
    std::thread::yield_now();

    #[cfg(all(not(feature = "loom"), not(feature = "std")))]
    core::hint::spin_loop();
}
