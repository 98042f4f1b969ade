//! Error type for queue operations.

use core::fmt;

/// Error returned by [`Fifo::push`](crate::Fifo::push).
///
/// Carries the rejected value back to the caller, so a failed push loses
/// nothing.
pub enum PushError<T> {
    /// The next claim of the write counter would wrap.
    Overflow(T),
}

impl<T> PushError<T> {
    /// Recover the value that could not be enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            PushError::Overflow(value) => value,
        }
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Overflow(_) => f.pad("Overflow(..)"),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Overflow(_) => f.pad("write counter exhausted"),
        }
    }
}

impl<T> core::error::Error for PushError<T> {}
