//! A bounded-but-growable MPMC queue built on a slab of tagged slots.
//!
//! [`Fifo`] is the job-queue building block: producers claim a slot index
//! with one atomic increment, consumers claim a published slot with one
//! compare-and-set, and a shared/exclusive mutex (from `lease`) fences the
//! rare structural operations (slab growth, counter reset) away from that
//! fast path.
//!
//! Delivery is exactly-once per item; global FIFO order is approximate.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod error;
mod fifo;
mod slot;

#[cfg(all(test, not(feature = "loom")))]
mod tests;


pub use error::PushError;
pub use fifo::{DEFAULT_CAPACITY, Fifo};
