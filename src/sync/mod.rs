//! Synchronization primitives shared across the crate.
//!
//! - **`lock`**: a reference-counted lock that keeps itself alive while held,
//!   with exclusive and reentrant acquisition disciplines.

pub mod lock;

pub use lock::{Discipline, Lock, LockGuard, OptionalLock};
