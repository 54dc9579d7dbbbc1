//! Synchronization primitives: a scoped reader-writer lock and an
//! exclusive, non-reentrant spin lock.
//!
//! These are peer utilities for the same problem class as the store, not
//! something the store's own serialization depends on.

pub mod rwlock;
pub mod spinlock;

pub use rwlock::RwLock;
pub use spinlock::{SpinLock, SpinMutex};
