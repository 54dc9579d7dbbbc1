//! Shared identity and policy types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter backing [`SubscriberId`] allocation.
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide counter backing [`SnapshotId`] allocation.
static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a subscriber (driver or streamer).
///
/// Identity is per-handle, never derived from buffered content: two
/// subscribers watching the same store are distinct, and clones of one
/// handle share the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

impl SubscriberId {
    pub(crate) fn next() -> Self {
        SubscriberId(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// Unique identity of one constructed snapshot.
///
/// Snapshot equality compares this id only, so consumers can deduplicate
/// notification *instances* independently of state *content*.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SnapshotId(pub u64);

impl SnapshotId {
    pub(crate) fn next() -> Self {
        SnapshotId(NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a channel does when its consumer lags its producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackpressurePolicy {
    /// Never drop; the buffer grows without bound.
    Unbounded,
    /// Keep at most `n` buffered values; evict the earliest to admit a new one.
    DropOldest(usize),
    /// Keep at most `n` buffered values; refuse the incoming value when full.
    DropNewest(usize),
}

impl BackpressurePolicy {
    /// Buffer capacity, `None` for unbounded.
    ///
    /// A bounded capacity of zero is normalized to one: a zero-capacity
    /// non-blocking channel could never deliver anything.
    pub fn capacity(&self) -> Option<usize> {
        match *self {
            BackpressurePolicy::Unbounded => None,
            BackpressurePolicy::DropOldest(n) | BackpressurePolicy::DropNewest(n) => {
                Some(n.max(1))
            }
        }
    }
}

impl Default for BackpressurePolicy {
    fn default() -> Self {
        BackpressurePolicy::Unbounded
    }
}

/// Outcome of a non-blocking channel push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushResult {
    /// The value was buffered (possibly after evicting an older one).
    Delivered,
    /// The policy refused the incoming value.
    Dropped,
    /// The channel is terminated; the value was discarded.
    Terminated,
}

impl PushResult {
    /// True once the channel will never accept another value.
    pub fn is_terminated(&self) -> bool {
        matches!(self, PushResult::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_ids_unique() {
        let a = SubscriberId::next();
        let b = SubscriberId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_capacity_normalized() {
        assert_eq!(BackpressurePolicy::DropOldest(0).capacity(), Some(1));
        assert_eq!(BackpressurePolicy::DropNewest(0).capacity(), Some(1));
        assert_eq!(BackpressurePolicy::Unbounded.capacity(), None);
    }
}
