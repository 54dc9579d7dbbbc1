//! Subscriber handles: strongly-owned drivers and weakly-owned streamers.
//!
//! Both kinds consume snapshots from their own output channel; they differ
//! only in who keeps the channel alive. A [`Driver`] shares its inner with
//! the store on install, so the store co-owns it until uninstalled. A
//! [`Streamer`] is solely owned by the caller - the store records only its
//! id and a sender, so dropping the handle terminates the channel and the
//! store prunes the entry at its next fan-out.

use crate::channel::{channel, Iter, Receiver, Sender};
use crate::error::{RecvError, RecvTimeoutError, TryRecvError};
use crate::snapshot::Snapshot;
use crate::types::{BackpressurePolicy, SubscriberId};
use std::sync::Arc;
use std::time::Duration;

pub(crate) struct DriverInner<S, A> {
    id: SubscriberId,
    sender: Sender<Snapshot<S, A>>,
    receiver: Receiver<Snapshot<S, A>>,
}

/// A strongly-owned subscriber.
///
/// Once installed, the store co-owns the driver: dropping the caller's
/// handle does not stop delivery, and buffered snapshots keep accumulating
/// per the channel policy until the driver is uninstalled or its channel
/// terminates. Clones share identity and the underlying channel.
pub struct Driver<S, A> {
    inner: Arc<DriverInner<S, A>>,
}

impl<S, A> Driver<S, A> {
    /// Create a driver with the given channel policy.
    pub fn new(policy: BackpressurePolicy) -> Self {
        let (sender, receiver) = channel(policy);
        Self {
            inner: Arc::new(DriverInner {
                id: SubscriberId::next(),
                sender,
                receiver,
            }),
        }
    }

    /// Create a driver that never drops a snapshot.
    pub fn unbounded() -> Self {
        Self::new(BackpressurePolicy::Unbounded)
    }

    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Terminate this driver's channel. The store notices at its next
    /// fan-out and removes the driver.
    pub fn finish(&self) {
        self.inner.sender.finish();
    }

    /// Receive the next snapshot, blocking.
    pub fn recv(&self) -> Result<Snapshot<S, A>, RecvError> {
        self.inner.receiver.recv()
    }

    /// Receive without blocking.
    pub fn try_recv(&self) -> Result<Snapshot<S, A>, TryRecvError> {
        self.inner.receiver.try_recv()
    }

    /// Receive with a deadline.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Snapshot<S, A>, RecvTimeoutError> {
        self.inner.receiver.recv_timeout(timeout)
    }

    /// Blocking iterator over delivered snapshots.
    pub fn iter(&self) -> Iter<'_, Snapshot<S, A>> {
        self.inner.receiver.iter()
    }

    pub(crate) fn shared(&self) -> Arc<DriverInner<S, A>> {
        Arc::clone(&self.inner)
    }
}

impl<S, A> DriverInner<S, A> {
    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn sender(&self) -> &Sender<Snapshot<S, A>> {
        &self.sender
    }
}

impl<S, A> Clone for Driver<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A weakly-owned subscriber.
///
/// The caller owns the streamer's lifetime; the store holds only an
/// identity-to-sender mapping. Dropping the handle terminates the channel,
/// and the store self-prunes the mapping the next time it pushes - the
/// store is never the sole reference keeping a streamer alive.
pub struct Streamer<S, A> {
    id: SubscriberId,
    sender: Sender<Snapshot<S, A>>,
    receiver: Receiver<Snapshot<S, A>>,
}

impl<S, A> Streamer<S, A> {
    /// Create a streamer with the given channel policy.
    pub fn new(policy: BackpressurePolicy) -> Self {
        let (sender, receiver) = channel(policy);
        Self {
            id: SubscriberId::next(),
            sender,
            receiver,
        }
    }

    /// Create a streamer that never drops a snapshot.
    pub fn unbounded() -> Self {
        Self::new(BackpressurePolicy::Unbounded)
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Terminate this streamer's channel without dropping the handle.
    pub fn finish(&self) {
        self.sender.finish();
    }

    /// Receive the next snapshot, blocking.
    pub fn recv(&self) -> Result<Snapshot<S, A>, RecvError> {
        self.receiver.recv()
    }

    /// Receive without blocking.
    pub fn try_recv(&self) -> Result<Snapshot<S, A>, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with a deadline.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Snapshot<S, A>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Blocking iterator over delivered snapshots.
    pub fn iter(&self) -> Iter<'_, Snapshot<S, A>> {
        self.receiver.iter()
    }

    pub(crate) fn sender(&self) -> Sender<Snapshot<S, A>> {
        self.sender.clone()
    }
}
