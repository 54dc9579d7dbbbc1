//! The serialized store engine.
//!
//! One mutex per store totally orders every state- and registry-mutating
//! operation: dispatch, install/uninstall, subscribe/unsubscribe, and reads
//! all pass through it, so registry changes never race a fan-out and no
//! torn read is possible. Callers block on `dispatch` only for one reducer
//! fold plus fan-out; pushes into subscriber channels are non-blocking, so
//! a slow consumer never stalls the dispatcher.

use crate::channel::Sender;
use crate::snapshot::Snapshot;
use crate::subscribers::{Driver, DriverInner, Streamer};
use crate::types::SubscriberId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything guarded by the store's serialization mutex.
struct Core<S, A> {
    /// The canonical state. Snapshots share this allocation.
    state: Arc<S>,
    reducer: Box<dyn Fn(&S, &A) -> S + Send>,
    /// Strongly-owned subscribers, in install order.
    drivers: Vec<Arc<DriverInner<S, A>>>,
    /// Weakly-owned subscribers: identity to channel, nothing else.
    streamers: HashMap<SubscriberId, Sender<Snapshot<S, A>>>,
}

/// Store internals shared between handles and snapshot back-references.
pub(crate) struct StoreShared<S, A> {
    core: Mutex<Core<S, A>>,
}

impl<S, A> StoreShared<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    /// The dispatch pipeline. Indivisible with every other store operation.
    pub(crate) fn dispatch_batch<I>(self: &Arc<Self>, actions: I)
    where
        I: IntoIterator<Item = A>,
    {
        let mut core = self.core.lock();

        // Fold the whole batch before touching canonical state, so a
        // panicking reducer leaves the previous state in place.
        let mut folded: Option<S> = None;
        let mut count = 0usize;
        for action in actions {
            let next = match folded.as_ref() {
                Some(current) => (core.reducer)(current, &action),
                None => (core.reducer)(&*core.state, &action),
            };
            folded = Some(next);
            count += 1;
        }

        // Empty batch: no state replacement, no notification.
        let new_state = match folded {
            Some(state) => Arc::new(state),
            None => return,
        };

        core.state = Arc::clone(&new_state);
        tracing::trace!(actions = count, "dispatched batch");

        // One snapshot per batch, shared by every subscriber.
        let snapshot = Snapshot::new(new_state, Arc::downgrade(self));

        core.drivers.retain(|driver| {
            let delivered = !driver.sender().push(snapshot.clone()).is_terminated();
            if !delivered {
                tracing::debug!(id = %driver.id(), "driver channel terminated, pruning");
            }
            delivered
        });

        core.streamers.retain(|id, sender| {
            let delivered = !sender.push(snapshot.clone()).is_terminated();
            if !delivered {
                tracing::debug!(id = %id, "streamer channel terminated, pruning");
            }
            delivered
        });
    }

    pub(crate) fn read(self: &Arc<Self>) -> Snapshot<S, A> {
        let core = self.core.lock();
        Snapshot::new(Arc::clone(&core.state), Arc::downgrade(self))
    }
}

/// A concurrency-safe, observable state container.
///
/// The store owns the canonical state and a pure reducer; every mutation is
/// serialized through the store's mutex and fanned out as one immutable
/// [`Snapshot`] to every live subscriber. The handle is cheap to clone and
/// share across threads.
///
/// ```
/// use surge::Store;
///
/// let store = Store::new(0i64, |state, action: &i64| state + action);
/// store.dispatch(1);
/// store.dispatch_all([2, 3]);
/// assert_eq!(*store.read().state(), 6);
/// ```
pub struct Store<S, A> {
    shared: Arc<StoreShared<S, A>>,
}

impl<S, A> Store<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    /// Create a store with an initial state and a pure reducer.
    ///
    /// The reducer must be total and side-effect-free; the engine trusts
    /// this and adds no protection against violation. A panicking reducer
    /// unwinds out of `dispatch` with canonical state unchanged.
    pub fn new<F>(initial: S, reducer: F) -> Self
    where
        F: Fn(&S, &A) -> S + Send + 'static,
    {
        Self {
            shared: Arc::new(StoreShared {
                core: Mutex::new(Core {
                    state: Arc::new(initial),
                    reducer: Box::new(reducer),
                    drivers: Vec::new(),
                    streamers: HashMap::new(),
                }),
            }),
        }
    }

    // --- Dispatch ---

    /// Dispatch one action: fold it into canonical state and deliver one
    /// snapshot to every subscriber before returning.
    pub fn dispatch(&self, action: A) {
        self.shared.dispatch_batch([action]);
    }

    /// Dispatch an ordered batch as a single transition.
    ///
    /// The batch coalesces to exactly one notification; an empty batch is
    /// a strict no-op (no state replacement, nothing delivered).
    pub fn dispatch_all<I>(&self, actions: I)
    where
        I: IntoIterator<Item = A>,
    {
        self.shared.dispatch_batch(actions);
    }

    // --- Reads ---

    /// Fresh snapshot of current state, usable without subscribing.
    pub fn read(&self) -> Snapshot<S, A> {
        self.shared.read()
    }

    /// Shared handle to the canonical state as of this instant.
    pub fn state(&self) -> Arc<S> {
        let core = self.shared.core.lock();
        Arc::clone(&core.state)
    }

    // --- Strong subscribers ---

    /// Install a driver. The store co-owns it until uninstalled or its
    /// channel terminates.
    ///
    /// The driver immediately receives a snapshot of the current state,
    /// then every subsequent dispatch. Installing an already-installed
    /// driver is a no-op, as is installing one whose channel has already
    /// terminated.
    pub fn install(&self, driver: &Driver<S, A>) {
        let mut core = self.shared.core.lock();
        if core.drivers.iter().any(|d| d.id() == driver.id()) {
            return;
        }
        let snapshot = Snapshot::new(Arc::clone(&core.state), Arc::downgrade(&self.shared));
        let inner = driver.shared();
        if !inner.sender().push(snapshot).is_terminated() {
            core.drivers.push(inner);
        }
    }

    /// Install several drivers under one serialization step. Each receives
    /// the same current-state snapshot.
    pub fn install_all(&self, drivers: &[Driver<S, A>]) {
        let mut core = self.shared.core.lock();
        let snapshot = Snapshot::new(Arc::clone(&core.state), Arc::downgrade(&self.shared));
        for driver in drivers {
            if core.drivers.iter().any(|d| d.id() == driver.id()) {
                continue;
            }
            let inner = driver.shared();
            if !inner.sender().push(snapshot.clone()).is_terminated() {
                core.drivers.push(inner);
            }
        }
    }

    /// Remove a driver, releasing the store's co-ownership. Idempotent.
    pub fn uninstall(&self, driver: &Driver<S, A>) {
        let mut core = self.shared.core.lock();
        core.drivers.retain(|d| d.id() != driver.id());
    }

    /// Point-in-time membership check.
    pub fn contains_driver(&self, driver: &Driver<S, A>) -> bool {
        let core = self.shared.core.lock();
        core.drivers.iter().any(|d| d.id() == driver.id())
    }

    /// Number of installed drivers.
    pub fn driver_count(&self) -> usize {
        self.shared.core.lock().drivers.len()
    }

    // --- Weak subscribers ---

    /// Subscribe a streamer. The store records only its identity and
    /// channel; the caller keeps ownership. Idempotent.
    ///
    /// The streamer immediately receives a snapshot of the current state.
    pub fn subscribe(&self, streamer: &Streamer<S, A>) {
        let mut core = self.shared.core.lock();
        if core.streamers.contains_key(&streamer.id()) {
            return;
        }
        let snapshot = Snapshot::new(Arc::clone(&core.state), Arc::downgrade(&self.shared));
        let sender = streamer.sender();
        if !sender.push(snapshot).is_terminated() {
            core.streamers.insert(streamer.id(), sender);
        }
    }

    /// Remove a streamer's mapping. Idempotent.
    pub fn unsubscribe(&self, streamer: &Streamer<S, A>) {
        let mut core = self.shared.core.lock();
        core.streamers.remove(&streamer.id());
    }

    /// Point-in-time membership check.
    pub fn contains_streamer(&self, streamer: &Streamer<S, A>) -> bool {
        let core = self.shared.core.lock();
        core.streamers.contains_key(&streamer.id())
    }

    /// Number of subscribed streamers.
    pub fn streamer_count(&self) -> usize {
        self.shared.core.lock().streamers.len()
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackpressurePolicy;

    fn counter_store() -> Store<i64, i64> {
        Store::new(0, |state, action| state + action)
    }

    #[test]
    fn test_sequential_dispatch() {
        let store = counter_store();
        store.dispatch(1);
        store.dispatch(1);
        store.dispatch(1);
        assert_eq!(*store.read().state(), 3);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let store = counter_store();
        let before = store.state();
        store.dispatch_all(std::iter::empty());
        // Not just equal: the canonical allocation is untouched.
        assert!(Arc::ptr_eq(&before, &store.state()));
    }

    #[test]
    fn test_batch_folds_in_order() {
        let store = Store::new(String::new(), |state: &String, action: &char| {
            let mut next = state.clone();
            next.push(*action);
            next
        });
        store.dispatch_all(['a', 'b', 'c']);
        assert_eq!(*store.read().state(), "abc");
    }

    #[test]
    fn test_install_is_idempotent() {
        let store = counter_store();
        let driver = Driver::unbounded();
        store.install(&driver);
        store.install(&driver);
        assert_eq!(store.driver_count(), 1);
    }

    #[test]
    fn test_uninstall_stops_delivery() {
        let store = counter_store();
        let driver = Driver::unbounded();
        store.install(&driver);
        store.dispatch(1);
        store.uninstall(&driver);
        store.dispatch(1);
        assert_eq!(*driver.recv().unwrap().state(), 0); // install snapshot
        assert_eq!(*driver.recv().unwrap().state(), 1);
        assert!(driver.try_recv().is_err());
        assert!(!store.contains_driver(&driver));
    }

    #[test]
    fn test_subscribe_unsubscribe_idempotent() {
        let store = counter_store();
        let streamer = Streamer::unbounded();
        store.subscribe(&streamer);
        store.subscribe(&streamer);
        assert_eq!(store.streamer_count(), 1);
        store.unsubscribe(&streamer);
        store.unsubscribe(&streamer);
        assert_eq!(store.streamer_count(), 0);
    }

    #[test]
    fn test_finished_driver_self_prunes() {
        let store = counter_store();
        let driver = Driver::new(BackpressurePolicy::Unbounded);
        store.install(&driver);
        driver.finish();
        store.dispatch(1);
        assert!(!store.contains_driver(&driver));
        assert_eq!(store.driver_count(), 0);
    }

    #[test]
    fn test_install_terminated_driver_is_noop() {
        let store = counter_store();
        let driver = Driver::unbounded();
        driver.finish();
        store.install(&driver);
        assert!(!store.contains_driver(&driver));
        assert_eq!(store.driver_count(), 0);
    }

    #[test]
    fn test_install_delivers_current_state() {
        let store = counter_store();
        store.dispatch(9);
        let driver = Driver::unbounded();
        store.install(&driver);
        assert_eq!(*driver.recv().unwrap().state(), 9);
    }

    #[test]
    fn test_dropped_streamer_self_prunes() {
        let store = counter_store();
        let streamer = Streamer::unbounded();
        store.subscribe(&streamer);
        drop(streamer);
        store.dispatch(1);
        assert_eq!(store.streamer_count(), 0);
    }

    #[test]
    fn test_snapshot_dispatch_round_trip() {
        let store = counter_store();
        let snapshot = store.read();
        snapshot.dispatch(5);
        assert_eq!(*store.read().state(), 5);
    }

    #[test]
    fn test_snapshot_outlives_store_safely() {
        let store = counter_store();
        store.dispatch(2);
        let snapshot = store.read();
        drop(store);
        assert!(!snapshot.is_live());
        // Must not panic, must not do anything.
        snapshot.dispatch(7);
        assert_eq!(*snapshot.state(), 2);
    }

    #[test]
    fn test_snapshot_equality_by_instance() {
        let store = counter_store();
        let a = store.read();
        let b = store.read();
        assert_eq!(*a.state(), *b.state());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
