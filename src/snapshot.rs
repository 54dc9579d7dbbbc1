//! Immutable state snapshots carrying a bound dispatch capability.

use crate::store::StoreShared;
use crate::types::SnapshotId;
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// An immutable view of store state at one instant, plus the capability to
/// dispatch further actions into the owning store.
///
/// The back-reference to the store is non-owning: holding a snapshot never
/// keeps the store alive, and dispatching through a snapshot whose store is
/// gone is a safe no-op.
///
/// Equality is by construction instant, not state content: every completed
/// dispatch (and every [`Store::read`](crate::Store::read)) produces a
/// snapshot with a fresh id, and two snapshots with equal state need not be
/// equal. Clones share the originating instant's id.
pub struct Snapshot<S, A> {
    id: SnapshotId,
    state: Arc<S>,
    store: Weak<StoreShared<S, A>>,
}

impl<S, A> Snapshot<S, A> {
    pub(crate) fn new(state: Arc<S>, store: Weak<StoreShared<S, A>>) -> Self {
        Self {
            id: SnapshotId::next(),
            state,
            store,
        }
    }

    /// Identity of this notification instance.
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    /// The captured state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Shared handle to the captured state.
    pub fn state_arc(&self) -> Arc<S> {
        Arc::clone(&self.state)
    }

    /// True while the originating store is still alive.
    pub fn is_live(&self) -> bool {
        self.store.strong_count() > 0
    }
}

impl<S, A> Snapshot<S, A>
where
    S: Send + Sync + 'static,
    A: 'static,
{
    /// Dispatch one action into the owning store.
    ///
    /// No-op if the store has been dropped.
    pub fn dispatch(&self, action: A) {
        self.dispatch_all([action]);
    }

    /// Dispatch an ordered batch into the owning store as a single
    /// transition.
    ///
    /// No-op if the store has been dropped.
    pub fn dispatch_all<I>(&self, actions: I)
    where
        I: IntoIterator<Item = A>,
    {
        match self.store.upgrade() {
            Some(shared) => shared.dispatch_batch(actions),
            None => tracing::trace!("dispatch through snapshot of dropped store ignored"),
        }
    }
}

impl<S, A> Clone for Snapshot<S, A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: Arc::clone(&self.state),
            store: Weak::clone(&self.store),
        }
    }
}

impl<S, A> Deref for Snapshot<S, A> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S, A> PartialEq for Snapshot<S, A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S, A> Eq for Snapshot<S, A> {}

impl<S, A> std::hash::Hash for Snapshot<S, A> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<S: std::fmt::Debug, A> std::fmt::Debug for Snapshot<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("state", &*self.state)
            .finish()
    }
}
