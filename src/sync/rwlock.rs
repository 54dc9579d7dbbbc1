//! Scoped reader-writer lock.

/// A reader-writer lock guarding an embedded value: many concurrent readers
/// XOR one writer.
///
/// Acquisition is closure-scoped, so release is guaranteed on every exit
/// path including unwinding. The non-blocking forms return `None` when the
/// lock is contended; never busy-retry them in a loop - that defeats the
/// lock's fairness, fall back to the blocking forms instead. Writer
/// starvation is not prevented.
///
/// For a bare mutual-exclusion region with no embedded value, use
/// `RwLock::<()>::default()`.
pub struct RwLock<T> {
    inner: parking_lot::RwLock<T>,
}

impl<T> RwLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: parking_lot::RwLock::new(value),
        }
    }

    /// Run `body` with shared access, blocking until readable.
    pub fn read<R>(&self, body: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read();
        body(&guard)
    }

    /// Run `body` with exclusive access, blocking until writable.
    pub fn write<R>(&self, body: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        body(&mut guard)
    }

    /// Run `body` with shared access if immediately readable.
    pub fn try_read<R>(&self, body: impl FnOnce(&T) -> R) -> Option<R> {
        self.inner.try_read().map(|guard| body(&guard))
    }

    /// Run `body` with exclusive access if immediately writable.
    pub fn try_write<R>(&self, body: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner.try_write().map(|mut guard| body(&mut guard))
    }

    /// Consume the lock, returning the embedded value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Exclusive access through a unique reference; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}

impl<T: Default> Default for RwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RwLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Some(guard) => f.debug_struct("RwLock").field("value", &*guard).finish(),
            None => f.debug_struct("RwLock").field("value", &"<locked>").finish(),
        }
    }
}
