//! Exclusive, non-reentrant spin lock.
//!
//! Preferred over the reader-writer lock for brief, allocation-free
//! critical sections that can live inline in a struct. The lock tracks its
//! owning thread, so reentrant acquisition and foreign unlock are caught
//! as contract violations (panics) instead of deadlocking silently.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Owner word value while unlocked.
const UNLOCKED: usize = 0;

/// Spins between yields; beyond this the holder is likely descheduled.
const SPINS_BEFORE_YIELD: u32 = 64;

/// A per-thread token, nonzero and unique among live threads.
fn thread_token() -> usize {
    thread_local! {
        static TOKEN: u8 = const { 0 };
    }
    TOKEN.with(|slot| slot as *const u8 as usize)
}

/// A raw exclusive spin lock with owner tracking.
///
/// Not reentrant: a blocking `lock` from the holding thread panics, as
/// does unlocking from a thread that does not hold the lock. The
/// conditional forms (`try_lock`, `lock_if_available`) instead decline
/// when the lock is held, whoever the holder is.
pub struct SpinLock {
    owner: AtomicUsize,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            owner: AtomicUsize::new(UNLOCKED),
        }
    }

    /// Acquire, spinning until available.
    pub fn lock(&self) {
        let token = thread_token();
        self.assert_not_owner();

        let mut spins = 0u32;
        while self
            .owner
            .compare_exchange_weak(UNLOCKED, token, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            spins += 1;
            if spins >= SPINS_BEFORE_YIELD {
                spins = 0;
                std::thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        }
    }

    /// Release. Panics if the calling thread is not the holder.
    pub fn unlock(&self) {
        let token = thread_token();
        if self
            .owner
            .compare_exchange(token, UNLOCKED, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            panic!("SpinLock::unlock called by a thread that does not hold the lock");
        }
    }

    /// Acquire without spinning. Returns `false` when the lock is held -
    /// by anyone, including the calling thread.
    pub fn try_lock(&self) -> bool {
        self.owner
            .compare_exchange(UNLOCKED, thread_token(), Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Run `body` under the lock, blocking until acquired.
    pub fn with_lock<R>(&self, body: impl FnOnce() -> R) -> R {
        self.lock();
        let _release = Release(self);
        body()
    }

    /// Run `body` only if the lock is immediately available; returns `None`
    /// without running `body` when it is already held.
    pub fn lock_if_available<R>(&self, body: impl FnOnce() -> R) -> Option<R> {
        if !self.try_lock() {
            return None;
        }
        let _release = Release(self);
        Some(body())
    }

    /// Panic unless the calling thread holds the lock.
    pub fn assert_owner(&self) {
        if self.owner.load(Ordering::Relaxed) != thread_token() {
            panic!("SpinLock owner assertion failed: calling thread does not hold the lock");
        }
    }

    /// Panic if the calling thread holds the lock (reentry guard).
    pub fn assert_not_owner(&self) {
        if self.owner.load(Ordering::Relaxed) == thread_token() {
            panic!("SpinLock is not reentrant: calling thread already holds the lock");
        }
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Unlocks on drop so scoped acquisition releases on unwind too.
struct Release<'a>(&'a SpinLock);

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.0.unlock();
    }
}

/// A value guarded by a [`SpinLock`].
pub struct SpinMutex<T> {
    lock: SpinLock,
    value: UnsafeCell<T>,
}

// Exclusive access to `value` is enforced by `lock`.
unsafe impl<T: Send> Sync for SpinMutex<T> {}
unsafe impl<T: Send> Send for SpinMutex<T> {}

impl<T> SpinMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            lock: SpinLock::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Run `body` with exclusive access, blocking until acquired.
    pub fn with_lock<R>(&self, body: impl FnOnce(&mut T) -> R) -> R {
        self.lock.with_lock(|| body(unsafe { &mut *self.value.get() }))
    }

    /// Run `body` with exclusive access only if immediately available.
    pub fn lock_if_available<R>(&self, body: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.lock
            .lock_if_available(|| body(unsafe { &mut *self.value.get() }))
    }

    /// Consume the mutex, returning the embedded value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Exclusive access through a unique reference; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}
