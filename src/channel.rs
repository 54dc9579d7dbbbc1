//! Output channel: a non-blocking push / blocking pull pipe with a
//! configurable backpressure policy.
//!
//! One channel carries snapshots from the store to one logical consumer.
//! Producers never block: when the consumer lags, the policy decides whether
//! the buffer grows, the oldest buffered value is evicted, or the incoming
//! value is refused. Termination is one-way and final - either the producer
//! calls [`Sender::finish`] or the consumer drops its [`Receiver`]; after
//! that every push reports [`PushResult::Terminated`].

use crate::error::{RecvError, RecvTimeoutError, TryRecvError};
use crate::types::{BackpressurePolicy, PushResult};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Queue state guarded by the channel mutex.
struct Queue<T> {
    buffer: VecDeque<T>,
    /// Producer called `finish`. Buffered values remain drainable.
    finished: bool,
    /// Receiver handle still exists.
    receiver_alive: bool,
}

/// State shared by all handles of one channel.
struct Shared<T> {
    queue: Mutex<Queue<T>>,
    /// Signalled when a value arrives or the channel terminates.
    available: Condvar,
    policy: BackpressurePolicy,
    /// Live `Sender` handles; the last one to drop finishes the channel.
    senders: AtomicUsize,
}

impl<T> Shared<T> {
    fn finish(&self) {
        let mut queue = self.queue.lock();
        if !queue.finished {
            queue.finished = true;
            self.available.notify_all();
        }
    }
}

/// Create a channel with the given backpressure policy.
pub fn channel<T>(policy: BackpressurePolicy) -> (Sender<T>, Receiver<T>) {
    let shared = Arc::new(Shared {
        queue: Mutex::new(Queue {
            buffer: VecDeque::new(),
            finished: false,
            receiver_alive: true,
        }),
        available: Condvar::new(),
        policy,
        senders: AtomicUsize::new(1),
    });
    (
        Sender {
            shared: Arc::clone(&shared),
        },
        Receiver { shared },
    )
}

/// Producing half of an output channel.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Sender<T> {
    /// Push a value without blocking.
    ///
    /// Under `DropOldest` the earliest buffered value is evicted to admit
    /// this one (the push itself reports `Delivered`); under `DropNewest`
    /// a full buffer refuses this value with `Dropped`.
    pub fn push(&self, value: T) -> PushResult {
        let mut queue = self.shared.queue.lock();

        if queue.finished || !queue.receiver_alive {
            return PushResult::Terminated;
        }

        if let Some(capacity) = self.shared.policy.capacity() {
            if queue.buffer.len() >= capacity {
                match self.shared.policy {
                    BackpressurePolicy::DropOldest(_) => {
                        queue.buffer.pop_front();
                        tracing::trace!("channel full, evicted oldest buffered value");
                    }
                    BackpressurePolicy::DropNewest(_) => {
                        tracing::trace!("channel full, refused incoming value");
                        return PushResult::Dropped;
                    }
                    BackpressurePolicy::Unbounded => unreachable!(),
                }
            }
        }

        queue.buffer.push_back(value);
        self.shared.available.notify_one();
        PushResult::Delivered
    }

    /// Terminate the channel. Idempotent.
    ///
    /// Already-buffered values remain drainable by the consumer; only new
    /// pushes are refused.
    pub fn finish(&self) {
        self.shared.finish();
    }

    /// True once the channel will never accept another push.
    pub fn is_terminated(&self) -> bool {
        let queue = self.shared.queue.lock();
        queue.finished || !queue.receiver_alive
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::Relaxed);
        Sender {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.finish();
        }
    }
}

/// Consuming half of an output channel.
///
/// There is one logical consumer per channel; the receiver is not cloneable.
/// Dropping it terminates the channel, which producers observe as
/// `PushResult::Terminated` on their next push.
pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Receiver<T> {
    /// Receive the next value, blocking until one arrives or the channel
    /// terminates and drains.
    pub fn recv(&self) -> Result<T, RecvError> {
        let mut queue = self.shared.queue.lock();
        loop {
            if let Some(value) = queue.buffer.pop_front() {
                return Ok(value);
            }
            if queue.finished {
                return Err(RecvError);
            }
            self.shared.available.wait(&mut queue);
        }
    }

    /// Receive without blocking.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut queue = self.shared.queue.lock();
        if let Some(value) = queue.buffer.pop_front() {
            Ok(value)
        } else if queue.finished {
            Err(TryRecvError::Terminated)
        } else {
            Err(TryRecvError::Empty)
        }
    }

    /// Receive with a deadline.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.shared.queue.lock();
        loop {
            if let Some(value) = queue.buffer.pop_front() {
                return Ok(value);
            }
            if queue.finished {
                return Err(RecvTimeoutError::Terminated);
            }
            if self
                .shared
                .available
                .wait_until(&mut queue, deadline)
                .timed_out()
            {
                return match queue.buffer.pop_front() {
                    Some(value) => Ok(value),
                    None => Err(RecvTimeoutError::Timeout),
                };
            }
        }
    }

    /// Blocking iterator over remaining values, ending when the channel
    /// terminates and drains.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { receiver: self }
    }

    /// Number of currently buffered values.
    pub fn len(&self) -> usize {
        self.shared.queue.lock().buffer.len()
    }

    /// True if nothing is currently buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        let mut queue = self.shared.queue.lock();
        queue.receiver_alive = false;
        // Unreachable values are released now rather than at last-sender drop.
        queue.buffer.clear();
    }
}

/// Blocking iterator returned by [`Receiver::iter`].
pub struct Iter<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.recv().ok()
    }
}

impl<'a, T> IntoIterator for &'a Receiver<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_push_then_recv_fifo() {
        let (tx, rx) = channel(BackpressurePolicy::Unbounded);
        assert_eq!(tx.push(1), PushResult::Delivered);
        assert_eq!(tx.push(2), PushResult::Delivered);
        assert_eq!(tx.push(3), PushResult::Delivered);
        assert_eq!(rx.recv(), Ok(1));
        assert_eq!(rx.recv(), Ok(2));
        assert_eq!(rx.recv(), Ok(3));
    }

    #[test]
    fn test_drop_oldest_evicts_head() {
        let (tx, rx) = channel(BackpressurePolicy::DropOldest(2));
        assert_eq!(tx.push(1), PushResult::Delivered);
        assert_eq!(tx.push(2), PushResult::Delivered);
        // Full: 1 is evicted, 3 admitted.
        assert_eq!(tx.push(3), PushResult::Delivered);
        assert_eq!(rx.recv(), Ok(2));
        assert_eq!(rx.recv(), Ok(3));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_drop_newest_refuses_tail() {
        let (tx, rx) = channel(BackpressurePolicy::DropNewest(2));
        assert_eq!(tx.push(1), PushResult::Delivered);
        assert_eq!(tx.push(2), PushResult::Delivered);
        assert_eq!(tx.push(3), PushResult::Dropped);
        assert_eq!(rx.recv(), Ok(1));
        assert_eq!(rx.recv(), Ok(2));
    }

    #[test]
    fn test_finish_is_idempotent_and_drains() {
        let (tx, rx) = channel(BackpressurePolicy::Unbounded);
        tx.push(7);
        tx.finish();
        tx.finish();
        assert_eq!(tx.push(8), PushResult::Terminated);
        // The buffered value survives finish.
        assert_eq!(rx.recv(), Ok(7));
        assert_eq!(rx.recv(), Err(RecvError));
    }

    #[test]
    fn test_receiver_drop_terminates() {
        let (tx, rx) = channel(BackpressurePolicy::Unbounded);
        drop(rx);
        assert_eq!(tx.push(1), PushResult::Terminated);
        assert!(tx.is_terminated());
    }

    #[test]
    fn test_last_sender_drop_finishes() {
        let (tx, rx) = channel(BackpressurePolicy::Unbounded);
        let tx2 = tx.clone();
        tx.push(1);
        drop(tx);
        assert_eq!(rx.try_recv(), Ok(1));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        drop(tx2);
        assert_eq!(rx.recv(), Err(RecvError));
    }

    #[test]
    fn test_blocking_recv_wakes_on_push() {
        let (tx, rx) = channel(BackpressurePolicy::Unbounded);
        let handle = thread::spawn(move || rx.recv());
        thread::sleep(Duration::from_millis(20));
        tx.push(42);
        assert_eq!(handle.join().unwrap(), Ok(42));
    }

    #[test]
    fn test_recv_timeout_expires() {
        let (tx, rx) = channel::<i32>(BackpressurePolicy::Unbounded);
        let result = rx.recv_timeout(Duration::from_millis(10));
        assert_eq!(result, Err(RecvTimeoutError::Timeout));
        drop(tx);
    }

    #[test]
    fn test_iter_ends_at_termination() {
        let (tx, rx) = channel(BackpressurePolicy::Unbounded);
        for i in 0..4 {
            tx.push(i);
        }
        tx.finish();
        let values: Vec<i32> = rx.iter().collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }
}
