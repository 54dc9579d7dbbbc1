//! Dedicated worker thread draining a private FIFO closure queue.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker thread configuration.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// OS thread name. Default: `"surge-worker"`.
    pub name: String,

    /// Stack size in bytes; `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "surge-worker".to_string(),
            stack_size: None,
        }
    }
}

/// Queue and lifecycle flags, guarded by one mutex.
struct Queue {
    jobs: VecDeque<Job>,
    started: bool,
    paused: bool,
    cancelled: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    /// Signalled on enqueue, resume, and cancel.
    wake: Condvar,
}

/// An OS thread that runs enqueued closures strictly FIFO, one at a time.
///
/// Lifecycle: *not started* → `start` → *running* ⇄ (`pause`/`resume`)
/// *paused* → `cancel` → *cancelled* (terminal). Work may be enqueued from
/// any thread in any state before cancellation; work enqueued while paused
/// runs, in order, on resume. Restarting after `cancel`, or calling `start`
/// twice, is a contract violation and panics.
///
/// Dropping the worker cancels it and joins the thread.
pub struct Worker {
    shared: Arc<Shared>,
    config: WorkerConfig,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(Queue {
                    jobs: VecDeque::new(),
                    started: false,
                    paused: false,
                    cancelled: false,
                }),
                wake: Condvar::new(),
            }),
            config,
            handle: Mutex::new(None),
        }
    }

    /// Append work to the queue tail. Callable from any thread.
    ///
    /// Enqueueing after cancellation is a no-op: the drain loop has exited
    /// and the work would never run.
    pub fn enqueue(&self, work: impl FnOnce() + Send + 'static) {
        let mut queue = self.shared.queue.lock();
        if queue.cancelled {
            tracing::debug!(name = %self.config.name, "enqueue after cancel ignored");
            return;
        }
        queue.jobs.push_back(Box::new(work));
        self.shared.wake.notify_one();
    }

    /// Spawn the thread and begin draining.
    ///
    /// Panics if already started or cancelled.
    pub fn start(&self) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.cancelled {
                panic!("Worker cannot be restarted after cancellation");
            }
            if queue.started {
                panic!("Worker is already started");
            }
            queue.started = true;
        }

        let shared = Arc::clone(&self.shared);
        let mut builder = thread::Builder::new().name(self.config.name.clone());
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        let handle = builder
            .spawn(move || drain_loop(&shared))
            .expect("failed to spawn worker thread");

        *self.handle.lock() = Some(handle);
        tracing::debug!(name = %self.config.name, "worker started");
    }

    /// Stop draining without losing queued work or exiting the thread.
    pub fn pause(&self) {
        self.shared.queue.lock().paused = true;
    }

    /// Resume draining. Work enqueued while paused runs in order.
    pub fn resume(&self) {
        let mut queue = self.shared.queue.lock();
        queue.paused = false;
        self.shared.wake.notify_one();
    }

    /// Permanently exit the drain loop. Terminal; queued-but-unrun work is
    /// dropped. Idempotent.
    pub fn cancel(&self) {
        let mut queue = self.shared.queue.lock();
        if queue.cancelled {
            return;
        }
        queue.cancelled = true;
        queue.jobs.clear();
        self.shared.wake.notify_one();
        tracing::debug!(name = %self.config.name, "worker cancelled");
    }

    /// Drop all not-yet-run work; the worker keeps running.
    pub fn empty_queue(&self) {
        self.shared.queue.lock().jobs.clear();
    }

    /// Block until the worker thread exits (requires a prior `cancel`).
    pub fn join(&self) {
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.shared.queue.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.queue.lock().cancelled
    }

    /// Number of queued, not-yet-run items.
    pub fn queue_len(&self) -> usize {
        self.shared.queue.lock().jobs.len()
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new(WorkerConfig::default())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.cancel();
        self.join();
    }
}

/// Body of the worker thread: pop-run until cancelled.
fn drain_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.cancelled {
                    return;
                }
                if !queue.paused {
                    if let Some(job) = queue.jobs.pop_front() {
                        break job;
                    }
                }
                shared.wake.wait(&mut queue);
            }
        };
        // Run outside the lock so enqueue never waits on a job.
        job();
    }
}
