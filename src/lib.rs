//! # Surge
//!
//! A concurrency-safe, observable state container: consumers on arbitrary
//! threads read immutable snapshots of shared state and submit actions; a
//! single authority serializes every mutation through a pure reducer and
//! fans the resulting snapshot out to every live subscriber with no missed
//! or out-of-order updates.
//!
//! ## Core Concepts
//!
//! - **Store**: owns canonical state and a pure reducer; serializes every
//!   state- and subscription-affecting operation
//! - **Snapshot**: immutable (state, dispatch-capability) pair produced per
//!   completed dispatch or read
//! - **Drivers / Streamers**: strongly- and weakly-owned subscribers, each
//!   fed by an output channel with a configurable backpressure policy
//! - **Sync utilities**: a scoped reader-writer lock, an exclusive spin
//!   lock, and a dedicated worker thread for the same problem class
//!
//! ## Example
//!
//! ```
//! use surge::{Driver, Store};
//!
//! let store = Store::new(0i64, |state, action: &i64| state + action);
//!
//! let driver = Driver::unbounded();
//! store.install(&driver);
//!
//! store.dispatch(1);
//! store.dispatch_all([2, 3]); // one transition, one notification
//!
//! assert_eq!(*driver.recv().unwrap().state(), 0); // install-time snapshot
//! assert_eq!(*driver.recv().unwrap().state(), 1);
//! assert_eq!(*driver.recv().unwrap().state(), 6);
//! ```

pub mod channel;
pub mod error;
pub mod snapshot;
pub mod store;
pub mod subscribers;
pub mod sync;
pub mod types;
pub mod worker;

// Re-exports
pub use channel::{channel, Receiver, Sender};
pub use error::{RecvError, RecvTimeoutError, TryRecvError};
pub use snapshot::Snapshot;
pub use store::Store;
pub use subscribers::{Driver, Streamer};
pub use sync::{RwLock, SpinLock, SpinMutex};
pub use types::{BackpressurePolicy, PushResult, SnapshotId, SubscriberId};
pub use worker::{Worker, WorkerConfig};
