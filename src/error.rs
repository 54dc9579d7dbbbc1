//! Error types for channel consumption.
//!
//! The engine itself has no failure modes: dispatch cannot fail, pushing to
//! a terminated channel is a defined no-op, and contract violations (lock
//! reentry, restarting a cancelled worker) panic rather than return errors.
//! The only `Result`-shaped surface is the consuming side of a channel.

use thiserror::Error;

/// A blocking receive found the channel terminated and fully drained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("channel is terminated and drained")]
pub struct RecvError;

/// Outcome of a non-blocking receive attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TryRecvError {
    #[error("channel is empty")]
    Empty,

    #[error("channel is terminated and drained")]
    Terminated,
}

/// Outcome of a receive with a deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RecvTimeoutError {
    #[error("timed out waiting for a value")]
    Timeout,

    #[error("channel is terminated and drained")]
    Terminated,
}
