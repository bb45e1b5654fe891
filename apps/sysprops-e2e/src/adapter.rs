//! Blocking adapter over callback-style client operations.
//!
//! [`wait_for`] hands the operation a [`Completion`] and blocks the calling
//! thread until the operation reports through it. The completion is
//! consumed when it fires, so an operation can report at most once. There
//! is no timeout; an operation that never reports blocks forever unless it
//! drops its completion.
//!
//! Must not be called from inside an async task.

use table_client::ClientError;
use tokio::sync::oneshot;

use crate::error::HarnessError;

/// Single-use slot an operation reports its outcome into.
#[derive(Debug)]
pub struct Completion<T> {
    slot: oneshot::Sender<Result<T, ClientError>>,
}

impl<T> Completion<T> {
    /// Stores the outcome and wakes the waiting thread.
    pub fn complete(self, outcome: Result<T, ClientError>) {
        // The waiter only goes away if its thread panicked.
        let _ = self.slot.send(outcome);
    }
}

/// Starts an operation and blocks until it completes.
///
/// A client failure is returned as [`HarnessError::Client`].
pub fn wait_for<T>(start: impl FnOnce(Completion<T>)) -> Result<T, HarnessError> {
    let (slot, outcome) = oneshot::channel();
    start(Completion { slot });
    match outcome.blocking_recv() {
        Ok(result) => result.map_err(HarnessError::from),
        Err(_) => Err(HarnessError::CompletionDropped),
    }
}
