//! Completion handles for asynchronous operations.

use tokio::sync::oneshot;

use crate::error::EngineError;

/// A handle resolving to the outcome of one submitted operation.
///
/// Submission never blocks; the operation runs on a worker and resolves
/// the handle exactly once. Dropping the handle does not cancel the
/// operation.
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<Result<T, EngineError>>,
}

impl<T> Completion<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<T, EngineError>>) -> Self {
        Self { rx }
    }

    /// A completion that is already resolved, used for failures detected
    /// before anything is enqueued.
    pub(crate) fn immediate(result: Result<T, EngineError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    /// Wait for the operation to finish.
    pub async fn wait(self) -> Result<T, EngineError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Worker(
                "operation dropped before completion".to_string(),
            )),
        }
    }
}
