//! Resource-less asynchronous blend entry point.

use tokio::sync::oneshot;

use crate::completion::Completion;
use crate::error::EngineError;
use crate::scheduler;

/// Blend an ordered stack of encoded layers (bottom first) into one
/// encoded image, off the caller's thread.
///
/// Argument validation happens synchronously: an empty stack resolves
/// the completion immediately with an argument error and nothing is
/// enqueued.
pub fn blend(layers: Vec<Vec<u8>>) -> Completion<Vec<u8>> {
    if layers.is_empty() {
        return Completion::immediate(Err(EngineError::Argument(
            "at least one layer buffer is required".to_string(),
        )));
    }

    scheduler::work_started();
    tracing::debug!(layers = layers.len(), "blend submitted");

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || tileblend_core::blend(&layers)).await;
        let outcome = match result {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(EngineError::Blend(e)),
            Err(e) => Err(EngineError::Worker(e.to_string())),
        };
        scheduler::work_finished();
        let _ = tx.send(outcome);
    });
    Completion::new(rx)
}
