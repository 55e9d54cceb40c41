//! Error types for asynchronous engine operations.

use thiserror::Error;
use tileblend_core::{BlendError, CompositeError, DecodeError, EncodeError};

/// Errors delivered through operation completions.
///
/// Argument errors resolve the completion immediately, before anything is
/// enqueued; the remaining variants surface from the worker that executed
/// the operation. The resource itself stays in its prior state on failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad caller input; the operation was never enqueued.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Decoding the supplied buffer failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Encoding the raster failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Compositing failed; the target keeps its prior contents.
    #[error(transparent)]
    Composite(#[from] CompositeError),

    /// A blend pipeline run failed.
    #[error(transparent)]
    Blend(#[from] BlendError),

    /// The worker executing the operation failed or was torn down.
    #[error("Operation worker failed: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_error_display() {
        let err = EngineError::Argument("first argument must be a buffer".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid argument: first argument must be a buffer"
        );
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err = EngineError::from(DecodeError::UnsupportedFormat);
        assert_eq!(
            err.to_string(),
            DecodeError::UnsupportedFormat.to_string()
        );
    }
}
