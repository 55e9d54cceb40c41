//! Tileblend Engine - Asynchronous image resource engine
//!
//! This crate exposes the tileblend-core algorithms behind a non-blocking
//! host surface on tokio:
//!
//! - `Image` - an image resource with a per-resource FIFO operation queue
//!   (load / encode / overlay), strict ordering, head-of-line blocking on
//!   unmet preconditions, and single-flight execution
//! - `blend` - the resource-less layer-stack blend entry point
//! - `Completion` - the handle every submitted operation resolves
//!
//! Submitting an operation never blocks the caller; the work runs on the
//! runtime's blocking pool and the completion resolves when it finishes.

mod blend;
mod completion;
mod error;
mod image;
mod scheduler;

pub use blend::blend;
pub use completion::Completion;
pub use error::EngineError;
pub use image::{EncodeOptions, Image, Lifecycle};
pub use scheduler::pending_operations;

// Core types that appear in the engine's API surface.
pub use tileblend_core::{BlendError, CompositeError, DecodeError, EncodeError, Raster};
