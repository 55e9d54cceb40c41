//! The image resource: an owned raster plus identity, mutated in place
//! by asynchronous load and overlay operations.
//!
//! An `Image` handle is cheap to clone; all clones refer to the same
//! resource and its operation queue. Submitting an operation never
//! blocks: it returns a [`Completion`] that resolves when the operation
//! finishes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tileblend_core::Raster;
use tokio::sync::oneshot;

use crate::completion::Completion;
use crate::error::EngineError;
use crate::scheduler::{self, Op, Shared};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of an image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// No raster yet and no load in flight.
    Empty,
    /// A load is decoding; the raster is not yet available.
    Loading,
    /// The raster is available and no operation is in flight.
    Ready,
    /// An operation is running against the raster.
    Processing,
}

/// Configuration for encoding an image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Write the alpha channel into the stream. Defaults to true.
    pub include_alpha: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { include_alpha: true }
    }
}

/// An image resource with its own FIFO operation queue.
#[derive(Clone)]
pub struct Image {
    shared: Arc<Shared>,
}

impl Image {
    /// Create an empty image resource.
    pub fn new() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::new(Shared::new(id)),
        }
    }

    /// Create an image with a load of `bytes` already enqueued.
    pub fn from_buffer(bytes: Vec<u8>) -> (Self, Completion<()>) {
        let image = Self::new();
        let completion = image.load(bytes);
        (image, completion)
    }

    /// Decode `bytes` into this resource's raster.
    ///
    /// Loading is always legal: on a decode failure the resource keeps
    /// its prior raster (if any).
    pub fn load(&self, bytes: Vec<u8>) -> Completion<()> {
        let (done, rx) = oneshot::channel();
        scheduler::submit(&self.shared, Op::Load { bytes, done });
        Completion::new(rx)
    }

    /// Encode this resource's raster to a PNG stream.
    ///
    /// Queued until the raster is available.
    pub fn encode(&self, options: EncodeOptions) -> Completion<Vec<u8>> {
        let (done, rx) = oneshot::channel();
        scheduler::submit(&self.shared, Op::Encode { options, done });
        Completion::new(rx)
    }

    /// Alpha-blend `source` on top of this resource, mutating this
    /// resource's raster.
    ///
    /// Queued until both rasters are available; a not-yet-loaded source
    /// parks this resource's queue until the source loads. On a dimension
    /// mismatch only this operation fails and the target keeps its prior
    /// contents.
    pub fn overlay(&self, source: &Image) -> Completion<()> {
        if Arc::ptr_eq(&self.shared, &source.shared) {
            return Completion::immediate(Err(EngineError::Argument(
                "cannot overlay an image onto itself".to_string(),
            )));
        }
        let (done, rx) = oneshot::channel();
        scheduler::submit(
            &self.shared,
            Op::Overlay {
                source: source.clone(),
                done,
            },
        );
        Completion::new(rx)
    }

    /// Stable identity of this resource.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lock().lifecycle
    }

    /// Whether a raster is available.
    pub fn is_loaded(&self) -> bool {
        self.shared.is_ready()
    }

    /// Width in pixels, or 0 while unloaded.
    pub fn width(&self) -> u32 {
        self.dimensions().map_or(0, |(w, _)| w)
    }

    /// Height in pixels, or 0 while unloaded.
    pub fn height(&self) -> u32 {
        self.dimensions().map_or(0, |(_, h)| h)
    }

    /// Width and height, once loaded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.shared.lock().raster.as_ref().map(|r| r.dimensions())
    }

    /// A snapshot of the current raster, once loaded.
    pub fn raster(&self) -> Option<Arc<Raster>> {
        self.shared.lock().raster.clone()
    }

    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Image {}x{}]", self.width(), self.height())
    }
}
