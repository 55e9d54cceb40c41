//! Tileblend Core - Raster compositing library
//!
//! This crate provides the synchronous core of tileblend: the canonical
//! RGBA raster type, a PNG codec adapter with full canonicalization, a
//! fixed-point alpha compositor, and the layer-stack blend pipeline.
//! Asynchronous scheduling lives in `tileblend-engine`.

pub mod blend;
pub mod codec;
pub mod compositor;
pub mod raster;

pub use blend::{blend, BlendError};
pub use codec::{decode, encode, read_header, ChunkBuffer, DecodeError, EncodeError, PngHeader};
pub use compositor::{composite_over, CompositeError};
pub use raster::{Raster, BYTES_PER_PIXEL};
