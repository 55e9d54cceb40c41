//! PNG codec adapter.
//!
//! This module converts between encoded PNG byte streams and canonical
//! RGBA rasters:
//! - `decode` canonicalizes any supported PNG variant (palette, grayscale,
//!   sub-8-bit, 16-bit, tRNS transparency, embedded gamma) to 8-bit RGBA
//! - `encode` writes a raster back out, optionally dropping the alpha
//!   channel, tuned for encode speed
//! - `read_header` probes dimensions and alpha presence without decoding
//!   pixel data

mod buffer;
mod decode;
mod encode;
mod types;

pub use buffer::ChunkBuffer;
pub use decode::{decode, read_header, PNG_SIGNATURE};
pub use encode::encode;
pub use types::{DecodeError, EncodeError, PngHeader};
