//! Error and metadata types for the PNG codec.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while decoding a PNG stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The buffer does not start with the PNG signature.
    #[error("Buffer does not contain a supported image format")]
    UnsupportedFormat,

    /// The stream ends before the full image could be decoded.
    #[error("Image stream is truncated")]
    TruncatedInput,

    /// The stream carries the PNG signature but is otherwise invalid.
    #[error("Malformed image stream: {0}")]
    Malformed(String),
}

/// Errors that can occur while encoding a raster to PNG.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Header fields read from a PNG stream without decoding pixel data.
///
/// This is what the blend pipeline probes to decide whether the topmost
/// layer can be returned verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PngHeader {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Bit depth per channel as stored in the stream (1, 2, 4, 8, or 16).
    pub bit_depth: u8,
    /// Whether the color type carries an explicit alpha channel.
    ///
    /// Palette transparency (tRNS) does not count; only RGBA and
    /// grayscale-alpha color types set this.
    pub alpha: bool,
}
