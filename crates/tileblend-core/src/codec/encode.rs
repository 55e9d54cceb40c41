//! PNG encoding for canonical RGBA rasters.
//!
//! Compression effort favors encode speed over output size. The stream is
//! accumulated through a [`ChunkBuffer`] so the many small chunks the
//! encoder emits never degenerate into per-byte reallocation.

use crate::raster::Raster;

use super::buffer::ChunkBuffer;
use super::types::EncodeError;

/// Encode a raster as a PNG stream.
///
/// When `include_alpha` is false the alpha channel is dropped from the
/// written stream (RGB color type) even though the in-memory raster keeps
/// four bytes per pixel.
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` for zero-sized rasters and
/// `EncodeError::EncodingFailed` if the underlying encoder fails.
pub fn encode(raster: &Raster, include_alpha: bool) -> Result<Vec<u8>, EncodeError> {
    if raster.width() == 0 || raster.height() == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: raster.width(),
            height: raster.height(),
        });
    }

    let mut sink = ChunkBuffer::new();
    {
        let mut encoder = png::Encoder::new(&mut sink, raster.width(), raster.height());
        encoder.set_color(if include_alpha {
            png::ColorType::Rgba
        } else {
            png::ColorType::Rgb
        });
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);

        let mut writer = encoder
            .write_header()
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        if include_alpha {
            writer
                .write_image_data(raster.pixels())
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        } else {
            writer
                .write_image_data(&strip_alpha(raster.pixels()))
                .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
        }
        writer
            .finish()
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    }

    Ok(sink.into_bytes())
}

/// Repack RGBA bytes as RGB, dropping the filler alpha byte.
fn strip_alpha(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    out
}
