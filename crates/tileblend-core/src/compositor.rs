//! Alpha compositing with the Porter-Duff "over" operator.
//!
//! The blend is pure integer arithmetic on non-premultiplied 8-bit
//! channels. Bit shifts keep every intermediate in `u32` range, and the
//! two dominant cases (fully transparent and fully opaque source pixels)
//! skip the general math entirely.

use thiserror::Error;

use crate::raster::{Raster, BYTES_PER_PIXEL};

/// Errors that can occur during compositing.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// Source and destination rasters have different dimensions.
    #[error("Cannot composite {src_width}x{src_height} source over {dst_width}x{dst_height} destination")]
    DimensionMismatch {
        dst_width: u32,
        dst_height: u32,
        src_width: u32,
        src_height: u32,
    },
}

/// Alpha-blend `src` on top of `dst`, writing the result into `dst`.
///
/// Both rasters must have identical dimensions; a mismatch aborts the
/// operation before any pixel is written.
pub fn composite_over(dst: &mut Raster, src: &Raster) -> Result<(), CompositeError> {
    if dst.dimensions() != src.dimensions() {
        return Err(CompositeError::DimensionMismatch {
            dst_width: dst.width(),
            dst_height: dst.height(),
            src_width: src.width(),
            src_height: src.height(),
        });
    }

    let dst_pixels = dst.pixels_mut().chunks_exact_mut(BYTES_PER_PIXEL);
    let src_pixels = src.pixels().chunks_exact(BYTES_PER_PIXEL);
    for (dst_px, src_px) in dst_pixels.zip(src_pixels) {
        blend_pixel(dst_px, src_px);
    }

    Ok(())
}

/// Blend one non-premultiplied RGBA source pixel over a destination pixel.
fn blend_pixel(dst: &mut [u8], src: &[u8]) {
    let a1 = src[3] as u32;
    if a1 == 0 {
        // Fully transparent source leaves the destination unchanged.
        return;
    }
    if a1 == 255 {
        // Fully opaque source replaces the destination verbatim.
        dst.copy_from_slice(src);
        return;
    }

    let a0 = dst[3] as u32;
    // Output alpha in the 0..65534 domain; high byte is the 8-bit result.
    let a_out = ((a1 + a0) << 8) - a0 * a1;

    for c in 0..3 {
        let c1 = src[c] as u32;
        // Premultiply the destination channel into the 0..255*255 domain.
        let c0 = dst[c] as u32 * a0;
        // ((c1<<8) - c0) * a1 + (c0<<8), rearranged to stay unsigned.
        let blended = (c1 << 8) * a1 + c0 * (256 - a1);
        dst[c] = (blended / a_out) as u8;
    }
    dst[3] = (a_out >> 8) as u8;
}
