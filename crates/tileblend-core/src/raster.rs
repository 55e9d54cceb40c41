//! The canonical decoded-image representation.
//!
//! Every image leaving the codec is a `Raster`: 8-bit RGBA, row-major,
//! no padding between rows. All compositing operates on this layout.

/// Bytes per pixel in a canonical raster (R, G, B, A).
pub const BYTES_PER_PIXEL: usize = 4;

/// A decoded image with RGBA pixel data.
///
/// Invariant: `pixels.len() == width * height * 4`. Dimensions never
/// change after construction; compositing mutates pixel values only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Create a raster from existing RGBA pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            Self::byte_len(width, height),
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a raster filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Expected pixel buffer length for the given dimensions.
    pub fn byte_len(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * BYTES_PER_PIXEL
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width and height as a pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access to the raw RGBA bytes.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// The RGBA value at `(x, y)`. Returns `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + (x as usize)) * BYTES_PER_PIXEL;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[offset..offset + BYTES_PER_PIXEL]);
        Some(out)
    }

    /// Consume the raster, returning the pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Check if this is an empty/invalid raster.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster = Raster::new(100, 50, vec![0u8; 100 * 50 * 4]);
        assert_eq!(raster.width(), 100);
        assert_eq!(raster.height(), 50);
        assert_eq!(raster.dimensions(), (100, 50));
        assert_eq!(raster.pixels().len(), 20_000);
        assert!(!raster.is_empty());
    }

    #[test]
    fn test_raster_empty() {
        let raster = Raster::new(0, 0, vec![]);
        assert!(raster.is_empty());
    }

    #[test]
    fn test_filled() {
        let raster = Raster::filled(2, 2, [10, 20, 30, 40]);
        assert_eq!(raster.pixels().len(), 16);
        for pixel in raster.pixels().chunks_exact(4) {
            assert_eq!(pixel, [10, 20, 30, 40]);
        }
    }

    #[test]
    fn test_pixel_access() {
        let mut raster = Raster::filled(2, 2, [0, 0, 0, 255]);
        raster.pixels_mut()[4..8].copy_from_slice(&[255, 0, 0, 255]);

        assert_eq!(raster.pixel(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(raster.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(2, 0), None);
        assert_eq!(raster.pixel(0, 2), None);
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(Raster::byte_len(256, 256), 256 * 256 * 4);
        assert_eq!(Raster::byte_len(0, 100), 0);
    }
}
