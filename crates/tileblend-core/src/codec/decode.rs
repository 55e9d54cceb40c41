//! PNG decoding with canonicalization to 8-bit RGBA.
//!
//! Every raster leaving this module is uniform regardless of how the
//! source stream was encoded: palette and grayscale color modes are
//! expanded to full color, transparency info becomes an explicit alpha
//! channel, bit depths below 8 are unpacked, 16-bit depth is truncated
//! to 8, images without alpha gain an opaque alpha channel, and an
//! embedded gamma value is rescaled to a 2.2 display exponent.

use std::io::Cursor;

use crate::raster::{Raster, BYTES_PER_PIXEL};

use super::types::{DecodeError, PngHeader};

/// The eight-byte signature every PNG stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Display exponent that decoded pixel values are rescaled to when the
/// stream embeds a gamma value.
const TARGET_DISPLAY_EXPONENT: f32 = 2.2;

/// Read width, height, bit depth, and alpha presence without decoding
/// pixel data.
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedFormat` if the buffer does not start
/// with the PNG signature, or a decode error if the header is invalid.
pub fn read_header(bytes: &[u8]) -> Result<PngHeader, DecodeError> {
    check_signature(bytes)?;

    let decoder = png::Decoder::new(Cursor::new(bytes));
    let reader = decoder
        .read_info()
        .map_err(|e| classify_error(bytes, e))?;
    let info = reader.info();

    Ok(PngHeader {
        width: info.width,
        height: info.height,
        bit_depth: info.bit_depth as u8,
        alpha: matches!(
            info.color_type,
            png::ColorType::Rgba | png::ColorType::GrayscaleAlpha
        ),
    })
}

/// Decode a PNG stream into a canonical RGBA raster.
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedFormat` if the signature is missing,
/// `DecodeError::TruncatedInput` if the stream ends before the full image
/// is decoded, and `DecodeError::Malformed` for other invalid streams.
pub fn decode(bytes: &[u8]) -> Result<Raster, DecodeError> {
    check_signature(bytes)?;

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    // Palette -> RGB, tRNS -> alpha, sub-8-bit -> 8, 16-bit -> high byte.
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| classify_error(bytes, e))?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| classify_error(bytes, e))?;
    buf.truncate(frame.buffer_size());

    let mut pixels = match frame.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => rgb_to_rgba(&buf),
        png::ColorType::Grayscale => gray_to_rgba(&buf),
        png::ColorType::GrayscaleAlpha => gray_alpha_to_rgba(&buf),
        png::ColorType::Indexed => {
            // EXPAND always resolves the palette before we get here.
            return Err(DecodeError::Malformed("palette was not expanded".to_string()));
        }
    };

    if pixels.len() != Raster::byte_len(frame.width, frame.height) {
        return Err(DecodeError::TruncatedInput);
    }

    if let Some(gamma) = reader.info().source_gamma {
        rescale_gamma(&mut pixels, gamma.into_value());
    }

    Ok(Raster::new(frame.width, frame.height, pixels))
}

fn check_signature(bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(DecodeError::UnsupportedFormat);
    }
    Ok(())
}

/// A signature-valid stream without a closing IEND chunk was cut short;
/// classify any decoder failure on it as truncation.
fn classify_error(bytes: &[u8], err: png::DecodingError) -> DecodeError {
    if !has_iend(bytes) {
        return DecodeError::TruncatedInput;
    }
    match err {
        png::DecodingError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            DecodeError::TruncatedInput
        }
        other => {
            let message = other.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("unexpected end") || lowered.contains("eof") {
                DecodeError::TruncatedInput
            } else {
                DecodeError::Malformed(message)
            }
        }
    }
}

fn has_iend(bytes: &[u8]) -> bool {
    // A well-formed stream ends with the IEND chunk type followed by its CRC.
    bytes.len() >= 12 && &bytes[bytes.len() - 8..bytes.len() - 4] == b"IEND"
}

fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * BYTES_PER_PIXEL);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(px);
        out.push(0xFF);
    }
    out
}

fn gray_to_rgba(gray: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(gray.len() * BYTES_PER_PIXEL);
    for &v in gray {
        out.extend_from_slice(&[v, v, v, 0xFF]);
    }
    out
}

fn gray_alpha_to_rgba(ga: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ga.len() / 2 * BYTES_PER_PIXEL);
    for px in ga.chunks_exact(2) {
        out.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
    }
    out
}

/// Rescale color channels from the stream's gamma to the target display
/// exponent. Alpha is left untouched.
fn rescale_gamma(pixels: &mut [u8], file_gamma: f32) {
    if file_gamma <= 0.0 {
        return;
    }
    let exponent = 1.0 / (file_gamma * TARGET_DISPLAY_EXPONENT);
    if (exponent - 1.0).abs() < 0.01 {
        // Stream is already at the target gamma.
        return;
    }

    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let normalized = (i as f32) / 255.0;
        *entry = (normalized.powf(exponent) * 255.0).round() as u8;
    }

    for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        px[0] = lut[px[0] as usize];
        px[1] = lut[px[1] as usize];
        px[2] = lut[px[2] as usize];
    }
}
