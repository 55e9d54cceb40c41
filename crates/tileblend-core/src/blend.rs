//! Blending an ordered stack of encoded layers into one encoded image.
//!
//! Layers are ordered bottom-up: index 0 is the bottommost, the last
//! index the topmost. When the topmost layer has no alpha channel it
//! occludes everything beneath it and its bytes are returned unchanged;
//! otherwise the stack is walked top to bottom, compositing the running
//! result over each lower layer.

use thiserror::Error;

use crate::codec::{self, DecodeError, EncodeError};
use crate::compositor::composite_over;

/// Errors that can occur while blending a layer stack.
#[derive(Debug, Error)]
pub enum BlendError {
    /// The layer list was empty.
    #[error("Blend requires at least one layer")]
    EmptyInput,

    /// A layer failed to decode; `index` identifies it within the stack.
    #[error("Layer {index} could not be decoded: {source}")]
    InvalidLayer {
        index: usize,
        #[source]
        source: DecodeError,
    },

    /// A layer's dimensions differ from the topmost layer's.
    #[error("Layer {index} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        index: usize,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Re-encoding the composite failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Blend an ordered stack of encoded layers into one encoded image.
///
/// A dimension mismatch anywhere in the stack aborts the whole blend;
/// lower layers are always decoded through full canonicalization and
/// composited assuming alpha.
///
/// # Errors
///
/// Returns `BlendError::EmptyInput` for an empty stack, and
/// `BlendError::InvalidLayer` or `BlendError::DimensionMismatch`
/// identifying the offending layer index otherwise.
pub fn blend<B: AsRef<[u8]>>(layers: &[B]) -> Result<Vec<u8>, BlendError> {
    if layers.is_empty() {
        return Err(BlendError::EmptyInput);
    }

    let top_index = layers.len() - 1;
    let top = layers[top_index].as_ref();
    let header = codec::read_header(top).map_err(|source| BlendError::InvalidLayer {
        index: top_index,
        source,
    })?;

    // An opaque topmost layer occludes the whole stack: return its bytes
    // unchanged, skipping decode and re-encode entirely.
    if !header.alpha {
        return Ok(top.to_vec());
    }

    let mut result = codec::decode(top).map_err(|source| BlendError::InvalidLayer {
        index: top_index,
        source,
    })?;

    // Walk top to bottom, compositing the running result over each lower
    // layer and adopting that layer's buffer as the new result.
    for index in (0..top_index).rev() {
        let mut layer =
            codec::decode(layers[index].as_ref()).map_err(|source| BlendError::InvalidLayer {
                index,
                source,
            })?;

        let expected = result.dimensions();
        let actual = layer.dimensions();
        if actual != expected {
            return Err(BlendError::DimensionMismatch {
                index,
                expected_width: expected.0,
                expected_height: expected.1,
                actual_width: actual.0,
                actual_height: actual.1,
            });
        }

        composite_over(&mut layer, &result).map_err(|_| BlendError::DimensionMismatch {
            index,
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        })?;
        result = layer;
    }

    Ok(codec::encode(&result, true)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::raster::Raster;

    fn solid_layer(width: u32, height: u32, rgba: [u8; 4], include_alpha: bool) -> Vec<u8> {
        encode(&Raster::filled(width, height, rgba), include_alpha).unwrap()
    }

    #[test]
    fn test_empty_stack_rejected() {
        let layers: Vec<Vec<u8>> = vec![];
        assert!(matches!(blend(&layers), Err(BlendError::EmptyInput)));
    }

    #[test]
    fn test_invalid_layer_reports_index() {
        let good = solid_layer(4, 4, [0, 0, 0, 128], true);
        let bad = vec![1u8, 2, 3, 4];
        let top = solid_layer(4, 4, [0, 0, 0, 128], true);

        let err = blend(&[good, bad, top]).unwrap_err();
        match err {
            BlendError::InvalidLayer { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(source, DecodeError::UnsupportedFormat));
            }
            other => panic!("expected InvalidLayer, got {other:?}"),
        }
    }

    #[test]
    fn test_opaque_top_returns_bytes_verbatim() {
        let bottom = solid_layer(4, 4, [255, 0, 0, 255], true);
        let top = solid_layer(4, 4, [0, 0, 255, 255], false);

        let result = blend(&[bottom, top.clone()]).unwrap();
        assert_eq!(result, top);
    }

    #[test]
    fn test_opaque_top_skips_lower_layer_validation() {
        // The lower layer is never decoded on the passthrough path, so
        // even garbage beneath an opaque top cannot fail the blend.
        let garbage = vec![0u8; 16];
        let top = solid_layer(4, 4, [0, 255, 0, 255], false);

        let result = blend(&[garbage, top.clone()]).unwrap();
        assert_eq!(result, top);
    }

    #[test]
    fn test_single_transparent_layer_recodes() {
        let only = solid_layer(4, 4, [10, 20, 30, 128], true);
        let result = blend(&[only]).unwrap();

        let decoded = codec::decode(&result).unwrap();
        assert_eq!(decoded.pixel(0, 0), Some([10, 20, 30, 128]));
    }

    #[test]
    fn test_three_layer_stack_is_deterministic() {
        // Opaque red bottom, half-alpha green middle, half-alpha blue top.
        let bottom = solid_layer(8, 8, [255, 0, 0, 255], true);
        let middle = solid_layer(8, 8, [0, 255, 0, 128], true);
        let top = solid_layer(8, 8, [0, 0, 255, 128], true);

        let first = blend(&[bottom.clone(), middle.clone(), top.clone()]).unwrap();
        let second = blend(&[bottom, middle, top]).unwrap();
        assert_eq!(first, second);

        let decoded = codec::decode(&first).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(decoded.pixel(x, y), Some([63, 63, 127, 255]));
            }
        }
    }

    #[test]
    fn test_dimension_mismatch_aborts_whole_blend() {
        let bottom = solid_layer(4, 4, [255, 0, 0, 255], true);
        let smaller = solid_layer(3, 4, [0, 255, 0, 128], true);
        let top = solid_layer(4, 4, [0, 0, 255, 128], true);

        let err = blend(&[bottom, smaller, top]).unwrap_err();
        match err {
            BlendError::DimensionMismatch {
                index,
                expected_width,
                actual_width,
                ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(expected_width, 4);
                assert_eq!(actual_width, 3);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_opaque_lower_layer_still_composited() {
        // The walk never exits early: an opaque middle layer hides the
        // bottom but is itself blended under the transparent top.
        let bottom = solid_layer(4, 4, [255, 255, 255, 255], true);
        let middle = solid_layer(4, 4, [0, 0, 0, 255], false);
        let top = solid_layer(4, 4, [0, 0, 255, 128], true);

        let decoded = codec::decode(&blend(&[bottom, middle, top]).unwrap()).unwrap();
        let px = decoded.pixel(0, 0).unwrap();
        // Half blue over opaque black: blue channel lit, red/green dark.
        assert_eq!(px[3], 255);
        assert!(px[2] > 100);
        assert!(px[0] < 10 && px[1] < 10);
    }
}
