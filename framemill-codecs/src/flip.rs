//! Vertical frame flipping for packed layouts.
//!
//! Planar layouts would need per-plane treatment and are not supported,
//! matching the engine's packed-only flip contract.

use framemill_core::{ConfigError, Error, Result, VideoFormat};

/// Check that a format can be flipped.
pub fn ensure_flippable(format: &VideoFormat) -> std::result::Result<(), ConfigError> {
    if format.packing().is_planar() {
        return Err(ConfigError::UnsupportedPacking(format!(
            "{} (flip supports packed layouts only)",
            format.packing()
        )));
    }
    Ok(())
}

/// Reverse the scan-line order of a packed frame. Returns the bytes
/// written, which equals the source frame size.
pub fn flip_vertical(format: &VideoFormat, src: &[u8], dst: &mut [u8]) -> Result<usize> {
    let needed = format.frame_bytes();
    if src.len() < needed {
        return Err(Error::too_small("source", needed, src.len()));
    }
    if dst.len() < needed {
        return Err(Error::too_small("destination", needed, dst.len()));
    }

    let stride = format.line_stride();
    let height = format.height() as usize;
    for row in 0..height {
        let from = (height - 1 - row) * stride;
        dst[row * stride..(row + 1) * stride].copy_from_slice(&src[from..from + stride]);
    }
    Ok(needed)
}
