//! Validated packing-to-packing frame conversion.

use crate::{pack, unpack};
use framemill_core::{Error, Result, VideoFormat};
use tracing::trace;

/// A configured conversion between two packings at one geometry.
///
/// Conversions with identical source and destination packing degrade to a
/// plain copy; everything else routes through the canonical intermediate.
#[derive(Debug, Clone, Copy)]
pub struct Repacker {
    src: VideoFormat,
    dst: VideoFormat,
}

impl Repacker {
    /// Create a repacker. Source and destination must share dimensions;
    /// repacking never resizes.
    pub fn new(src: VideoFormat, dst: VideoFormat) -> Result<Self> {
        src.ensure_same_geometry(&dst)?;
        Ok(Self { src, dst })
    }

    /// The source format.
    pub fn src_format(&self) -> &VideoFormat {
        &self.src
    }

    /// The destination format.
    pub fn dst_format(&self) -> &VideoFormat {
        &self.dst
    }

    /// Bytes required for a source frame.
    pub fn src_bytes(&self) -> usize {
        self.src.frame_bytes()
    }

    /// Bytes required for a destination frame.
    pub fn dst_bytes(&self) -> usize {
        self.dst.frame_bytes()
    }

    /// Convert one frame, returning the bytes written. Nothing is written
    /// unless both buffers hold their computed sizes.
    pub fn repack(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        let needed = self.src_bytes();
        if src.len() < needed {
            return Err(Error::too_small("source", needed, src.len()));
        }
        let dst_needed = self.dst_bytes();
        if dst.len() < dst_needed {
            return Err(Error::too_small("destination", dst_needed, dst.len()));
        }

        if self.src.packing() == self.dst.packing() {
            dst[..dst_needed].copy_from_slice(&src[..dst_needed]);
        } else {
            let canonical = unpack::unpack(&self.src, src);
            pack::pack(&self.dst, &canonical, dst);
        }
        trace!(src = %self.src, dst = %self.dst, "repacked frame");
        Ok(dst_needed)
    }
}
