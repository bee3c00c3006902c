//! Spatial resampling between two frame geometries.
//!
//! The scaler unpacks the source to the canonical intermediate, resamples
//! each plane bilinearly, and packs into the destination packing. When the
//! geometry already matches and the parameters are identity, resampling is
//! skipped entirely and only the repacking runs.

use crate::planar::PlanarImage;
use crate::{pack, unpack};
use framemill_core::{ConfigError, Error, Result, VideoFormat};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resampling parameters, fixed when the scaler is configured.
///
/// `scale` multiplies the magnification per axis (2.0 doubles the apparent
/// size of the source); `offset` shifts the sampling origin in source
/// pixels. The defaults map the full source onto the full destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    /// Per-axis magnification factors `[sx, sy]`.
    pub scale: [f32; 2],
    /// Per-axis sampling offsets `[ox, oy]` in source pixels.
    pub offset: [f32; 2],
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0],
            offset: [0.0, 0.0],
        }
    }
}

impl ScaleParams {
    /// Validate the parameters. Zero or negative magnification would
    /// collapse the output and is rejected at configure time.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (axis, &s) in ["x", "y"].iter().zip(&self.scale) {
            if !s.is_finite() || s <= 0.0 {
                return Err(ConfigError::InvalidScale(format!(
                    "scale factor {s} on {axis} axis"
                )));
            }
        }
        if self.offset.iter().any(|o| !o.is_finite()) {
            return Err(ConfigError::InvalidScale("non-finite offset".into()));
        }
        Ok(())
    }

    /// Check for the identity mapping.
    pub fn is_identity(&self) -> bool {
        self.scale == [1.0, 1.0] && self.offset == [0.0, 0.0]
    }
}

/// A scaler configured for one destination format.
#[derive(Debug, Clone)]
pub struct Scaler {
    dst: VideoFormat,
    params: ScaleParams,
}

impl Scaler {
    /// Create a scaler for the destination format.
    pub fn new(dst: VideoFormat, params: ScaleParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { dst, params })
    }

    /// The destination format.
    pub fn dst_format(&self) -> &VideoFormat {
        &self.dst
    }

    /// Bytes required for a destination frame.
    pub fn dst_bytes(&self) -> usize {
        self.dst.frame_bytes()
    }

    /// Convert one frame: repack, and resample when the geometry or the
    /// configured parameters call for it. Returns the bytes written.
    pub fn scale_convert(
        &self,
        src_format: &VideoFormat,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<usize> {
        let src_needed = src_format.frame_bytes();
        if src.len() < src_needed {
            return Err(Error::too_small("source", src_needed, src.len()));
        }
        let dst_needed = self.dst_bytes();
        if dst.len() < dst_needed {
            return Err(Error::too_small("destination", dst_needed, dst.len()));
        }

        let canonical = unpack::unpack(src_format, src);
        let same_geometry = src_format.width() == self.dst.width()
            && src_format.height() == self.dst.height();

        if same_geometry && self.params.is_identity() {
            pack::pack(&self.dst, &canonical, dst);
        } else {
            let resized = resize_canonical(
                &canonical,
                self.dst.width(),
                self.dst.height(),
                &self.params,
            );
            pack::pack(&self.dst, &resized, dst);
            debug!(
                src = %src_format,
                dst = %self.dst,
                "resampled frame"
            );
        }
        Ok(dst_needed)
    }
}

/// Resample all three canonical planes to the destination geometry.
fn resize_canonical(img: &PlanarImage, dst_width: u32, dst_height: u32, params: &ScaleParams) -> PlanarImage {
    let mut out = PlanarImage::new(dst_width, dst_height);
    resize_plane(
        &img.y,
        img.width(),
        img.height(),
        &mut out.y,
        dst_width,
        dst_height,
        params,
    );
    resize_plane(
        &img.cb,
        img.chroma_width(),
        img.height(),
        &mut out.cb,
        dst_width / 2,
        dst_height,
        params,
    );
    resize_plane(
        &img.cr,
        img.chroma_width(),
        img.height(),
        &mut out.cr,
        dst_width / 2,
        dst_height,
        params,
    );
    out
}

/// Bilinear resample of one plane, rows in parallel.
fn resize_plane(
    src: &[u16],
    src_w: u32,
    src_h: u32,
    dst: &mut [u16],
    dst_w: u32,
    dst_h: u32,
    params: &ScaleParams,
) {
    let (sw, sh) = (src_w as usize, src_h as usize);
    let (dw, dh) = (dst_w as usize, dst_h as usize);
    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;

    dst.par_chunks_mut(dw).enumerate().for_each(|(oy, row)| {
        let sy = ((oy as f32 + 0.5) / params.scale[1]) * y_ratio - 0.5 + params.offset[1];
        let sy = sy.clamp(0.0, (sh - 1) as f32);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(sh - 1);
        let fy = sy - y0 as f32;

        for (ox, out) in row.iter_mut().enumerate() {
            let sx = ((ox as f32 + 0.5) / params.scale[0]) * x_ratio - 0.5 + params.offset[0];
            let sx = sx.clamp(0.0, (sw - 1) as f32);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(sw - 1);
            let fx = sx - x0 as f32;

            let p00 = src[y0 * sw + x0] as f32;
            let p01 = src[y0 * sw + x1] as f32;
            let p10 = src[y1 * sw + x0] as f32;
            let p11 = src[y1 * sw + x1] as f32;

            let top = p00 + (p01 - p00) * fx;
            let bottom = p10 + (p11 - p10) * fx;
            let sample = top + (bottom - top) * fy;
            *out = sample.round().clamp(0.0, 1023.0) as u16;
        }
    });
}
