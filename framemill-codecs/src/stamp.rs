//! Compositing primitives: wipe, copy and mix over planar frames.
//!
//! The compositor works directly on the plane layout of the configured
//! packing (`420P` or `YUV422P10`, the two planar layouts) rather than
//! going through the canonical intermediate, so a copy really is a row
//! copy and a mix really is one pass over the samples.
//!
//! Wipe colors are mapped to studio range: `col[0]` is normalized luma
//! (`16 + col0 * 219`), `col[1]`/`col[2]` are signed chroma offsets in
//! [-0.5, 0.5] around the neutral 128 (`128 + col * 224`). A 10-bit
//! destination shifts the resulting sample left by two bits, so
//! `[1, 0, 0]` wipes to (235, 128, 128) at 8 bits and (940, 512, 512) at
//! 10 bits.

use byteorder::{ByteOrder, LittleEndian};
use framemill_core::{ConfigError, Error, Packing, Result, VideoFormat};
use serde::{Deserialize, Serialize};

/// Parameters for a wipe operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WipeParams {
    /// Rectangle to fill, `[x, y, w, h]` in pixels.
    pub rect: [u32; 4],
    /// Fill color: normalized luma, then Cb and Cr offsets.
    pub col: [f32; 3],
}

/// Parameters for a copy (placement) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CopyParams {
    /// Destination origin `[x, y]` in pixels.
    pub dst_org: [u32; 2],
}

/// Parameters for a two-source mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixParams {
    /// Blend weight of the second source, 0.0 .. 1.0.
    pub pressure: f32,
}

/// Byte offsets and pitches of the three planes at one geometry.
struct PlaneLayout {
    bytes_per_sample: usize,
    luma_pitch: usize,
    chroma_pitch: usize,
    luma_plane: usize,
    chroma_plane: usize,
    /// 2 for 4:2:0 (one chroma row per two luma rows), 1 for 4:2:2.
    luma_rows_per_chroma: usize,
}

impl PlaneLayout {
    fn of(format: &VideoFormat) -> Self {
        let (w, h) = (format.width() as usize, format.height() as usize);
        let bytes_per_sample = if format.packing().bit_depth() == 8 { 1 } else { 2 };
        let luma_rows_per_chroma = if format.packing() == Packing::Planar420 { 2 } else { 1 };
        let luma_pitch = w * bytes_per_sample;
        let chroma_pitch = luma_pitch / 2;
        Self {
            bytes_per_sample,
            luma_pitch,
            chroma_pitch,
            luma_plane: luma_pitch * h,
            chroma_plane: chroma_pitch * h / luma_rows_per_chroma,
            luma_rows_per_chroma,
        }
    }
}

/// A compositor configured for one frame geometry and packing.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    src: VideoFormat,
    dst: VideoFormat,
}

impl Compositor {
    /// Create a compositor. Source and destination must share a planar
    /// packing; packed layouts are not composited directly.
    pub fn new(src: VideoFormat, dst: VideoFormat) -> Result<Self> {
        src.ensure_same_packing(&dst)?;
        if !matches!(src.packing(), Packing::Planar420 | Packing::Yuv422p10) {
            return Err(ConfigError::UnsupportedPacking(format!(
                "{} (compositing needs a planar packing)",
                src.packing()
            ))
            .into());
        }
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

    /// Bytes required for a destination frame.
    pub fn dst_bytes(&self) -> usize {
        self.dst.frame_bytes()
    }

    /// Fill a rectangle of the destination with a solid color. Pixels
    /// outside the rectangle are left untouched.
    pub fn wipe(&self, dst: &mut [u8], params: &WipeParams) -> Result<usize> {
        let needed = self.dst_bytes();
        if dst.len() < needed {
            return Err(Error::too_small("destination", needed, dst.len()));
        }
        let [x, y, w, h] = params.rect;
        if x.saturating_add(w) > self.dst.width() || y.saturating_add(h) > self.dst.height() {
            return Err(ConfigError::RectOutOfBounds {
                x,
                y,
                w,
                h,
                width: self.dst.width(),
                height: self.dst.height(),
            }
            .into());
        }

        let (luma, cb, cr) = wipe_samples(&params.col, self.dst.packing().bit_depth());
        let layout = PlaneLayout::of(&self.dst);
        let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);

        for row in y..y + h {
            let base = row * layout.luma_pitch + x * layout.bytes_per_sample;
            fill_samples(&mut dst[base..], w, luma, layout.bytes_per_sample);
        }
        let (cx0, cx1) = (x / 2, (x + w + 1) / 2);
        let (cy0, cy1) = (
            y / layout.luma_rows_per_chroma,
            (y + h + layout.luma_rows_per_chroma - 1) / layout.luma_rows_per_chroma,
        );
        for row in cy0..cy1 {
            let off = row * layout.chroma_pitch + cx0 * layout.bytes_per_sample;
            let cb_base = layout.luma_plane + off;
            let cr_base = layout.luma_plane + layout.chroma_plane + off;
            fill_samples(&mut dst[cb_base..], cx1 - cx0, cb, layout.bytes_per_sample);
            fill_samples(&mut dst[cr_base..], cx1 - cx0, cr, layout.bytes_per_sample);
        }
        Ok(needed)
    }

    /// Place the source frame into the destination at the configured
    /// origin. No blending.
    pub fn copy(&self, src: &[u8], dst: &mut [u8], params: &CopyParams) -> Result<usize> {
        let src_needed = self.src.frame_bytes();
        if src.len() < src_needed {
            return Err(Error::too_small("source", src_needed, src.len()));
        }
        let needed = self.dst_bytes();
        if dst.len() < needed {
            return Err(Error::too_small("destination", needed, dst.len()));
        }
        let [ox, oy] = params.dst_org;
        if ox.saturating_add(self.src.width()) > self.dst.width()
            || oy.saturating_add(self.src.height()) > self.dst.height()
        {
            return Err(ConfigError::RectOutOfBounds {
                x: ox,
                y: oy,
                w: self.src.width(),
                h: self.src.height(),
                width: self.dst.width(),
                height: self.dst.height(),
            }
            .into());
        }

        let s = PlaneLayout::of(&self.src);
        let d = PlaneLayout::of(&self.dst);
        let (ox, oy) = (ox as usize, oy as usize);
        let src_h = self.src.height() as usize;

        for row in 0..src_h {
            let from = row * s.luma_pitch;
            let to = (oy + row) * d.luma_pitch + ox * d.bytes_per_sample;
            dst[to..to + s.luma_pitch].copy_from_slice(&src[from..from + s.luma_pitch]);
        }
        let chroma_rows = src_h / s.luma_rows_per_chroma;
        let c_ox = ox * d.bytes_per_sample / 2;
        let c_oy = oy / d.luma_rows_per_chroma;
        for row in 0..chroma_rows {
            let from_cb = s.luma_plane + row * s.chroma_pitch;
            let from_cr = s.luma_plane + s.chroma_plane + row * s.chroma_pitch;
            let to_off = (c_oy + row) * d.chroma_pitch + c_ox;
            let to_cb = d.luma_plane + to_off;
            let to_cr = d.luma_plane + d.chroma_plane + to_off;
            dst[to_cb..to_cb + s.chroma_pitch]
                .copy_from_slice(&src[from_cb..from_cb + s.chroma_pitch]);
            dst[to_cr..to_cr + s.chroma_pitch]
                .copy_from_slice(&src[from_cr..from_cr + s.chroma_pitch]);
        }
        Ok(needed)
    }

    /// Blend two identically-formatted sources into the destination.
    ///
    /// Fixed-point lerp: `w = round(pressure * 1024)`, each output sample
    /// is `(a*(1024-w) + b*w + 512) >> 10`, so `pressure = 0.5` yields the
    /// rounded arithmetic mean of the sources.
    pub fn mix(&self, a: &[u8], b: &[u8], dst: &mut [u8], params: &MixParams) -> Result<usize> {
        self.src.ensure_same_geometry(&self.dst)?;
        let src_needed = self.src.frame_bytes();
        if a.len() < src_needed {
            return Err(Error::too_small("source", src_needed, a.len()));
        }
        if b.len() < src_needed {
            return Err(Error::too_small("source", src_needed, b.len()));
        }
        let needed = self.dst_bytes();
        if dst.len() < needed {
            return Err(Error::too_small("destination", needed, dst.len()));
        }

        let w = (params.pressure.clamp(0.0, 1.0) * 1024.0).round() as u32;
        if self.dst.packing().bit_depth() == 8 {
            for i in 0..needed {
                let blended = (a[i] as u32 * (1024 - w) + b[i] as u32 * w + 512) >> 10;
                dst[i] = blended as u8;
            }
        } else {
            for i in (0..needed).step_by(2) {
                let sa = LittleEndian::read_u16(&a[i..]) as u32;
                let sb = LittleEndian::read_u16(&b[i..]) as u32;
                let blended = (sa * (1024 - w) + sb * w + 512) >> 10;
                LittleEndian::write_u16(&mut dst[i..], blended as u16);
            }
        }
        Ok(needed)
    }
}

/// Map a normalized wipe color onto studio-range samples at the packing's
/// bit depth.
fn wipe_samples(col: &[f32; 3], bit_depth: u32) -> (u16, u16, u16) {
    let luma = (16.0 + col[0].clamp(0.0, 1.0) * 219.0).round() as u16;
    let cb = (128.0 + col[1].clamp(-0.5, 0.5) * 224.0).round() as u16;
    let cr = (128.0 + col[2].clamp(-0.5, 0.5) * 224.0).round() as u16;
    if bit_depth == 8 {
        (luma, cb, cr)
    } else {
        (luma << 2, cb << 2, cr << 2)
    }
}

fn fill_samples(buf: &mut [u8], count: usize, value: u16, bytes_per_sample: usize) {
    if bytes_per_sample == 1 {
        buf[..count].fill(value as u8);
    } else {
        for i in 0..count {
            LittleEndian::write_u16(&mut buf[i * 2..], value);
        }
    }
}
