//! Unpackers: one per packing, each producing the canonical 10-bit 4:2:2
//! intermediate.
//!
//! Callers are responsible for presenting a source buffer of at least the
//! packing's computed frame size; the sessions and [`crate::Repacker`]
//! validate that before these run.

use crate::planar::PlanarImage;
use byteorder::{ByteOrder, LittleEndian};
use framemill_core::{Packing, VideoFormat};

/// Unpack a frame into the canonical intermediate.
pub fn unpack(format: &VideoFormat, src: &[u8]) -> PlanarImage {
    let (w, h) = (format.width(), format.height());
    match format.packing() {
        Packing::Planar420 => unpack_planar420(src, w, h),
        Packing::Yuv422p10 => unpack_yuv422p10(src, w, h),
        Packing::Uyvy10 => unpack_uyvy10(src, w, h),
        Packing::Pgroup => unpack_pgroup(src, w, h),
        Packing::V210 => unpack_v210(src, w, h),
    }
}

/// Planar 4:2:0 8-bit: samples scale up by two bits, chroma rows are
/// duplicated to restore full-height 4:2:2 chroma.
pub fn unpack_planar420(src: &[u8], width: u32, height: u32) -> PlanarImage {
    let mut img = PlanarImage::new(width, height);
    let (w, h, cw) = (width as usize, height as usize, (width / 2) as usize);
    let luma_bytes = w * h;
    let chroma_rows = h / 2 + h % 2;
    let chroma_bytes = cw * chroma_rows;

    for (dst, &s) in img.y.iter_mut().zip(&src[..luma_bytes]) {
        *dst = (s as u16) << 2;
    }
    let cb_plane = &src[luma_bytes..luma_bytes + chroma_bytes];
    let cr_plane = &src[luma_bytes + chroma_bytes..luma_bytes + 2 * chroma_bytes];
    for row in 0..h {
        let src_row = (row / 2).min(chroma_rows - 1);
        for x in 0..cw {
            img.cb[row * cw + x] = (cb_plane[src_row * cw + x] as u16) << 2;
            img.cr[row * cw + x] = (cr_plane[src_row * cw + x] as u16) << 2;
        }
    }
    img
}

/// Planar 4:2:2 10-bit, three planes of little-endian 16-bit words.
pub fn unpack_yuv422p10(src: &[u8], width: u32, height: u32) -> PlanarImage {
    let mut img = PlanarImage::new(width, height);
    let luma_bytes = (width * height) as usize * 2;
    let chroma_bytes = luma_bytes / 2;

    LittleEndian::read_u16_into(&src[..luma_bytes], &mut img.y);
    LittleEndian::read_u16_into(&src[luma_bytes..luma_bytes + chroma_bytes], &mut img.cb);
    LittleEndian::read_u16_into(
        &src[luma_bytes + chroma_bytes..luma_bytes + 2 * chroma_bytes],
        &mut img.cr,
    );
    img
}

/// Packed U,Y,V,Y little-endian 16-bit words.
pub fn unpack_uyvy10(src: &[u8], width: u32, height: u32) -> PlanarImage {
    let mut img = PlanarImage::new(width, height);
    let (w, h, cw) = (width as usize, height as usize, (width / 2) as usize);
    let stride = w * 4;

    for row in 0..h {
        let line = &src[row * stride..(row + 1) * stride];
        for pair in 0..cw {
            let off = pair * 8;
            img.cb[row * cw + pair] = LittleEndian::read_u16(&line[off..]);
            img.y[row * w + pair * 2] = LittleEndian::read_u16(&line[off + 2..]);
            img.cr[row * cw + pair] = LittleEndian::read_u16(&line[off + 4..]);
            img.y[row * w + pair * 2 + 1] = LittleEndian::read_u16(&line[off + 6..]);
        }
    }
    img
}

/// Packed pgroup: five bytes carry U, Y0, V, Y1 at 10 bits each,
/// big-endian bit order.
pub fn unpack_pgroup(src: &[u8], width: u32, height: u32) -> PlanarImage {
    let mut img = PlanarImage::new(width, height);
    let (w, h, cw) = (width as usize, height as usize, (width / 2) as usize);
    let stride = w * 5 / 2;

    for row in 0..h {
        let line = &src[row * stride..(row + 1) * stride];
        for pair in 0..cw {
            let g = &line[pair * 5..pair * 5 + 5];
            let (b0, b1, b2, b3, b4) = (
                g[0] as u16,
                g[1] as u16,
                g[2] as u16,
                g[3] as u16,
                g[4] as u16,
            );
            img.cb[row * cw + pair] = (b0 << 2) | (b1 >> 6);
            img.y[row * w + pair * 2] = ((b1 & 0x3f) << 4) | (b2 >> 4);
            img.cr[row * cw + pair] = ((b2 & 0x0f) << 6) | (b3 >> 2);
            img.y[row * w + pair * 2 + 1] = ((b3 & 0x03) << 8) | b4;
        }
    }
    img
}

/// V210: four little-endian 32-bit words carry six pixels, components at
/// bits 0, 10 and 20. Trailing partial groups only carry the components
/// that exist at the configured width.
pub fn unpack_v210(src: &[u8], width: u32, height: u32) -> PlanarImage {
    let mut img = PlanarImage::new(width, height);
    let (w, h, cw) = (width as usize, height as usize, (width / 2) as usize);
    let stride = Packing::V210.line_stride(width);
    let groups = w.div_ceil(6);

    for row in 0..h {
        let line = &src[row * stride..(row + 1) * stride];
        for g in 0..groups {
            let px = g * 6;
            let cx = px / 2;
            let words = [
                LittleEndian::read_u32(&line[g * 16..]),
                LittleEndian::read_u32(&line[g * 16 + 4..]),
                LittleEndian::read_u32(&line[g * 16 + 8..]),
                LittleEndian::read_u32(&line[g * 16 + 12..]),
            ];
            // (word, shift) positions of the group's samples in order:
            // U0 Y0 V0 / Y1 U1 Y2 / V1 Y3 U2 / Y4 V2 Y5
            let sample = |word: usize, slot: u32| ((words[word] >> (slot * 10)) & 0x3ff) as u16;

            let lumas = [
                (px, sample(0, 1)),
                (px + 1, sample(1, 0)),
                (px + 2, sample(1, 2)),
                (px + 3, sample(2, 1)),
                (px + 4, sample(3, 0)),
                (px + 5, sample(3, 2)),
            ];
            for (idx, value) in lumas {
                if idx < w {
                    img.y[row * w + idx] = value;
                }
            }
            let cbs = [
                (cx, sample(0, 0)),
                (cx + 1, sample(1, 1)),
                (cx + 2, sample(2, 2)),
            ];
            let crs = [
                (cx, sample(0, 2)),
                (cx + 1, sample(2, 0)),
                (cx + 2, sample(3, 1)),
            ];
            for (idx, value) in cbs {
                if idx < cw {
                    img.cb[row * cw + idx] = value;
                }
            }
            for (idx, value) in crs {
                if idx < cw {
                    img.cr[row * cw + idx] = value;
                }
            }
        }
    }
    img
}
