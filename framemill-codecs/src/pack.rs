//! Packers: canonical intermediate to each supported packing.
//!
//! The 4:2:0 packer performs the depth conversion before averaging chroma
//! row pairs so its arithmetic matches the reference conversions exactly;
//! see [`pack_planar420`].

use crate::planar::PlanarImage;
use byteorder::{ByteOrder, LittleEndian};
use framemill_core::{Packing, VideoFormat};

/// Pack the canonical intermediate into the destination packing. The
/// destination slice must hold at least the packing's computed frame size.
pub fn pack(format: &VideoFormat, img: &PlanarImage, dst: &mut [u8]) {
    match format.packing() {
        Packing::Planar420 => pack_planar420(img, dst),
        Packing::Yuv422p10 => pack_yuv422p10(img, dst),
        Packing::Uyvy10 => pack_uyvy10(img, dst),
        Packing::Pgroup => pack_pgroup(img, dst),
        Packing::V210 => pack_v210(img, dst),
    }
}

/// Planar 4:2:0 8-bit. Samples drop to 8 bits first (`>> 2`, truncating),
/// then chroma row pairs average as `(even + odd) >> 1`; an unpaired
/// final row is reused as-is.
pub fn pack_planar420(img: &PlanarImage, dst: &mut [u8]) {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let cw = img.chroma_width() as usize;
    let luma_bytes = w * h;
    let chroma_rows = h / 2 + h % 2;
    let chroma_bytes = cw * chroma_rows;

    let (y_out, rest) = dst[..luma_bytes + 2 * chroma_bytes].split_at_mut(luma_bytes);
    let (cb_out, cr_out) = rest.split_at_mut(chroma_bytes);

    for (out, &s) in y_out.iter_mut().zip(&img.y) {
        *out = (s >> 2) as u8;
    }
    for row in 0..chroma_rows {
        let even = 2 * row;
        let odd = (2 * row + 1).min(h - 1);
        for x in 0..cw {
            let cb_e = (img.cb[even * cw + x] >> 2) as u8;
            let cb_o = (img.cb[odd * cw + x] >> 2) as u8;
            let cr_e = (img.cr[even * cw + x] >> 2) as u8;
            let cr_o = (img.cr[odd * cw + x] >> 2) as u8;
            cb_out[row * cw + x] = ((cb_e as u16 + cb_o as u16) >> 1) as u8;
            cr_out[row * cw + x] = ((cr_e as u16 + cr_o as u16) >> 1) as u8;
        }
    }
}

/// Planar 4:2:2 10-bit, three planes of little-endian 16-bit words.
pub fn pack_yuv422p10(img: &PlanarImage, dst: &mut [u8]) {
    let luma_bytes = img.y.len() * 2;
    let chroma_bytes = img.cb.len() * 2;

    LittleEndian::write_u16_into(&img.y, &mut dst[..luma_bytes]);
    LittleEndian::write_u16_into(&img.cb, &mut dst[luma_bytes..luma_bytes + chroma_bytes]);
    LittleEndian::write_u16_into(
        &img.cr,
        &mut dst[luma_bytes + chroma_bytes..luma_bytes + 2 * chroma_bytes],
    );
}

/// Packed U,Y,V,Y little-endian 16-bit words.
pub fn pack_uyvy10(img: &PlanarImage, dst: &mut [u8]) {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let cw = img.chroma_width() as usize;
    let stride = w * 4;

    for row in 0..h {
        let line = &mut dst[row * stride..(row + 1) * stride];
        for pair in 0..cw {
            let off = pair * 8;
            LittleEndian::write_u16(&mut line[off..], img.cb[row * cw + pair]);
            LittleEndian::write_u16(&mut line[off + 2..], img.y[row * w + pair * 2]);
            LittleEndian::write_u16(&mut line[off + 4..], img.cr[row * cw + pair]);
            LittleEndian::write_u16(&mut line[off + 6..], img.y[row * w + pair * 2 + 1]);
        }
    }
}

/// Packed pgroup: five bytes carry U, Y0, V, Y1 at 10 bits each,
/// big-endian bit order.
pub fn pack_pgroup(img: &PlanarImage, dst: &mut [u8]) {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let cw = img.chroma_width() as usize;
    let stride = w * 5 / 2;

    for row in 0..h {
        let line = &mut dst[row * stride..(row + 1) * stride];
        for pair in 0..cw {
            let u = img.cb[row * cw + pair];
            let y0 = img.y[row * w + pair * 2];
            let v = img.cr[row * cw + pair];
            let y1 = img.y[row * w + pair * 2 + 1];

            let g = &mut line[pair * 5..pair * 5 + 5];
            g[0] = (u >> 2) as u8;
            g[1] = (((u & 0x03) << 6) | (y0 >> 4)) as u8;
            g[2] = (((y0 & 0x0f) << 4) | (v >> 6)) as u8;
            g[3] = (((v & 0x3f) << 2) | (y1 >> 8)) as u8;
            g[4] = (y1 & 0xff) as u8;
        }
    }
}

/// V210: four little-endian 32-bit words per six pixels; components that
/// fall beyond the frame width and the 48-pixel line padding are zero.
pub fn pack_v210(img: &PlanarImage, dst: &mut [u8]) {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let cw = img.chroma_width() as usize;
    let stride = Packing::V210.line_stride(img.width());
    let groups = w.div_ceil(6);

    for row in 0..h {
        let line = &mut dst[row * stride..(row + 1) * stride];
        line.fill(0);
        for g in 0..groups {
            let px = g * 6;
            let cx = px / 2;
            let luma = |idx: usize| {
                if idx < w {
                    img.y[row * w + idx] as u32
                } else {
                    0
                }
            };
            let cb = |idx: usize| {
                if idx < cw {
                    img.cb[row * cw + idx] as u32
                } else {
                    0
                }
            };
            let cr = |idx: usize| {
                if idx < cw {
                    img.cr[row * cw + idx] as u32
                } else {
                    0
                }
            };

            let words = [
                cb(cx) | (luma(px) << 10) | (cr(cx) << 20),
                luma(px + 1) | (cb(cx + 1) << 10) | (luma(px + 2) << 20),
                cr(cx + 1) | (luma(px + 3) << 10) | (cb(cx + 2) << 20),
                luma(px + 4) | (cr(cx + 2) << 10) | (luma(px + 5) << 20),
            ];
            for (i, word) in words.into_iter().enumerate() {
                LittleEndian::write_u32(&mut line[g * 16 + i * 4..], word);
            }
        }
    }
}
