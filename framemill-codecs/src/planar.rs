//! Canonical planar images used as conversion intermediates.
//!
//! Every cross-packing conversion goes through [`PlanarImage`], a 10-bit
//! 4:2:2 planar triple holding the highest depth and chroma resolution of
//! any supported packing, so the codec table needs one unpacker and one
//! packer per format instead of a quadratic matrix of direct converters.
//!
//! Depth conversion is exact by construction: an 8-bit sample becomes
//! `v << 2` on the way up and `v >> 2` (truncating) on the way down, so
//! 8 → 10 → 8 round trips reproduce the original bytes. Chroma rows are
//! duplicated when upsampling 4:2:0 and averaged pairwise, at destination
//! depth, when downsampling back.

use framemill_core::{ConfigError, Packing, VideoFormat};

/// Canonical 10-bit 4:2:2 planar image: full-resolution luma plus two
/// half-width, full-height chroma planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanarImage {
    width: u32,
    height: u32,
    /// Luma samples, `width * height`.
    pub y: Vec<u16>,
    /// Cb samples, `width/2 * height`.
    pub cb: Vec<u16>,
    /// Cr samples, `width/2 * height`.
    pub cr: Vec<u16>,
}

impl PlanarImage {
    /// Create a zeroed canonical image.
    pub fn new(width: u32, height: u32) -> Self {
        let luma = (width * height) as usize;
        let chroma = (width / 2 * height) as usize;
        Self {
            width,
            height,
            y: vec![0; luma],
            cb: vec![0; chroma],
            cr: vec![0; chroma],
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Chroma plane width in samples.
    pub fn chroma_width(&self) -> u32 {
        self.width / 2
    }
}

/// 8-bit 4:2:0 planar frame in the contiguous Y-Cb-Cr byte layout the
/// bitstream codecs consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planar420Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Planar420Image {
    /// Create a zeroed 4:2:0 frame.
    pub fn new(width: u32, height: u32) -> Self {
        let bytes = Packing::Planar420.frame_bytes(width, height);
        Self {
            width,
            height,
            data: vec![0; bytes],
        }
    }

    /// Wrap an existing contiguous 4:2:0 byte buffer.
    pub fn from_bytes(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ConfigError> {
        let format = VideoFormat::new(Packing::Planar420, width, height)?;
        if data.len() != format.frame_bytes() {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a 4:2:0 frame from a canonical image.
    pub fn from_canonical(img: &PlanarImage) -> Self {
        let mut out = Self::new(img.width(), img.height());
        crate::pack::pack_planar420(img, &mut out.data);
        out
    }

    /// Expand back to the canonical 10-bit 4:2:2 intermediate.
    pub fn to_canonical(&self) -> PlanarImage {
        crate::unpack::unpack_planar420(&self.data, self.width, self.height)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The contiguous Y-Cb-Cr bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Luma plane.
    pub fn y(&self) -> &[u8] {
        &self.data[..(self.width * self.height) as usize]
    }

    /// Cb plane.
    pub fn cb(&self) -> &[u8] {
        let luma = (self.width * self.height) as usize;
        &self.data[luma..luma + luma / 4]
    }

    /// Cr plane.
    pub fn cr(&self) -> &[u8] {
        let luma = (self.width * self.height) as usize;
        &self.data[luma + luma / 4..]
    }
}
