//! Pixel packings and the video format descriptor.
//!
//! A [`Packing`] names one of the five supported uncompressed layouts and
//! knows its geometry: bit depth, plane count, line stride and the exact
//! byte size of a frame. A [`VideoFormat`] pairs a packing with validated
//! dimensions and is the immutable descriptor every session is configured
//! with.

use crate::error::ConfigError;
use crate::tags::TagMap;
use std::fmt;
use std::str::FromStr;

/// Pixel packing for uncompressed video frames.
///
/// All five packings are Y'CbCr with horizontal chroma subsampling, so a
/// valid frame width is always even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Packing {
    /// Planar 4:2:0, 8-bit. Three planes; chroma pitch and height are half
    /// the luma pitch and height.
    Planar420,
    /// Planar 4:2:2, 10-bit in 16-bit little-endian words. Three planes;
    /// chroma pitch is half the luma pitch, full height.
    Yuv422p10,
    /// Packed 4:2:2, 10-bit in 16-bit little-endian words, U Y V Y order.
    Uyvy10,
    /// Packed 4:2:2, 10-bit; five bytes carry one two-pixel U Y V Y group
    /// with big-endian bit packing (the RTP "pgroup" layout).
    Pgroup,
    /// Packed 4:2:2, 10-bit; six pixels in four little-endian 32-bit
    /// words, lines padded to 48-pixel groups.
    V210,
}

impl Packing {
    /// Bit depth of a stored sample.
    pub fn bit_depth(&self) -> u32 {
        match self {
            Self::Planar420 => 8,
            _ => 10,
        }
    }

    /// Number of buffers/planes in a frame.
    pub fn num_planes(&self) -> usize {
        match self {
            Self::Planar420 | Self::Yuv422p10 => 3,
            Self::Uyvy10 | Self::Pgroup | Self::V210 => 1,
        }
    }

    /// Check whether this is a planar layout.
    pub fn is_planar(&self) -> bool {
        self.num_planes() > 1
    }

    /// Chroma subsampling factors (horizontal, vertical).
    pub fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Planar420 => (2, 2),
            _ => (2, 1),
        }
    }

    /// Bytes per scan line. For planar packings this is the luma pitch;
    /// chroma pitch is half of it.
    pub fn line_stride(&self, width: u32) -> usize {
        let width = width as usize;
        match self {
            Self::Planar420 => width,
            Self::Yuv422p10 => width * 2,
            Self::Uyvy10 => width * 4,
            Self::Pgroup => width * 5 / 2,
            // Lines pad out to 48-pixel groups, 16 bytes per 6 pixels.
            Self::V210 => width.div_ceil(48) * 48 * 8 / 3,
        }
    }

    /// Total frame size in bytes for the given dimensions.
    pub fn frame_bytes(&self, width: u32, height: u32) -> usize {
        let height = height as usize;
        match self {
            Self::Planar420 => self.line_stride(width) * height * 3 / 2,
            Self::Yuv422p10 => self.line_stride(width) * height * 2,
            Self::Uyvy10 | Self::Pgroup | Self::V210 => self.line_stride(width) * height,
        }
    }

    /// The wire name used in configuration tag maps.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Planar420 => "420P",
            Self::Yuv422p10 => "YUV422P10",
            Self::Uyvy10 => "UYVY10",
            Self::Pgroup => "pgroup",
            Self::V210 => "v210",
        }
    }
}

impl fmt::Display for Packing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Packing {
    type Err = ConfigError;

    /// Parse a wire name. "4175" is accepted as an alias for pgroup, the
    /// RTP payload format code the original wire contract also used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "420P" => Ok(Self::Planar420),
            "YUV422P10" => Ok(Self::Yuv422p10),
            "UYVY10" => Ok(Self::Uyvy10),
            "pgroup" | "4175" => Ok(Self::Pgroup),
            "v210" => Ok(Self::V210),
            other => Err(ConfigError::UnsupportedPacking(other.to_string())),
        }
    }
}

/// Scan order of a frame. Informational only; it never changes buffer
/// geometry in this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interlace {
    /// Progressive scan.
    #[default]
    Progressive,
    /// Interlaced, top field first.
    TopFieldFirst,
    /// Interlaced, bottom field first.
    BottomFieldFirst,
}

impl Interlace {
    /// The wire name used in configuration tag maps.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Progressive => "prog",
            Self::TopFieldFirst => "tff",
            Self::BottomFieldFirst => "bff",
        }
    }
}

impl fmt::Display for Interlace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Validated description of a frame's geometry and pixel layout.
///
/// Immutable once a session is configured; reconfiguring a session simply
/// replaces its descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormat {
    packing: Packing,
    width: u32,
    height: u32,
    interlace: Interlace,
}

impl VideoFormat {
    /// Create a validated format descriptor.
    pub fn new(packing: Packing, width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if width % 2 != 0 {
            return Err(ConfigError::OddWidth(width));
        }
        // Vertically subsampled chroma needs whole row pairs.
        if packing.chroma_subsampling().1 == 2 && height % 2 != 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        Ok(Self {
            packing,
            width,
            height,
            interlace: Interlace::default(),
        })
    }

    /// Set the scan order.
    pub fn with_interlace(mut self, interlace: Interlace) -> Self {
        self.interlace = interlace;
        self
    }

    /// Build a format descriptor from a configuration tag map.
    ///
    /// Missing keys take the wire contract's defaults: 1920x1080, pgroup,
    /// progressive. An `interlace` tag of `1`/`true`/`tff` selects top
    /// field first, `bff` bottom field first.
    pub fn from_tags(tags: &TagMap) -> Result<Self, ConfigError> {
        let packing: Packing = tags.str_value("packing", "pgroup").parse()?;
        let width = tags.num_value("width", 1920);
        let height = tags.num_value("height", 1080);
        let interlace = match tags.str_value("interlace", "0").as_str() {
            "1" | "true" | "tff" => Interlace::TopFieldFirst,
            "bff" => Interlace::BottomFieldFirst,
            _ => Interlace::Progressive,
        };
        Ok(Self::new(packing, width, height)?.with_interlace(interlace))
    }

    /// The pixel packing.
    pub fn packing(&self) -> Packing {
        self.packing
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Scan order.
    pub fn interlace(&self) -> Interlace {
        self.interlace
    }

    /// Total frame size in bytes.
    pub fn frame_bytes(&self) -> usize {
        self.packing.frame_bytes(self.width, self.height)
    }

    /// Bytes per scan line (luma pitch for planar packings).
    pub fn line_stride(&self) -> usize {
        self.packing.line_stride(self.width)
    }

    /// Check that another format shares this format's dimensions.
    pub fn ensure_same_geometry(&self, other: &VideoFormat) -> Result<(), ConfigError> {
        if self.width != other.width || self.height != other.height {
            return Err(ConfigError::GeometryMismatch {
                src_width: self.width,
                src_height: self.height,
                dst_width: other.width,
                dst_height: other.height,
            });
        }
        Ok(())
    }

    /// Check that another format shares this format's packing.
    pub fn ensure_same_packing(&self, other: &VideoFormat) -> Result<(), ConfigError> {
        if self.packing != other.packing {
            return Err(ConfigError::PackingMismatch {
                src: self.packing.to_string(),
                dst: other.packing.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scan = if self.interlace == Interlace::Progressive {
            'P'
        } else {
            'I'
        };
        write!(
            f,
            "{}x{}, {}, {}",
            self.width, self.height, scan, self.packing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_bytes() {
        assert_eq!(Packing::Planar420.frame_bytes(1920, 1080), 3_110_400);
        assert_eq!(Packing::Pgroup.frame_bytes(1920, 1080), 5_184_000);
        assert_eq!(Packing::Yuv422p10.frame_bytes(1280, 720), 3_686_400);
        assert_eq!(Packing::Uyvy10.frame_bytes(1280, 720), 3_686_400);
    }

    #[test]
    fn test_v210_line_padding() {
        // 1280 pads to 1296 pixels, 16 bytes per 6 pixels.
        assert_eq!(Packing::V210.line_stride(1280), 3456);
        assert_eq!(Packing::V210.frame_bytes(1280, 720), 3456 * 720);
        // An exact multiple of 48 needs no padding.
        assert_eq!(Packing::V210.line_stride(1920), 1920 * 8 / 3);
    }

    #[test]
    fn test_bit_depth() {
        assert_eq!(Packing::Planar420.bit_depth(), 8);
        assert_eq!(Packing::Pgroup.bit_depth(), 10);
        assert_eq!(Packing::V210.bit_depth(), 10);
    }

    #[test]
    fn test_parse_wire_names() {
        assert_eq!("420P".parse::<Packing>().unwrap(), Packing::Planar420);
        assert_eq!("pgroup".parse::<Packing>().unwrap(), Packing::Pgroup);
        assert_eq!("4175".parse::<Packing>().unwrap(), Packing::Pgroup);
        assert!("RGBA8".parse::<Packing>().is_err());
    }

    #[test]
    fn test_format_validation() {
        assert!(VideoFormat::new(Packing::Planar420, 1920, 1080).is_ok());
        assert!(matches!(
            VideoFormat::new(Packing::Planar420, 0, 1080),
            Err(ConfigError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            VideoFormat::new(Packing::Pgroup, 21, 720),
            Err(ConfigError::OddWidth(21))
        ));
        // 4:2:0 subsamples vertically, so its height must be even too.
        assert!(VideoFormat::new(Packing::Planar420, 1920, 719).is_err());
        assert!(VideoFormat::new(Packing::Pgroup, 1920, 719).is_ok());
    }

    #[test]
    fn test_from_tags_defaults() {
        let fmt = VideoFormat::from_tags(&TagMap::new()).unwrap();
        assert_eq!(fmt.packing(), Packing::Pgroup);
        assert_eq!(fmt.width(), 1920);
        assert_eq!(fmt.height(), 1080);
        assert_eq!(fmt.interlace(), Interlace::Progressive);
    }

    #[test]
    fn test_display() {
        let fmt = VideoFormat::new(Packing::Planar420, 1280, 720)
            .unwrap()
            .with_interlace(Interlace::TopFieldFirst);
        assert_eq!(fmt.to_string(), "1280x720, I, 420P");
    }
}
