//! The bitstream codec boundary.
//!
//! The engine never implements entropy coding itself; it normalizes frames
//! to the 8-bit 4:2:0 layout a codec consumes and drives an implementation
//! of [`FrameEncoder`] / [`FrameDecoder`]. The built-in [`RleCodec`] is a
//! deterministic byte run-length scheme, enough to exercise the encode and
//! decode paths end to end and round-trip bit-exactly; real codecs plug in
//! behind the same traits.

use crate::planar::Planar420Image;
use framemill_core::{ConfigError, EncodeParams, Error, Packing, Result};
use tracing::debug;

/// Information about a codec implementation.
#[derive(Debug, Clone)]
pub struct CodecInfo {
    /// Codec name, as used in the `encodingName` configuration tag.
    pub name: &'static str,
    /// Long name/description.
    pub long_name: &'static str,
    /// Whether this codec supports encoding.
    pub can_encode: bool,
    /// Whether this codec supports decoding.
    pub can_decode: bool,
}

/// Common trait for frame encoders.
pub trait FrameEncoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Encode a frame, returning the coded payload.
    fn encode(&mut self, frame: &Planar420Image) -> Result<Vec<u8>>;

    /// Reset the encoder state.
    fn reset(&mut self);
}

/// Common trait for frame decoders.
pub trait FrameDecoder: Send {
    /// Get codec information.
    fn codec_info(&self) -> CodecInfo;

    /// Decode a coded payload into a frame of the given geometry.
    fn decode(&mut self, payload: &[u8], width: u32, height: u32) -> Result<Planar420Image>;

    /// Reset the decoder state.
    fn reset(&mut self);
}

/// Look up an encoder implementation by its `encodingName` tag value.
pub fn encoder_for(
    name: &str,
    params: EncodeParams,
) -> std::result::Result<Box<dyn FrameEncoder>, ConfigError> {
    match name {
        "rle" => Ok(Box::new(RleCodec::new(params))),
        other => Err(ConfigError::UnsupportedEncoding(other.to_string())),
    }
}

/// Look up a decoder implementation by its `encodingName` tag value.
pub fn decoder_for(name: &str) -> std::result::Result<Box<dyn FrameDecoder>, ConfigError> {
    match name {
        "rle" => Ok(Box::new(RleCodec::new(EncodeParams::default()))),
        other => Err(ConfigError::UnsupportedEncoding(other.to_string())),
    }
}

/// Byte run-length codec over the contiguous 4:2:0 frame bytes.
///
/// Payload format: a sequence of `(count, value)` byte pairs, runs capped
/// at 255. Codec parameters are accepted for interface parity and logged;
/// run-length coding has no rate control to apply them to.
pub struct RleCodec {
    params: EncodeParams,
    frames_coded: u64,
}

impl RleCodec {
    /// Create a codec instance.
    pub fn new(params: EncodeParams) -> Self {
        debug!(%params, "rle codec configured");
        Self {
            params,
            frames_coded: 0,
        }
    }

    /// The configured codec parameters.
    pub fn params(&self) -> EncodeParams {
        self.params
    }

    fn info() -> CodecInfo {
        CodecInfo {
            name: "rle",
            long_name: "Byte run-length coding",
            can_encode: true,
            can_decode: true,
        }
    }
}

impl FrameEncoder for RleCodec {
    fn codec_info(&self) -> CodecInfo {
        Self::info()
    }

    fn encode(&mut self, frame: &Planar420Image) -> Result<Vec<u8>> {
        let bytes = frame.bytes();
        let mut payload = Vec::with_capacity(bytes.len() / 64);
        let mut i = 0;
        while i < bytes.len() {
            let value = bytes[i];
            let mut run = 1usize;
            while run < 255 && i + run < bytes.len() && bytes[i + run] == value {
                run += 1;
            }
            payload.push(run as u8);
            payload.push(value);
            i += run;
        }
        self.frames_coded += 1;
        Ok(payload)
    }

    fn reset(&mut self) {
        self.frames_coded = 0;
    }
}

impl FrameDecoder for RleCodec {
    fn codec_info(&self) -> CodecInfo {
        Self::info()
    }

    fn decode(&mut self, payload: &[u8], width: u32, height: u32) -> Result<Planar420Image> {
        if payload.len() % 2 != 0 {
            return Err(Error::Codec("truncated run-length pair".into()));
        }
        let expected = Packing::Planar420.frame_bytes(width, height);
        let mut bytes = Vec::with_capacity(expected);
        for pair in payload.chunks_exact(2) {
            let (run, value) = (pair[0] as usize, pair[1]);
            if run == 0 {
                return Err(Error::Codec("zero-length run".into()));
            }
            bytes.resize(bytes.len() + run, value);
            if bytes.len() > expected {
                return Err(Error::Codec(format!(
                    "decoded {} bytes for a {} byte frame",
                    bytes.len(),
                    expected
                )));
            }
        }
        if bytes.len() != expected {
            return Err(Error::Codec(format!(
                "decoded {} bytes for a {} byte frame",
                bytes.len(),
                expected
            )));
        }
        Planar420Image::from_bytes(width, height, bytes).map_err(Error::from)
    }

    fn reset(&mut self) {
        self.frames_coded = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(width: u32, height: u32) -> Planar420Image {
        let luma = (width * height) as usize;
        let mut bytes = vec![0x10u8; luma];
        bytes.extend(std::iter::repeat(0x80).take(luma / 2));
        Planar420Image::from_bytes(width, height, bytes).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let frame = test_frame(16, 8);
        let mut codec = RleCodec::new(EncodeParams::default());
        let payload = codec.encode(&frame).unwrap();
        let decoded = codec.decode(&payload, 16, 8).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_uniform_frame_codes_small() {
        // A flat 4:2:0 frame must fit the width*height coded budget with
        // lots of room to spare.
        let frame = test_frame(64, 32);
        let mut codec = RleCodec::new(EncodeParams::default());
        let payload = codec.encode(&frame).unwrap();
        assert!(payload.len() < 64 * 32);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        let mut codec = RleCodec::new(EncodeParams::default());
        assert!(matches!(codec.decode(&[1], 4, 2), Err(Error::Codec(_))));
        assert!(matches!(codec.decode(&[0, 9], 4, 2), Err(Error::Codec(_))));
        // Wrong total length for the geometry.
        assert!(matches!(codec.decode(&[3, 9], 4, 2), Err(Error::Codec(_))));
    }

    #[test]
    fn test_unknown_encoding_name() {
        assert!(matches!(
            encoder_for("h265", EncodeParams::default()),
            Err(ConfigError::UnsupportedEncoding(_))
        ));
        assert!(decoder_for("rle").is_ok());
    }
}
