//! Encoder session.
//!
//! The session normalizes whatever source packing it was configured with
//! into the 8-bit 4:2:0 frames the bitstream codec consumes, then drives
//! the codec and returns the coded payload length per operation. The
//! codec itself is an opaque collaborator behind the
//! [`FrameEncoder`](framemill_codecs::FrameEncoder) trait.

use crate::queue::{Completion, OperationOutput};
use crate::session::{coalesce_sources, require_dst, SessionCore, SessionState};
use framemill_codecs::{encoder_for, FrameEncoder, Planar420Image, Repacker};
use framemill_core::{EncodeParams, Error, Packing, Result, TagMap, VideoFormat};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Feeds raw frames to a bitstream encoder, emitting coded payloads of
/// variable length.
pub struct Encoder {
    core: SessionCore,
    codec: Option<Arc<Mutex<Box<dyn FrameEncoder>>>>,
    normalize: Option<Repacker>,
    max_coded_bytes: usize,
}

impl Encoder {
    /// Create an unconfigured encoder with a running worker.
    pub fn new() -> Self {
        Self {
            core: SessionCore::new("encoder"),
            codec: None,
            normalize: None,
            max_coded_bytes: 0,
        }
    }

    /// Negotiate the raw source format and the coded destination.
    ///
    /// The destination tags name the codec (`encodingName`) and carry its
    /// parameters (`bitrate`, `gopFrames`). Source and destination
    /// dimensions must match. Returns the maximum coded buffer size,
    /// `width * height` bytes.
    pub fn set_info(&mut self, src_tags: &TagMap, dst_tags: &TagMap) -> Result<usize> {
        self.core.ensure_can_configure()?;
        let src = VideoFormat::from_tags(src_tags)?;
        let dst = VideoFormat::from_tags(dst_tags)?;
        src.ensure_same_geometry(&dst)?;

        let encoding = dst_tags.str_value("encodingName", "rle");
        let params = EncodeParams::from_tags(dst_tags);
        let codec = encoder_for(&encoding, params)?;

        // The codec consumes 4:2:0; repack every supported source packing
        // into it.
        let codec_input = VideoFormat::new(Packing::Planar420, src.width(), src.height())?;
        let normalize = Repacker::new(src, codec_input)?;

        info!(
            source = %src,
            encoding = %encoding,
            params = %params,
            "encoder configured"
        );
        self.max_coded_bytes = (src.width() * src.height()) as usize;
        self.codec = Some(Arc::new(Mutex::new(codec)));
        self.normalize = Some(normalize);
        self.core.mark_configured();
        Ok(self.max_coded_bytes)
    }

    /// Queue one frame for encoding. The completion carries the coded
    /// payload length.
    pub fn encode(
        &self,
        sources: Vec<Vec<u8>>,
        dst: Option<Vec<u8>>,
    ) -> Result<(usize, Completion)> {
        let codec = self.core.configured(self.codec.clone())?;
        let normalize = self.core.configured(self.normalize)?;
        self.core.submit(Box::new(move || {
            let src = coalesce_sources(sources)?;
            let mut dst = require_dst(dst)?;

            let mut raw = vec![0u8; normalize.dst_bytes()];
            normalize.repack(&src, &mut raw)?;
            let frame = Planar420Image::from_bytes(
                normalize.dst_format().width(),
                normalize.dst_format().height(),
                raw,
            )
            .map_err(Error::from)?;

            let payload = codec.lock().encode(&frame)?;
            if payload.len() > dst.len() {
                return Err(Error::too_small("destination", payload.len(), dst.len()));
            }
            dst[..payload.len()].copy_from_slice(&payload);
            Ok(OperationOutput {
                dst,
                bytes_written: payload.len(),
            })
        }))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.core.state()
    }

    /// Operations queued and not yet completed.
    pub fn queue_depth(&self) -> usize {
        self.core.queue_depth()
    }

    /// Stop accepting work; queued operations finish first.
    pub fn quit(&mut self) {
        self.core.quit();
    }

    /// Block until the drain finishes.
    pub fn wait_exit(&mut self) -> Result<()> {
        self.core.wait_exit()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
