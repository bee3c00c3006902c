//! Decoder session.
//!
//! Symmetric counterpart to the encoder session: coded payloads go in,
//! raw frames in the configured destination packing come out, with the
//! codec's 4:2:0 output repacked through the same codec table.

use crate::queue::{Completion, OperationOutput};
use crate::session::{coalesce_sources, require_dst, SessionCore, SessionState};
use framemill_codecs::{decoder_for, FrameDecoder, Repacker};
use framemill_core::{Packing, Result, TagMap, VideoFormat};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Decodes coded payloads into raw frames of the configured packing.
pub struct Decoder {
    core: SessionCore,
    codec: Option<Arc<Mutex<Box<dyn FrameDecoder>>>>,
    denormalize: Option<Repacker>,
}

impl Decoder {
    /// Create an unconfigured decoder with a running worker.
    pub fn new() -> Self {
        Self {
            core: SessionCore::new("decoder"),
            codec: None,
            denormalize: None,
        }
    }

    /// Negotiate the coded source and the raw destination format.
    ///
    /// The source tags name the codec (`encodingName`); dimensions must
    /// match the destination's. Returns the destination buffer size a
    /// decode operation requires.
    pub fn set_info(&mut self, src_tags: &TagMap, dst_tags: &TagMap) -> Result<usize> {
        self.core.ensure_can_configure()?;
        let src = VideoFormat::from_tags(src_tags)?;
        let dst = VideoFormat::from_tags(dst_tags)?;
        src.ensure_same_geometry(&dst)?;

        let encoding = src_tags.str_value("encodingName", "rle");
        let codec = decoder_for(&encoding)?;

        let codec_output = VideoFormat::new(Packing::Planar420, dst.width(), dst.height())?;
        let denormalize = Repacker::new(codec_output, dst)?;

        info!(encoding = %encoding, destination = %dst, "decoder configured");
        self.codec = Some(Arc::new(Mutex::new(codec)));
        self.denormalize = Some(denormalize);
        self.core.mark_configured();
        Ok(dst.frame_bytes())
    }

    /// Queue one coded payload for decoding.
    pub fn decode(
        &self,
        sources: Vec<Vec<u8>>,
        dst: Option<Vec<u8>>,
    ) -> Result<(usize, Completion)> {
        let codec = self.core.configured(self.codec.clone())?;
        let denormalize = self.core.configured(self.denormalize)?;
        self.core.submit(Box::new(move || {
            let payload = coalesce_sources(sources)?;
            let mut dst = require_dst(dst)?;

            let format = denormalize.src_format();
            let frame = codec.lock().decode(&payload, format.width(), format.height())?;
            let bytes_written = denormalize.repack(frame.bytes(), &mut dst)?;
            Ok(OperationOutput { dst, bytes_written })
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

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
