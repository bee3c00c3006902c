//! Scale-and-convert session.

use crate::queue::{Completion, OperationOutput};
use crate::session::{coalesce_sources, require_dst, SessionCore, SessionState};
use framemill_codecs::{ScaleParams, Scaler};
use framemill_core::{Result, TagMap, VideoFormat};
use tracing::info;

/// Resizes frames into a fixed destination format, converting packing on
/// the way. The source format travels with each operation, so one session
/// can serve inputs of varying geometry.
pub struct ScaleConverter {
    core: SessionCore,
    scaler: Option<Scaler>,
}

impl ScaleConverter {
    /// Create an unconfigured scale converter with a running worker.
    pub fn new() -> Self {
        Self {
            core: SessionCore::new("scale-converter"),
            scaler: None,
        }
    }

    /// Configure the destination format and resampling parameters.
    /// Returns the destination buffer size an operation requires.
    pub fn set_info(&mut self, dst_tags: &TagMap, params: ScaleParams) -> Result<usize> {
        self.core.ensure_can_configure()?;
        let dst = VideoFormat::from_tags(dst_tags)?;
        let scaler = Scaler::new(dst, params)?;
        info!(destination = %dst, ?params, "scale converter configured");
        let bytes = scaler.dst_bytes();
        self.scaler = Some(scaler);
        self.core.mark_configured();
        Ok(bytes)
    }

    /// Queue one scale-convert of a frame in the given source format.
    pub fn scale_convert(
        &self,
        sources: Vec<Vec<u8>>,
        src_format: VideoFormat,
        dst: Option<Vec<u8>>,
    ) -> Result<(usize, Completion)> {
        let scaler = self.core.configured(self.scaler.clone())?;
        self.core.submit(Box::new(move || {
            let src = coalesce_sources(sources)?;
            let mut dst = require_dst(dst)?;
            let bytes_written = scaler.scale_convert(&src_format, &src, &mut dst)?;
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

impl Default for ScaleConverter {
    fn default() -> Self {
        Self::new()
    }
}
