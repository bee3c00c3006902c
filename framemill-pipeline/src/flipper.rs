//! Vertical flip session for packed frames.

use crate::queue::{Completion, OperationOutput};
use crate::session::{coalesce_sources, require_dst, SessionCore, SessionState};
use framemill_codecs::{ensure_flippable, flip_vertical};
use framemill_core::{Result, TagMap, VideoFormat};
use tracing::info;

/// Reverses the scan-line order of packed frames. Output geometry equals
/// input geometry, so `set_info` returns the source frame size.
pub struct Flipper {
    core: SessionCore,
    format: Option<VideoFormat>,
}

impl Flipper {
    /// Create an unconfigured flipper with a running worker.
    pub fn new() -> Self {
        Self {
            core: SessionCore::new("flipper"),
            format: None,
        }
    }

    /// Configure the frame format; packed packings only. Returns the
    /// frame size a flip operation requires of both buffers.
    pub fn set_info(&mut self, src_tags: &TagMap) -> Result<usize> {
        self.core.ensure_can_configure()?;
        let format = VideoFormat::from_tags(src_tags)?;
        ensure_flippable(&format)?;
        info!(source = %format, "flipper configured");
        self.format = Some(format);
        self.core.mark_configured();
        Ok(format.frame_bytes())
    }

    /// Queue one vertical flip.
    pub fn flip(
        &self,
        sources: Vec<Vec<u8>>,
        dst: Option<Vec<u8>>,
    ) -> Result<(usize, Completion)> {
        let format = self.core.configured(self.format)?;
        self.core.submit(Box::new(move || {
            let src = coalesce_sources(sources)?;
            let mut dst = require_dst(dst)?;
            let bytes_written = flip_vertical(&format, &src, &mut dst)?;
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

impl Default for Flipper {
    fn default() -> Self {
        Self::new()
    }
}
