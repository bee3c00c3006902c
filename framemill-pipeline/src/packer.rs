//! Frame repacking session.

use crate::queue::{Completion, OperationOutput};
use crate::session::{coalesce_sources, require_dst, SessionCore, SessionState};
use framemill_codecs::Repacker;
use framemill_core::{Result, TagMap, VideoFormat};
use tracing::info;

/// Converts frames between pixel packings at a fixed geometry.
pub struct Packer {
    core: SessionCore,
    repacker: Option<Repacker>,
}

impl Packer {
    /// Create an unconfigured packer with a running worker.
    pub fn new() -> Self {
        Self {
            core: SessionCore::new("packer"),
            repacker: None,
        }
    }

    /// Negotiate source and destination formats. Returns the destination
    /// buffer size a pack operation requires.
    pub fn set_info(&mut self, src_tags: &TagMap, dst_tags: &TagMap) -> Result<usize> {
        self.core.ensure_can_configure()?;
        let src = VideoFormat::from_tags(src_tags)?;
        let dst = VideoFormat::from_tags(dst_tags)?;
        let repacker = Repacker::new(src, dst)?;
        info!(source = %src, destination = %dst, "packer configured");
        let bytes = repacker.dst_bytes();
        self.repacker = Some(repacker);
        self.core.mark_configured();
        Ok(bytes)
    }

    /// Queue one repack. Multiple source buffers are treated as planes of
    /// a single frame, in plane order.
    pub fn pack(
        &self,
        sources: Vec<Vec<u8>>,
        dst: Option<Vec<u8>>,
    ) -> Result<(usize, Completion)> {
        let repacker = self.core.configured(self.repacker)?;
        self.core.submit(Box::new(move || {
            let src = coalesce_sources(sources)?;
            let mut dst = require_dst(dst)?;
            let bytes_written = repacker.repack(&src, &mut dst)?;
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

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}
