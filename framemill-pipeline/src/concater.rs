//! Buffer concatenation session.

use crate::queue::{Completion, OperationOutput};
use crate::session::{require_dst, SessionCore, SessionState};
use framemill_codecs::concat_buffers;
use framemill_core::{Error, Result, TagMap, VideoFormat};
use tracing::info;

/// Stitches an ordered list of source buffers into one destination frame
/// of the configured format. Byte layout only; no pixel transformation.
pub struct Concater {
    core: SessionCore,
    format: Option<VideoFormat>,
}

impl Concater {
    /// Create an unconfigured concater with a running worker.
    pub fn new() -> Self {
        Self {
            core: SessionCore::new("concater"),
            format: None,
        }
    }

    /// Configure the destination format. Returns the destination buffer
    /// size an operation requires.
    pub fn set_info(&mut self, dst_tags: &TagMap) -> Result<usize> {
        self.core.ensure_can_configure()?;
        let format = VideoFormat::from_tags(dst_tags)?;
        info!(destination = %format, "concater configured");
        self.format = Some(format);
        self.core.mark_configured();
        Ok(format.frame_bytes())
    }

    /// Queue one concatenation of the source buffers, in order.
    pub fn concat(
        &self,
        sources: Vec<Vec<u8>>,
        dst: Option<Vec<u8>>,
    ) -> Result<(usize, Completion)> {
        self.core.configured(self.format)?;
        self.core.submit(Box::new(move || {
            if sources.is_empty() {
                return Err(Error::missing("source"));
            }
            let mut dst = require_dst(dst)?;
            let bytes_written = concat_buffers(&sources, &mut dst)?;
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

impl Default for Concater {
    fn default() -> Self {
        Self::new()
    }
}
