//! Compositing session: wipe, copy and mix.

use crate::queue::{Completion, OperationOutput};
use crate::session::{require_dst, SessionCore, SessionState};
use framemill_codecs::{Compositor, CopyParams, MixParams, WipeParams};
use framemill_core::{Error, Result, TagMap, VideoFormat};
use tracing::info;

/// Composites planar frames: rectangle wipes, offset placement and
/// two-source blends.
pub struct Stamper {
    core: SessionCore,
    compositor: Option<Compositor>,
}

impl Stamper {
    /// Create an unconfigured stamper with a running worker.
    pub fn new() -> Self {
        Self {
            core: SessionCore::new("stamper"),
            compositor: None,
        }
    }

    /// Negotiate source and destination formats; both must share a planar
    /// packing. Returns the destination buffer size an operation requires.
    pub fn set_info(&mut self, src_tags: &TagMap, dst_tags: &TagMap) -> Result<usize> {
        self.core.ensure_can_configure()?;
        let src = VideoFormat::from_tags(src_tags)?;
        let dst = VideoFormat::from_tags(dst_tags)?;
        let compositor = Compositor::new(src, dst)?;
        info!(source = %src, destination = %dst, "stamper configured");
        let bytes = compositor.dst_bytes();
        self.compositor = Some(compositor);
        self.core.mark_configured();
        Ok(bytes)
    }

    /// Queue a rectangle fill of the destination.
    pub fn wipe(&self, dst: Option<Vec<u8>>, params: WipeParams) -> Result<(usize, Completion)> {
        let compositor = self.core.configured(self.compositor)?;
        self.core.submit(Box::new(move || {
            let mut dst = require_dst(dst)?;
            let bytes_written = compositor.wipe(&mut dst, &params)?;
            Ok(OperationOutput { dst, bytes_written })
        }))
    }

    /// Queue a placement of the first source frame at the configured
    /// origin.
    pub fn copy(
        &self,
        sources: Vec<Vec<u8>>,
        dst: Option<Vec<u8>>,
        params: CopyParams,
    ) -> Result<(usize, Completion)> {
        let compositor = self.core.configured(self.compositor)?;
        self.core.submit(Box::new(move || {
            let src = sources.into_iter().next().ok_or(Error::missing("source"))?;
            let mut dst = require_dst(dst)?;
            let bytes_written = compositor.copy(&src, &mut dst, &params)?;
            Ok(OperationOutput { dst, bytes_written })
        }))
    }

    /// Queue a blend of the first two source frames; extra sources are
    /// ignored.
    pub fn mix(
        &self,
        sources: Vec<Vec<u8>>,
        dst: Option<Vec<u8>>,
        params: MixParams,
    ) -> Result<(usize, Completion)> {
        let compositor = self.core.configured(self.compositor)?;
        self.core.submit(Box::new(move || {
            let mut sources = sources.into_iter();
            let a = sources.next().ok_or(Error::missing("source"))?;
            let b = sources.next().ok_or(Error::missing("source"))?;
            let mut dst = require_dst(dst)?;
            let bytes_written = compositor.mix(&a, &b, &mut dst, &params)?;
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

impl Default for Stamper {
    fn default() -> Self {
        Self::new()
    }
}
