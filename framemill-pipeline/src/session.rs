//! Shared session lifecycle.
//!
//! Every processing unit moves through the same state machine:
//!
//! ```text
//! Unconfigured -> Configured -> Draining -> Terminated
//! ```
//!
//! Configuration is allowed while `Unconfigured` or `Configured`
//! (reconfiguring just replaces the descriptors). Submissions are only
//! valid while `Configured`. `quit` starts the drain; queued operations
//! finish, then the worker exits.

use crate::queue::{Completion, OperationQueue, OperationResult};
use framemill_core::{Error, Result};
use tracing::info;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, formats not yet negotiated.
    Unconfigured,
    /// Formats negotiated; accepting submissions.
    Configured,
    /// Quit requested; queued operations are finishing.
    Draining,
    /// Worker exited; the session is inert.
    Terminated,
}

impl SessionState {
    /// Lowercase name used in errors and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Draining => "draining",
            Self::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State machine plus operation queue, embedded by every session type.
pub struct SessionCore {
    name: &'static str,
    state: SessionState,
    queue: OperationQueue,
}

impl SessionCore {
    /// Create an unconfigured session core with a running worker.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: SessionState::Unconfigured,
            queue: OperationQueue::new(name),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of operations queued and not yet completed.
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Gate for configure calls; allowed until the session starts
    /// draining.
    pub fn ensure_can_configure(&self) -> Result<()> {
        match self.state {
            SessionState::Unconfigured | SessionState::Configured => Ok(()),
            other => Err(Error::SessionState {
                expected: "unconfigured or configured",
                actual: other.as_str(),
            }),
        }
    }

    /// Record a successful configuration.
    pub fn mark_configured(&mut self) {
        self.state = SessionState::Configured;
    }

    /// Submit an operation; only valid while configured.
    pub fn submit(
        &self,
        job: Box<dyn FnOnce() -> OperationResult + Send + 'static>,
    ) -> Result<(usize, Completion)> {
        if self.state != SessionState::Configured {
            return Err(Error::SessionState {
                expected: SessionState::Configured.as_str(),
                actual: self.state.as_str(),
            });
        }
        self.queue.submit(job)
    }

    /// Stop accepting work and let queued operations drain.
    pub fn quit(&mut self) {
        if matches!(self.state, SessionState::Draining | SessionState::Terminated) {
            return;
        }
        info!(session = self.name, "quit requested");
        self.state = SessionState::Draining;
        self.queue.quit();
    }

    /// Block until the drain finishes; the session ends `Terminated`.
    pub fn wait_exit(&mut self) -> Result<()> {
        self.queue.wait_exit()?;
        self.state = SessionState::Terminated;
        info!(session = self.name, "session terminated");
        Ok(())
    }

    /// Unwrap a resource created at configure time, mapping absence to a
    /// session state error.
    pub fn configured<T>(&self, value: Option<T>) -> Result<T> {
        value.ok_or(Error::SessionState {
            expected: SessionState::Configured.as_str(),
            actual: self.state.as_str(),
        })
    }
}

/// Merge an operation's source buffers into one contiguous frame. Multiple
/// buffers are planes of a single frame, in plane order; an empty list is
/// the missing-source error.
pub(crate) fn coalesce_sources(mut sources: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    match sources.len() {
        0 => Err(Error::missing("source")),
        1 => Ok(sources.pop().unwrap_or_default()),
        _ => Ok(sources.concat()),
    }
}

/// Require the destination buffer argument.
pub(crate) fn require_dst(dst: Option<Vec<u8>>) -> Result<Vec<u8>> {
    dst.ok_or(Error::missing("destination"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::OperationOutput;

    #[test]
    fn test_submit_requires_configured() {
        let core = SessionCore::new("unit");
        let err = core
            .submit(Box::new(|| {
                Ok(OperationOutput {
                    dst: Vec::new(),
                    bytes_written: 0,
                })
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SessionState {
                actual: "unconfigured",
                ..
            }
        ));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut core = SessionCore::new("unit");
        assert_eq!(core.state(), SessionState::Unconfigured);
        core.mark_configured();
        assert_eq!(core.state(), SessionState::Configured);
        core.quit();
        assert_eq!(core.state(), SessionState::Draining);
        core.wait_exit().unwrap();
        assert_eq!(core.state(), SessionState::Terminated);
        assert!(core.ensure_can_configure().is_err());
    }
}
