//! Error types for the Framemill engine.
//!
//! Configuration problems are reported synchronously from the call that
//! configures a session; per-operation problems travel through the
//! operation's completion channel so a bad submission never tears down
//! the session.

use thiserror::Error;

/// Main error type for the Framemill engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (formats, dimensions, parameters).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A required buffer argument was absent at submission time.
    #[error("Missing {what} buffer")]
    MissingBuffer {
        /// Which buffer was missing ("source" or "destination").
        what: &'static str,
    },

    /// Buffer too small for the requested operation.
    #[error("Insufficient {what} buffer: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Which buffer was undersized.
        what: &'static str,
        needed: usize,
        available: usize,
    },

    /// An operation was submitted to a session in the wrong lifecycle state.
    #[error("Invalid session state: {actual}, expected {expected}")]
    SessionState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Bitstream codec failure.
    #[error("Codec error: {0}")]
    Codec(String),

    /// The session worker thread went away before delivering a result.
    #[error("Session worker terminated unexpectedly")]
    WorkerLost,
}

/// Configuration errors raised while negotiating session formats.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown or unsupported packing name.
    #[error("Unsupported packing '{0}'")]
    UnsupportedPacking(String),

    /// Unknown or unsupported coded-stream encoding name.
    #[error("Unsupported encoding '{0}'")]
    UnsupportedEncoding(String),

    /// Non-positive frame dimensions.
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// All supported packings subsample chroma horizontally.
    #[error("Width must be divisible by 2, got {0}")]
    OddWidth(u32),

    /// Source and destination geometry are incompatible for the operation.
    #[error("Geometry mismatch: source {src_width}x{src_height}, destination {dst_width}x{dst_height}")]
    GeometryMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },

    /// Source and destination packing must be identical for the operation.
    #[error("Packing mismatch: source {src}, destination {dst}")]
    PackingMismatch { src: String, dst: String },

    /// A rectangle parameter does not fit inside the frame.
    #[error("Rectangle [{x}, {y}, {w}, {h}] exceeds {width}x{height} frame")]
    RectOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },

    /// Invalid resampling parameters.
    #[error("Invalid scale parameters: {0}")]
    InvalidScale(String),
}

/// Result type alias using the engine's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a missing-buffer error for the named argument.
    pub fn missing(what: &'static str) -> Self {
        Error::MissingBuffer { what }
    }

    /// Create an insufficient-buffer error for the named argument.
    pub fn too_small(what: &'static str, needed: usize, available: usize) -> Self {
        Error::BufferTooSmall {
            what,
            needed,
            available,
        }
    }

    /// Check whether this is a configuration error.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check whether this error concerns a buffer argument rather than the
    /// session or its configuration.
    #[must_use]
    pub fn is_buffer(&self) -> bool {
        matches!(
            self,
            Error::MissingBuffer { .. } | Error::BufferTooSmall { .. }
        )
    }
}
