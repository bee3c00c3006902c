//! # Framemill Pipeline
//!
//! Asynchronous processing sessions for the Framemill engine.
//!
//! Each processing unit ([`Packer`], [`ScaleConverter`], [`Concater`],
//! [`Stamper`], [`Flipper`], [`Encoder`], [`Decoder`]) is a session: it
//! is configured once from tag maps, accepts operation submissions that
//! return a queue depth synchronously, and resolves each operation later
//! through its [`Completion`] handle. Completions within a session are
//! delivered in submission order; sessions are independent of each other.
//!
//! ```no_run
//! use framemill_core::TagMap;
//! use framemill_pipeline::Packer;
//!
//! # fn main() -> framemill_core::Result<()> {
//! let src: TagMap = [("packing", "pgroup"), ("width", "1280"), ("height", "720")]
//!     .into_iter()
//!     .collect();
//! let dst: TagMap = [("packing", "420P"), ("width", "1280"), ("height", "720")]
//!     .into_iter()
//!     .collect();
//!
//! let mut packer = Packer::new();
//! let dst_bytes = packer.set_info(&src, &dst)?;
//!
//! let frame = vec![0u8; 1280 * 720 * 5 / 2];
//! let (depth, completion) = packer.pack(vec![frame], Some(vec![0u8; dst_bytes]))?;
//! assert!(depth >= 1);
//! let output = completion.wait()?;
//! assert_eq!(output.bytes_written, dst_bytes);
//!
//! packer.quit();
//! packer.wait_exit()?;
//! # Ok(())
//! # }
//! ```

mod concater;
mod decoder;
mod encoder;
mod flipper;
mod packer;
mod queue;
mod scaler;
mod session;
mod stamper;

pub use concater::Concater;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use flipper::Flipper;
pub use packer::Packer;
pub use queue::{Completion, OperationOutput, OperationQueue, OperationResult};
pub use scaler::ScaleConverter;
pub use session::{SessionCore, SessionState};
pub use stamper::Stamper;
