//! # Framemill Codecs
//!
//! Pure pixel kernels for the Framemill engine:
//! - The packing codec table: bit-exact conversion between the five
//!   supported uncompressed layouts through one canonical intermediate
//! - Spatial resampling between geometries
//! - Compositing primitives (wipe, copy, mix)
//! - Buffer concatenation and vertical flipping
//! - The bitstream codec boundary and the built-in run-length codec
//!
//! Everything here is synchronous and stateless beyond its configured
//! formats; the session layer in `framemill-pipeline` adds queueing and
//! lifecycle on top.

pub mod codec;
pub mod concat;
pub mod convert;
pub mod flip;
pub mod pack;
pub mod planar;
pub mod scale;
pub mod stamp;
pub mod unpack;

pub use codec::{decoder_for, encoder_for, CodecInfo, FrameDecoder, FrameEncoder, RleCodec};
pub use concat::concat_buffers;
pub use convert::Repacker;
pub use flip::{ensure_flippable, flip_vertical};
pub use planar::{Planar420Image, PlanarImage};
pub use scale::{ScaleParams, Scaler};
pub use stamp::{Compositor, CopyParams, MixParams, WipeParams};
