//! # Framemill Core
//!
//! Core types shared across the Framemill raw-video engine:
//! - Error handling types
//! - Pixel packing and video format descriptors
//! - The tag-map configuration wire contract

pub mod error;
pub mod format;
pub mod tags;

pub use error::{ConfigError, Error, Result};
pub use format::{Interlace, Packing, VideoFormat};
pub use tags::{EncodeParams, TagMap};
