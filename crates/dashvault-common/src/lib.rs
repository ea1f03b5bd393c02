//! Dashvault-Common: shared types, cache keys, and errors.
//!
//! This crate provides the small data model the dashvault engines agree on:
//!
//! - **Camera identifiers**: the fixed set of dashcam angles in canonical order
//! - **Clip model**: clip kinds, validated segment timestamps, event clips
//! - **Cache keys**: the tuple addressing one segmented HLS artifact on disk
//! - **Path helpers**: component validation so request input can never traverse
//! - **Error handling**: a unified error type and result alias
//!
//! # Examples
//!
//! ```
//! use dashvault_common::{Camera, ClipKind, SegmentStamp, Error, Result};
//!
//! let stamp: SegmentStamp = "2024-03-01_17-42-00".parse().unwrap();
//! assert_eq!(stamp.as_str(), "2024-03-01_17-42-00");
//!
//! fn example() -> Result<Camera> {
//!     "front".parse().map_err(|_| Error::invalid_input("unknown camera"))
//! }
//! assert_eq!(example().unwrap(), Camera::Front);
//! ```

pub mod error;
pub mod keys;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use keys::{ClipLocation, EncodingProfile, StreamCacheKey};
pub use types::{Camera, ClipKind, EventClip, SegmentStamp};
