//! Dashvault-Media: MP4 box parsing, SEI telemetry decoding, and HLS
//! manifest inspection.
//!
//! Everything in this crate operates on byte slices or playlist text; file
//! and process I/O live in the server crate. Dashcam firmware writes simple
//! single-video-track MP4s, but truncated and corrupt files are a normal
//! occurrence, so every parser here is bounds-checked and treats malformed
//! structure as "not found" rather than an error.
//!
//! # Modules
//!
//! - `mp4` - random-access box walker, frame-duration table, mdat bounds
//! - `h264` - length-prefixed NAL iteration and SEI payload extraction
//! - `telemetry` - vendor telemetry frames, protobuf decode, frame timing
//! - `hls` - playlist completeness inspection and failure salvage
//!
//! # Extraction pipeline
//!
//! 1. `mp4::media_data_bounds` locates the elemental stream
//! 2. `telemetry::scan_frames` walks NAL units and decodes vendor SEI
//! 3. `mp4::video_frame_durations_ms` expands the `stts` table
//! 4. `telemetry::map_frame_times` assigns each frame a millisecond offset

pub mod error;
pub mod h264;
pub mod hls;
pub mod mp4;
pub mod telemetry;

pub use error::{Error, Result};
pub use mp4::BoxSpan;
pub use telemetry::{extract_telemetry, TelemetryData, TelemetryFrame};
