//! Dashvault: dashcam archive server.
//!
//! Serves a recorder-style clip archive over HTTP: on-demand HLS
//! segmentation of the raw MP4 clips and extraction of the telemetry the
//! recorder embeds in the video stream. Byte-level parsing lives in
//! `dashvault-media`; this crate owns configuration, storage, process
//! orchestration, and the HTTP surface.

pub mod config;
pub mod segmenter;
pub mod server;
pub mod storage;
pub mod telemetry;
pub mod tools;
