//! Cache keys addressing segmented HLS artifacts and source clips.

use crate::types::{Camera, ClipKind, SegmentStamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The transcoding configuration a segmented artifact was produced under.
///
/// Part of the cache key: changing the encoding configuration must never
/// silently serve chunks produced under a different one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingProfile {
    /// Stream-copy, no re-encode.
    Copy,
    /// Re-encode capped at the given bitrate (ffmpeg syntax, e.g. "2500k").
    Bitrate(String),
}

impl EncodingProfile {
    /// Stable directory label for this profile.
    pub fn label(&self) -> &str {
        match self {
            Self::Copy => "copy",
            Self::Bitrate(rate) => rate,
        }
    }

    /// Build a profile from the configured target bitrate; empty means copy.
    pub fn from_bitrate(bitrate: &str) -> Self {
        if bitrate.is_empty() {
            Self::Copy
        } else {
            Self::Bitrate(bitrate.to_string())
        }
    }
}

impl fmt::Display for EncodingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one source clip: a single camera's file within a segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipLocation {
    pub kind: ClipKind,
    /// Event folder name; for recent footage this is the date-named
    /// subfolder, with `-` standing for the layout root.
    pub event_id: String,
    pub segment: SegmentStamp,
    pub camera: Camera,
}

impl ClipLocation {
    /// The recorder's filename for this clip.
    pub fn file_name(&self) -> String {
        format!("{}-{}.mp4", self.segment, self.camera)
    }
}

impl fmt::Display for ClipLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.kind, self.event_id, self.segment, self.camera
        )
    }
}

/// The full tuple addressing one segmented HLS artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamCacheKey {
    pub profile: EncodingProfile,
    pub kind: ClipKind,
    pub event_id: String,
    pub segment: SegmentStamp,
    pub camera: Camera,
}

impl StreamCacheKey {
    pub fn new(profile: EncodingProfile, clip: &ClipLocation) -> Self {
        Self {
            profile,
            kind: clip.kind,
            event_id: clip.event_id.clone(),
            segment: clip.segment.clone(),
            camera: clip.camera,
        }
    }

    /// Directory holding this key's manifest and chunks:
    /// `<cache_root>/<profile>/<kind>/<event>/<segment>/<camera>`.
    pub fn cache_dir(&self, cache_root: &Path) -> PathBuf {
        cache_root
            .join(self.profile.label())
            .join(self.kind.to_string())
            .join(&self.event_id)
            .join(self.segment.as_str())
            .join(self.camera.as_str())
    }

    /// Path of this key's playlist file.
    pub fn manifest_path(&self, cache_root: &Path) -> PathBuf {
        self.cache_dir(cache_root).join("stream.m3u8")
    }
}

impl fmt::Display for StreamCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.profile, self.kind, self.event_id, self.segment, self.camera
        )
    }
}
