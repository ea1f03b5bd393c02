//! Core type definitions for dashcam clips.
//!
//! Enums are serialized in snake_case to match the on-disk file naming the
//! recorder uses (`2024-03-01_17-42-00-left_repeater.mp4`).

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A camera angle on the vehicle.
///
/// Declaration order is the canonical presentation order; `Ord` follows it,
/// so sorting a set of cameras yields the canonical sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Camera {
    Front,
    LeftRepeater,
    RightRepeater,
    Back,
    LeftPillar,
    RightPillar,
}

impl Camera {
    /// All cameras in canonical order.
    pub const ALL: [Camera; 6] = [
        Camera::Front,
        Camera::LeftRepeater,
        Camera::RightRepeater,
        Camera::Back,
        Camera::LeftPillar,
        Camera::RightPillar,
    ];

    /// The filename suffix the recorder uses for this camera.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::LeftRepeater => "left_repeater",
            Self::RightRepeater => "right_repeater",
            Self::Back => "back",
            Self::LeftPillar => "left_pillar",
            Self::RightPillar => "right_pillar",
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Camera {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "front" => Ok(Self::Front),
            "left_repeater" => Ok(Self::LeftRepeater),
            "right_repeater" => Ok(Self::RightRepeater),
            "back" => Ok(Self::Back),
            "left_pillar" => Ok(Self::LeftPillar),
            "right_pillar" => Ok(Self::RightPillar),
            other => Err(Error::invalid_input(format!("unknown camera: {other}"))),
        }
    }
}

/// Kind of recorded footage, mirroring the recorder's top-level folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    /// Rolling recent footage, possibly organized in date-named subfolders.
    Recent,
    /// Footage the driver explicitly saved.
    Saved,
    /// Footage captured by sentry events.
    Sentry,
}

impl ClipKind {
    /// The recorder's folder name for this kind.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Self::Recent => "RecentClips",
            Self::Saved => "SavedClips",
            Self::Sentry => "SentryClips",
        }
    }
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recent => write!(f, "recent"),
            Self::Saved => write!(f, "saved"),
            Self::Sentry => write!(f, "sentry"),
        }
    }
}

impl FromStr for ClipKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "recent" => Ok(Self::Recent),
            "saved" => Ok(Self::Saved),
            "sentry" => Ok(Self::Sentry),
            other => Err(Error::invalid_input(format!("unknown clip kind: {other}"))),
        }
    }
}

/// Format of the recorder's segment timestamps.
const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A validated segment timestamp in `YYYY-MM-DD_HH-MM-SS` form.
///
/// Encodes both ordering (lexicographic equals chronological in this format)
/// and the wall-clock start of a one-minute recording segment. Because every
/// accepted value matches the fixed format, a `SegmentStamp` is also safe to
/// use as a path component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentStamp(String);

impl SegmentStamp {
    /// The raw timestamp string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The wall-clock start time the stamp encodes.
    pub fn start_time(&self) -> NaiveDateTime {
        // Validated at construction, so this cannot fail.
        NaiveDateTime::parse_from_str(&self.0, STAMP_FORMAT)
            .unwrap_or_else(|_| NaiveDateTime::default())
    }
}

impl fmt::Display for SegmentStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SegmentStamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(s, STAMP_FORMAT)
            .map_err(|_| Error::invalid_input(format!("malformed segment timestamp: {s}")))?;
        Ok(Self(s.to_string()))
    }
}

/// One one-minute recording segment within an event, across all cameras that
/// captured it.
///
/// Constructed once during a directory scan and immutable afterward; the
/// engines consume it purely as a set of lookup keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventClip {
    /// Segment start timestamp.
    pub timestamp: SegmentStamp,
    /// Cameras present for this segment, in canonical order. Never empty:
    /// segments with no camera files are dropped by the scanner.
    pub cameras: Vec<Camera>,
    /// Measured clip duration in seconds, probed from the media itself.
    pub duration_secs: f64,
    /// Date-named subfolder for recent footage; `None` for saved/sentry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,
}
