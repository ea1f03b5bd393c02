//! Clip storage abstraction.
//!
//! Engines address clips by [`ClipLocation`] and never build filesystem paths
//! themselves. [`LocalStorage`] maps locations onto the recorder's directory
//! layout; a remote backend would implement [`ClipStorage`] over `stream_url`
//! instead, letting ffmpeg pull the source over HTTP.

pub mod scanner;

use dashvault_common::paths::validate_component;
use dashvault_common::{ClipKind, ClipLocation, Error, Result};
use std::path::{Path, PathBuf};

/// Event id that stands for the root of RecentClips, where the recorder
/// places unfoldered rolling footage.
pub const RECENT_ROOT_EVENT: &str = "-";

/// A remote clip source ffmpeg can read directly.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub url: String,
    /// Extra HTTP headers, typically authorization.
    pub headers: Vec<(String, String)>,
}

/// Where clip files live.
pub trait ClipStorage: Send + Sync {
    /// Local filesystem path for the clip. Errors when the location is
    /// invalid or the file does not exist.
    fn local_path(&self, clip: &ClipLocation) -> Result<PathBuf>;

    /// Remote URL for the clip, when the backend is not local. Backends
    /// return `Some` here to have the segmenter read over HTTP instead of
    /// from `local_path`.
    fn stream_url(&self, _clip: &ClipLocation) -> Option<RemoteSource> {
        None
    }
}

/// Storage over a recorder-style directory tree on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a clip's event maps to. Saved and sentry events are one
    /// folder per event; recent footage is either a date-named subfolder or
    /// the RecentClips root itself.
    fn event_dir(&self, kind: ClipKind, event_id: &str) -> Result<PathBuf> {
        let kind_dir = self.root.join(kind.folder_name());

        if kind == ClipKind::Recent && event_id == RECENT_ROOT_EVENT {
            return Ok(kind_dir);
        }
        Ok(kind_dir.join(validate_component(event_id)?))
    }
}

impl ClipStorage for LocalStorage {
    fn local_path(&self, clip: &ClipLocation) -> Result<PathBuf> {
        let path = self
            .event_dir(clip.kind, &clip.event_id)?
            .join(clip.file_name());

        if !path.is_file() {
            return Err(Error::not_found(format!("clip {clip}")));
        }
        Ok(path)
    }
}
