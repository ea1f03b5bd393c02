//! Directory scanner for the recorder's clip layout.
//!
//! Walks one kind folder (RecentClips/SavedClips/SentryClips), groups the
//! per-minute camera files into [`EventClip`]s, and probes each segment's
//! real duration from the media. Runs synchronously; callers move it off the
//! request path with `spawn_blocking`.

use dashvault_common::{Camera, ClipKind, EventClip, SegmentStamp};
use dashvault_media::mp4;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use walkdir::WalkDir;

use super::{LocalStorage, RECENT_ROOT_EVENT};

/// Largest moov box the duration probe will load.
const MAX_MOOV_SIZE: u64 = 64 * 1024 * 1024;

/// One event and its per-minute segments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_id: String,
    /// Segments in chronological order.
    pub clips: Vec<EventClip>,
}

/// Enumerate all events of one kind under the storage root.
///
/// Events come back newest first; segments without a single parseable camera
/// file are dropped. A missing kind folder is an empty listing, not an
/// error, since a card that never recorded sentry events simply has no
/// SentryClips directory.
pub fn scan_events(storage: &LocalStorage, kind: ClipKind) -> Vec<EventSummary> {
    let kind_dir = storage.root().join(kind.folder_name());
    if !kind_dir.is_dir() {
        return Vec::new();
    }

    // (event_id, stamp) -> (cameras, one file path for the duration probe)
    let mut segments: BTreeMap<(String, SegmentStamp), (Vec<Camera>, std::path::PathBuf)> =
        BTreeMap::new();

    for entry in WalkDir::new(&kind_dir)
        .min_depth(1)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let Some((stamp, camera)) = parse_clip_name(name) else {
            continue;
        };

        let event_id = match (kind, entry.depth()) {
            // Rolling footage directly in RecentClips.
            (ClipKind::Recent, 1) => RECENT_ROOT_EVENT.to_string(),
            (_, 2) => match entry.path().parent().and_then(|p| p.file_name()) {
                Some(dir) => dir.to_string_lossy().into_owned(),
                None => continue,
            },
            // Saved/sentry files outside an event folder are stray.
            _ => continue,
        };

        let slot = segments
            .entry((event_id, stamp))
            .or_insert_with(|| (Vec::new(), entry.path().to_path_buf()));
        slot.0.push(camera);
    }

    let mut events: BTreeMap<String, Vec<EventClip>> = BTreeMap::new();
    for ((event_id, timestamp), (mut cameras, probe_path)) in segments {
        cameras.sort();
        cameras.dedup();

        let duration_secs = probe_duration_secs(&probe_path).unwrap_or(0.0);
        let subfolder = if kind == ClipKind::Recent && event_id != RECENT_ROOT_EVENT {
            Some(event_id.clone())
        } else {
            None
        };

        events.entry(event_id).or_default().push(EventClip {
            timestamp,
            cameras,
            duration_secs,
            subfolder,
        });
    }

    // BTreeMap iteration gives ascending event ids; newest first for the API.
    let mut summaries: Vec<EventSummary> = events
        .into_iter()
        .map(|(event_id, clips)| EventSummary { event_id, clips })
        .collect();
    summaries.reverse();
    summaries
}

/// Parse a recorder clip name, `<YYYY-MM-DD_HH-MM-SS>-<camera>.mp4`.
fn parse_clip_name(name: &str) -> Option<(SegmentStamp, Camera)> {
    let base = name.strip_suffix(".mp4")?;
    // The timestamp is fixed-width; everything after it names the camera.
    if base.len() < 20 {
        return None;
    }
    let (stamp_str, rest) = base.split_at(19);
    let camera_str = rest.strip_prefix('-')?;

    let stamp = stamp_str.parse().ok()?;
    let camera = camera_str.parse().ok()?;
    Some((stamp, camera))
}

/// Probe a clip's duration by reading only its moov box.
///
/// Walks top-level boxes with seeks so the (much larger) mdat is never read.
/// Any structural problem yields `None`; the scan continues with a zero
/// duration rather than failing the listing.
fn probe_duration_secs(path: &Path) -> Option<f64> {
    let mut file = File::open(path).ok()?;
    let file_len = file.metadata().ok()?.len();
    let mut offset = 0u64;

    while offset + 8 <= file_len {
        file.seek(SeekFrom::Start(offset)).ok()?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header).ok()?;

        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let name = &header[4..8];

        let (content_offset, total_size) = match size32 {
            0 => (offset + 8, file_len - offset),
            1 => {
                let mut ext = [0u8; 8];
                file.read_exact(&mut ext).ok()?;
                (offset + 16, u64::from_be_bytes(ext))
            }
            n => (offset + 8, n as u64),
        };

        let header_len = content_offset - offset;
        // A 64-bit extended size can be arbitrary garbage; the end offset
        // must not wrap.
        let box_end = offset.checked_add(total_size)?;
        if total_size < header_len || box_end > file_len {
            return None;
        }

        if name == b"moov" {
            let content_len = total_size - header_len;
            if content_len > MAX_MOOV_SIZE {
                return None;
            }
            let mut content = vec![0u8; content_len as usize];
            file.seek(SeekFrom::Start(content_offset)).ok()?;
            file.read_exact(&mut content).ok()?;
            return mp4::mvhd_duration_secs(&content);
        }

        offset = box_end;
    }

    None
}
