//! HLS playlist inspection.
//!
//! The segmenter writes event-style playlists that only gain the end marker
//! once ffmpeg finishes. These helpers let the server tell a finished stream
//! from one still being written, and salvage partial output when the encoder
//! dies after producing usable chunks.

/// Marker ffmpeg appends when a playlist is finalized.
pub const END_MARKER: &str = "#EXT-X-ENDLIST";

/// Whether the playlist text is finalized.
pub fn is_complete(manifest: &str) -> bool {
    manifest.lines().any(|line| line.trim() == END_MARKER)
}

/// Chunk file names referenced by the playlist, in order.
///
/// Playlist URI lines are the non-empty lines that do not start with `#`.
pub fn chunk_names(manifest: &str) -> Vec<&str> {
    manifest
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Append the end marker to a partial playlist, making it a finite stream
/// covering whatever chunks were produced. Returns `None` when the playlist
/// references no chunks at all, in which case there is nothing to salvage.
pub fn finalize(manifest: &str) -> Option<String> {
    if chunk_names(manifest).is_empty() {
        return None;
    }
    if is_complete(manifest) {
        return Some(manifest.to_string());
    }

    let mut out = manifest.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(END_MARKER);
    out.push('\n');
    Some(out)
}

/// Whether `name` is a segmenter-produced chunk file name, `chunk_NNN.ts`.
pub fn is_chunk_name(name: &str) -> bool {
    let Some(digits) = name
        .strip_prefix("chunk_")
        .and_then(|rest| rest.strip_suffix(".ts"))
    else {
        return false;
    };
    digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTIAL: &str = "#EXTM3U\n\
        #EXT-X-VERSION:3\n\
        #EXT-X-TARGETDURATION:4\n\
        #EXT-X-MEDIA-SEQUENCE:0\n\
        #EXT-X-PLAYLIST-TYPE:EVENT\n\
        #EXTINF:4.000000,\n\
        chunk_000.ts\n\
        #EXTINF:4.000000,\n\
        chunk_001.ts\n";

    #[test]
    fn test_complete_detection() {
        assert!(!is_complete(PARTIAL));
        assert!(is_complete(&format!("{PARTIAL}{END_MARKER}\n")));
        assert!(!is_complete(""));
    }

    #[test]
    fn test_chunk_names() {
        assert_eq!(chunk_names(PARTIAL), vec!["chunk_000.ts", "chunk_001.ts"]);
        assert!(chunk_names("#EXTM3U\n").is_empty());
    }

    #[test]
    fn test_finalize_appends_marker() {
        let fixed = finalize(PARTIAL).unwrap();
        assert!(is_complete(&fixed));
        assert_eq!(chunk_names(&fixed), chunk_names(PARTIAL));
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let fixed = finalize(PARTIAL).unwrap();
        assert_eq!(finalize(&fixed).unwrap(), fixed);
    }

    #[test]
    fn test_finalize_refuses_chunkless_playlist() {
        assert!(finalize("#EXTM3U\n#EXT-X-VERSION:3\n").is_none());
        assert!(finalize("").is_none());
    }

    #[test]
    fn test_chunk_name_validation() {
        assert!(is_chunk_name("chunk_000.ts"));
        assert!(is_chunk_name("chunk_999.ts"));
        assert!(!is_chunk_name("chunk_1000.ts"));
        assert!(!is_chunk_name("chunk_00.ts"));
        assert!(!is_chunk_name("chunk_abc.ts"));
        assert!(!is_chunk_name("stream.m3u8"));
        assert!(!is_chunk_name("../chunk_000.ts"));
    }
}
