//! Track timing extraction: frame durations from `stts`, movie duration from
//! `mvhd`, and the `mdat` bounds the SEI scanner works within.

use super::boxes::{find_box, BoxSpan};

/// Upper bound on expanded sample counts. A one-minute dashcam clip holds a
/// few thousand frames; a run-length table claiming more than this is corrupt.
const MAX_SAMPLE_COUNT: u64 = 1_000_000;

fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    let b = buf.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u64(buf: &[u8], at: usize) -> Option<u64> {
    let b = buf.get(at..at + 8)?;
    Some(u64::from_be_bytes([
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
    ]))
}

/// Find the top-level `mdat` box.
pub fn media_data_bounds(buf: &[u8]) -> Option<BoxSpan> {
    find_box(buf, 0, buf.len(), b"mdat")
}

/// Per-video-frame display durations in milliseconds, in sample order.
///
/// Descends `moov -> trak* -> mdia`, selects the first track whose `hdlr`
/// handler type is `vide`, reads the `mdhd` timescale (version 0 or 1) and
/// expands the `minf -> stbl -> stts` run-length table into one entry per
/// frame (`delta / timescale * 1000`).
///
/// Returns `None` when any required box is missing, the timescale is zero,
/// or the table is empty — callers fall back to an assumed frame rate.
pub fn video_frame_durations_ms(buf: &[u8]) -> Option<Vec<f64>> {
    let moov = find_box(buf, 0, buf.len(), b"moov")?;

    let mut cursor = moov.content_start;
    while let Some(trak) = find_box(buf, cursor, moov.content_end, b"trak") {
        cursor = trak.content_end;

        let Some(mdia) = find_box(buf, trak.content_start, trak.content_end, b"mdia") else {
            continue;
        };
        if !is_video_handler(buf, &mdia) {
            continue;
        }

        // First video track wins; dashcam files carry exactly one.
        let timescale = mdhd_timescale(buf, &mdia)?;
        if timescale == 0 {
            return None;
        }

        let minf = find_box(buf, mdia.content_start, mdia.content_end, b"minf")?;
        let stbl = find_box(buf, minf.content_start, minf.content_end, b"stbl")?;
        let stts = find_box(buf, stbl.content_start, stbl.content_end, b"stts")?;
        return expand_stts(&buf[stts.content_start..stts.content_end], timescale);
    }

    None
}

/// Movie duration in seconds from the top-level `moov -> mvhd` header.
pub fn movie_duration_secs(buf: &[u8]) -> Option<f64> {
    let moov = find_box(buf, 0, buf.len(), b"moov")?;
    mvhd_duration_secs(&buf[moov.content_start..moov.content_end])
}

/// Movie duration in seconds given only the content of a `moov` box.
///
/// Split out so callers that read `moov` with seeks (skipping `mdat`) can
/// probe durations without loading whole files.
pub fn mvhd_duration_secs(moov_content: &[u8]) -> Option<f64> {
    let mvhd = find_box(moov_content, 0, moov_content.len(), b"mvhd")?;
    let data = &moov_content[mvhd.content_start..mvhd.content_end];

    let version = *data.first()?;
    let (timescale, duration) = if version == 0 {
        (read_u32(data, 12)? as u64, read_u32(data, 16)? as u64)
    } else {
        (read_u32(data, 20)? as u64, read_u64(data, 24)?)
    };

    if timescale == 0 {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}

fn is_video_handler(buf: &[u8], mdia: &BoxSpan) -> bool {
    let Some(hdlr) = find_box(buf, mdia.content_start, mdia.content_end, b"hdlr") else {
        return false;
    };
    // FullBox header (4) + pre_defined (4), then the handler type code.
    buf.get(hdlr.content_start + 8..hdlr.content_start + 12) == Some(b"vide")
}

fn mdhd_timescale(buf: &[u8], mdia: &BoxSpan) -> Option<u32> {
    let mdhd = find_box(buf, mdia.content_start, mdia.content_end, b"mdhd")?;
    let data = &buf[mdhd.content_start..mdhd.content_end];

    let version = *data.first()?;
    if version == 0 {
        // version/flags (4), creation/modification (4+4), then timescale.
        read_u32(data, 12)
    } else {
        // 64-bit creation/modification times push the timescale out.
        read_u32(data, 20)
    }
}

fn expand_stts(data: &[u8], timescale: u32) -> Option<Vec<f64>> {
    let entry_count = read_u32(data, 4)? as usize;
    if entry_count == 0 {
        return None;
    }

    let mut total: u64 = 0;
    let mut durations = Vec::new();

    for i in 0..entry_count {
        let offset = 8 + i * 8;
        // Truncated table: keep what was expanded so far.
        let Some(count) = read_u32(data, offset) else {
            break;
        };
        let Some(delta) = read_u32(data, offset + 4) else {
            break;
        };

        total += count as u64;
        if total > MAX_SAMPLE_COUNT {
            return None;
        }

        let ms = delta as f64 / timescale as f64 * 1000.0;
        durations.extend(std::iter::repeat(ms).take(count as usize));
    }

    if durations.is_empty() {
        None
    } else {
        Some(durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn mp4_box(name: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + content.len());
        out.extend_from_slice(&((content.len() as u32 + 8).to_be_bytes()));
        out.extend_from_slice(name);
        out.extend_from_slice(content);
        out
    }

    pub(crate) fn stts_box(entries: &[(u32, u32)]) -> Vec<u8> {
        let mut content = vec![0u8; 4];
        content.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for (count, delta) in entries {
            content.extend_from_slice(&count.to_be_bytes());
            content.extend_from_slice(&delta.to_be_bytes());
        }
        mp4_box(b"stts", &content)
    }

    pub(crate) fn mdhd_box(timescale: u32, duration: u32) -> Vec<u8> {
        let mut content = vec![0u8; 12]; // version 0, flags, creation, modification
        content.extend_from_slice(&timescale.to_be_bytes());
        content.extend_from_slice(&duration.to_be_bytes());
        content.extend_from_slice(&[0; 4]); // language/pre_defined
        mp4_box(b"mdhd", &content)
    }

    pub(crate) fn hdlr_box(handler: &[u8; 4]) -> Vec<u8> {
        let mut content = vec![0u8; 8]; // version/flags + pre_defined
        content.extend_from_slice(handler);
        content.extend_from_slice(&[0; 12]);
        mp4_box(b"hdlr", &content)
    }

    pub(crate) fn video_moov(timescale: u32, stts_entries: &[(u32, u32)]) -> Vec<u8> {
        let stbl = mp4_box(b"stbl", &stts_box(stts_entries));
        let minf = mp4_box(b"minf", &stbl);
        let mut mdia_content = mdhd_box(timescale, 0);
        mdia_content.extend_from_slice(&hdlr_box(b"vide"));
        mdia_content.extend_from_slice(&minf);
        let trak = mp4_box(b"trak", &mp4_box(b"mdia", &mdia_content));
        mp4_box(b"moov", &trak)
    }

    #[test]
    fn test_durations_stts_expansion() {
        // 100 samples of 3000 ticks @ 90kHz: one ~33.33ms entry per frame.
        let buf = video_moov(90_000, &[(100, 3000)]);
        let durations = video_frame_durations_ms(&buf).unwrap();

        assert_eq!(durations.len(), 100);
        for d in &durations {
            assert!((d - 33.333_333).abs() < 0.001);
        }
        // Sum matches the implied track duration within rounding error.
        let sum: f64 = durations.iter().sum();
        assert!((sum - 100.0 * 3000.0 / 90_000.0 * 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_durations_multiple_runs() {
        let buf = video_moov(1000, &[(2, 40), (3, 20)]);
        let durations = video_frame_durations_ms(&buf).unwrap();
        assert_eq!(durations, vec![40.0, 40.0, 20.0, 20.0, 20.0]);
    }

    #[test]
    fn test_durations_skips_non_video_track() {
        // Audio track first, then the video track; the audio one is skipped.
        let audio_mdia = {
            let mut c = mdhd_box(48_000, 0);
            c.extend_from_slice(&hdlr_box(b"soun"));
            c
        };
        let audio_trak = mp4_box(b"trak", &mp4_box(b"mdia", &audio_mdia));

        let video = video_moov(1000, &[(1, 500)]);
        // Splice: rebuild moov holding audio trak + the video trak.
        let video_trak = &video[8..];
        let mut moov_content = audio_trak;
        moov_content.extend_from_slice(video_trak);
        let buf = mp4_box(b"moov", &moov_content);

        assert_eq!(video_frame_durations_ms(&buf).unwrap(), vec![500.0]);
    }

    #[test]
    fn test_durations_missing_boxes() {
        assert!(video_frame_durations_ms(&[]).is_none());
        assert!(video_frame_durations_ms(&mp4_box(b"moov", &[])).is_none());

        // Video track but no stts.
        let mut mdia_content = mdhd_box(1000, 0);
        mdia_content.extend_from_slice(&hdlr_box(b"vide"));
        let buf = mp4_box(b"moov", &mp4_box(b"trak", &mp4_box(b"mdia", &mdia_content)));
        assert!(video_frame_durations_ms(&buf).is_none());
    }

    #[test]
    fn test_durations_zero_timescale() {
        let buf = video_moov(0, &[(10, 100)]);
        assert!(video_frame_durations_ms(&buf).is_none());
    }

    #[test]
    fn test_durations_empty_stts() {
        let buf = video_moov(1000, &[]);
        assert!(video_frame_durations_ms(&buf).is_none());
    }

    #[test]
    fn test_durations_bogus_sample_count() {
        let buf = video_moov(1000, &[(u32::MAX, 10)]);
        assert!(video_frame_durations_ms(&buf).is_none());
    }

    #[test]
    fn test_media_data_bounds() {
        let mut buf = mp4_box(b"ftyp", b"isom");
        buf.extend_from_slice(&mp4_box(b"mdat", &[9; 32]));
        let span = media_data_bounds(&buf).unwrap();
        assert_eq!(span.len(), 32);

        assert!(media_data_bounds(&mp4_box(b"ftyp", b"isom")).is_none());
        assert!(media_data_bounds(&[]).is_none());
    }

    #[test]
    fn test_movie_duration() {
        let mut mvhd_content = vec![0u8; 12];
        mvhd_content.extend_from_slice(&1000u32.to_be_bytes()); // timescale
        mvhd_content.extend_from_slice(&59_700u32.to_be_bytes()); // duration
        let buf = mp4_box(b"moov", &mp4_box(b"mvhd", &mvhd_content));

        let secs = movie_duration_secs(&buf).unwrap();
        assert!((secs - 59.7).abs() < 1e-9);
    }

    #[test]
    fn test_movie_duration_version1() {
        let mut mvhd_content = vec![1u8, 0, 0, 0];
        mvhd_content.extend_from_slice(&[0u8; 16]); // 64-bit creation/modification
        mvhd_content.extend_from_slice(&90_000u32.to_be_bytes()); // timescale
        mvhd_content.extend_from_slice(&5_400_000u64.to_be_bytes()); // duration
        let buf = mp4_box(b"moov", &mp4_box(b"mvhd", &mvhd_content));

        let secs = movie_duration_secs(&buf).unwrap();
        assert!((secs - 60.0).abs() < 1e-9);
    }
}
