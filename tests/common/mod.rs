//! Shared fixtures for integration tests: stub ffmpeg scripts and
//! synthesized clip files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// A stand-in ffmpeg binary with scripted behavior.
///
/// Every invocation appends one line to `log`, so tests can count how many
/// processes actually ran. The script locates its output directory the same
/// way real ffmpeg receives it: the final argument is the playlist path.
pub struct StubFfmpeg {
    pub path: PathBuf,
    pub log: PathBuf,
}

impl StubFfmpeg {
    pub fn spawn_count(&self) -> usize {
        std::fs::read_to_string(&self.log)
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}

/// Write an executable stub whose body runs after the output dir is known.
///
/// Inside `body`: `$last` is the playlist path, `$dir` its directory.
pub fn stub_ffmpeg(dir: &Path, body: &str) -> StubFfmpeg {
    let log = dir.join("spawns.log");
    let path = dir.join("ffmpeg-stub.sh");

    let script = format!(
        "#!/bin/sh\n\
         echo run >> \"{log}\"\n\
         for a in \"$@\"; do last=\"$a\"; done\n\
         dir=$(dirname \"$last\")\n\
         {body}\n",
        log = log.display(),
    );
    std::fs::write(&path, script).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    StubFfmpeg { path, log }
}

/// Stub that segments "successfully": two chunks and a finalized playlist.
pub fn stub_success(dir: &Path) -> StubFfmpeg {
    stub_ffmpeg(
        dir,
        ": > \"$dir/chunk_000.ts\"\n\
         : > \"$dir/chunk_001.ts\"\n\
         printf '#EXTM3U\\n#EXT-X-VERSION:3\\n#EXT-X-TARGETDURATION:4\\n#EXTINF:4.0,\\nchunk_000.ts\\n#EXTINF:4.0,\\nchunk_001.ts\\n#EXT-X-ENDLIST\\n' > \"$last\"\n\
         exit 0",
    )
}

/// Stub that dies after one chunk, leaving an unfinalized playlist.
pub fn stub_partial_failure(dir: &Path) -> StubFfmpeg {
    stub_ffmpeg(
        dir,
        ": > \"$dir/chunk_000.ts\"\n\
         printf '#EXTM3U\\n#EXT-X-VERSION:3\\n#EXTINF:4.0,\\nchunk_000.ts\\n' > \"$last\"\n\
         exit 1",
    )
}

/// Stub that fails without producing any output.
pub fn stub_total_failure(dir: &Path) -> StubFfmpeg {
    stub_ffmpeg(dir, "exit 1")
}

/// Stub that takes a while: playlist appears mid-run, process exits later.
pub fn stub_slow_success(dir: &Path) -> StubFfmpeg {
    stub_ffmpeg(
        dir,
        "sleep 0.3\n\
         : > \"$dir/chunk_000.ts\"\n\
         printf '#EXTM3U\\n#EXT-X-VERSION:3\\n#EXTINF:4.0,\\nchunk_000.ts\\n' > \"$last\"\n\
         sleep 0.3\n\
         printf '#EXT-X-ENDLIST\\n' >> \"$last\"\n\
         exit 0",
    )
}

/// Stub that writes one chunk then hangs until killed.
pub fn stub_hang_after_chunk(dir: &Path) -> StubFfmpeg {
    stub_ffmpeg(
        dir,
        ": > \"$dir/chunk_000.ts\"\n\
         printf '#EXTM3U\\n#EXT-X-VERSION:3\\n#EXTINF:4.0,\\nchunk_000.ts\\n' > \"$last\"\n\
         sleep 60",
    )
}

/// Stub that hangs without producing anything.
pub fn stub_hang(dir: &Path) -> StubFfmpeg {
    stub_ffmpeg(dir, "sleep 60")
}

/// Poll until the playlist at `path` carries the end marker, then return it.
///
/// Readiness can be signalled while the job is still finishing (or being
/// salvaged) in the background, so tests that assert on the final playlist
/// state wait for it here.
pub async fn wait_for_complete_manifest(path: &Path) -> String {
    for _ in 0..100 {
        if let Ok(content) = std::fs::read_to_string(path) {
            if content.lines().any(|l| l.trim() == "#EXT-X-ENDLIST") {
                return content;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("playlist at {path:?} never finalized");
}

fn mp4_box(name: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + content.len());
    out.extend_from_slice(&((content.len() as u32 + 8).to_be_bytes()));
    out.extend_from_slice(name);
    out.extend_from_slice(content);
    out
}

fn varint_field(out: &mut Vec<u8>, field: u32, mut value: u64) {
    out.push((field << 3) as u8);
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

/// Bytes of a minimal clip carrying `frame_count` telemetry SEI frames,
/// sequence numbers starting at `first_seq`.
pub fn clip_with_telemetry(first_seq: u64, frame_count: u64) -> Vec<u8> {
    let mut mdat = Vec::new();
    for seq in first_seq..first_seq + frame_count {
        let mut payload = Vec::new();
        varint_field(&mut payload, 1, seq);

        let mut nal = vec![0x06, 0x05, (4 + payload.len()) as u8];
        nal.extend_from_slice(&[0x42, 0x42, 0x42, 0x69]);
        nal.extend_from_slice(&payload);

        mdat.extend_from_slice(&(nal.len() as u32).to_be_bytes());
        mdat.extend_from_slice(&nal);
    }

    let mut mvhd = vec![0u8; 12];
    mvhd.extend_from_slice(&1000u32.to_be_bytes());
    mvhd.extend_from_slice(&60_000u32.to_be_bytes());

    let mut buf = mp4_box(b"ftyp", b"isom");
    buf.extend_from_slice(&mp4_box(b"moov", &mp4_box(b"mvhd", &mvhd)));
    buf.extend_from_slice(&mp4_box(b"mdat", &mdat));
    buf
}

/// Bytes of a minimal clip with no SEI telemetry at all.
pub fn clip_without_telemetry() -> Vec<u8> {
    let mut mvhd = vec![0u8; 12];
    mvhd.extend_from_slice(&1000u32.to_be_bytes());
    mvhd.extend_from_slice(&60_000u32.to_be_bytes());

    let mut mdat = Vec::new();
    let nal = [0x65u8, 0x01, 0x02, 0x03];
    mdat.extend_from_slice(&(nal.len() as u32).to_be_bytes());
    mdat.extend_from_slice(&nal);

    let mut buf = mp4_box(b"ftyp", b"isom");
    buf.extend_from_slice(&mp4_box(b"moov", &mp4_box(b"mvhd", &mvhd)));
    buf.extend_from_slice(&mp4_box(b"mdat", &mdat));
    buf
}

/// Lay a clip file into a recorder-style tree and return the storage root.
pub fn write_saved_clip(root: &Path, event: &str, stamp: &str, camera: &str, bytes: &[u8]) {
    let dir = root.join("SavedClips").join(event);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{stamp}-{camera}.mp4")), bytes).unwrap();
}
