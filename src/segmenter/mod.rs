//! On-demand HLS segmentation engine.
//!
//! Clips are segmented lazily, the first time a player asks for them. The
//! engine guarantees that for any cache key at most one ffmpeg process runs
//! at a time, that concurrent callers share that process's outcome, and that
//! a crash mid-write never leaves a cache entry that poisons later requests.
//!
//! A job is considered ready as soon as its playlist file appears; ffmpeg
//! keeps appending chunks in the background while players already consume
//! the incremental playlist. The concurrency permit is held until the
//! process actually exits, not until readiness.

use dashvault_common::{EncodingProfile, StreamCacheKey};
use dashvault_media::hls;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::{oneshot, Semaphore};

use crate::storage::RemoteSource;

/// How often a running job checks for the playlist file.
const MANIFEST_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default concurrent jobs for software encoding.
const DEFAULT_JOBS_SOFTWARE: usize = 2;
/// Default concurrent jobs when a hardware encoder is in use.
const DEFAULT_JOBS_HARDWARE: usize = 6;

/// Where ffmpeg reads the clip from.
#[derive(Debug, Clone)]
pub enum SegmentSource {
    Local(PathBuf),
    Remote(RemoteSource),
}

/// Result of a segmentation request.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// The playlist exists; chunks are being or have been written.
    Ready,
    /// The source clip does not exist.
    SourceMissing,
    /// Segmentation produced nothing usable.
    Failed(Arc<str>),
}

impl SegmentOutcome {
    fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(Arc::from(msg.into()))
    }
}

/// Engine construction parameters, derived from config at startup.
#[derive(Debug, Clone)]
pub struct SegmenterSettings {
    pub cache_root: PathBuf,
    pub ffmpeg: PathBuf,
    pub segment_duration_secs: u32,
    /// Hardware H.264 encoder to use for re-encode profiles; `None` means
    /// libx264.
    pub hardware_encoder: Option<String>,
    pub max_concurrent_jobs: Option<usize>,
    pub copy_timeout: Duration,
    pub encode_timeout: Duration,
}

struct InFlight {
    ready: Shared<BoxFuture<'static, SegmentOutcome>>,
}

pub struct SegmentEngine {
    settings: SegmenterSettings,
    semaphore: Arc<Semaphore>,
    jobs: Mutex<HashMap<StreamCacheKey, InFlight>>,
}

impl SegmentEngine {
    pub fn new(settings: SegmenterSettings) -> Arc<Self> {
        let permits = settings.max_concurrent_jobs.unwrap_or({
            if settings.hardware_encoder.is_some() {
                DEFAULT_JOBS_HARDWARE
            } else {
                DEFAULT_JOBS_SOFTWARE
            }
        });
        tracing::info!(permits, "Segmentation engine ready");

        Arc::new(Self {
            settings,
            semaphore: Arc::new(Semaphore::new(permits)),
            jobs: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache_root(&self) -> &Path {
        &self.settings.cache_root
    }

    /// Make the HLS artifacts for `key` available, segmenting on demand.
    ///
    /// Finished artifacts return immediately. If a job for the same key is
    /// already running, the caller joins it instead of spawning a second
    /// process; otherwise a new job starts. Resolves as soon as the playlist
    /// appears, which can be well before the job finishes writing chunks.
    pub async fn ensure_segments_ready(
        self: &Arc<Self>,
        source: SegmentSource,
        key: StreamCacheKey,
    ) -> SegmentOutcome {
        let manifest = key.manifest_path(&self.settings.cache_root);
        if let Ok(content) = tokio::fs::read_to_string(&manifest).await {
            if hls::is_complete(&content) {
                tracing::debug!(key = %key, "Segment cache hit");
                return SegmentOutcome::Ready;
            }
        }

        let ready = {
            let mut jobs = self.jobs.lock();
            if let Some(job) = jobs.get(&key) {
                tracing::debug!(key = %key, "Joining in-flight segmentation");
                job.ready.clone()
            } else {
                let (tx, rx) = oneshot::channel();
                let ready = rx
                    .map(|res: Result<SegmentOutcome, _>| {
                        res.unwrap_or_else(|_| {
                            SegmentOutcome::failed("segmentation task dropped")
                        })
                    })
                    .boxed()
                    .shared();
                jobs.insert(
                    key.clone(),
                    InFlight {
                        ready: ready.clone(),
                    },
                );
                tokio::spawn(run_job(self.clone(), source, key, tx));
                ready
            }
        };

        ready.await
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.jobs.lock().len()
    }
}

/// Drives one segmentation job start to finish, then retires its map entry.
///
/// The map entry must outlive the ffmpeg process: as long as the process
/// may still write into the cache directory, late callers have to join this
/// job rather than judge the incomplete manifest on disk.
async fn run_job(
    engine: Arc<SegmentEngine>,
    source: SegmentSource,
    key: StreamCacheKey,
    ready_tx: oneshot::Sender<SegmentOutcome>,
) {
    let mut notifier = Some(ready_tx);
    let outcome = execute_job(&engine, source, &key, &mut notifier).await;

    match &outcome {
        SegmentOutcome::Ready => tracing::debug!(key = %key, "Segmentation finished"),
        SegmentOutcome::SourceMissing => {
            tracing::debug!(key = %key, "Source clip missing")
        }
        SegmentOutcome::Failed(msg) => {
            tracing::warn!(key = %key, error = %msg, "Segmentation failed")
        }
    }

    if let Some(tx) = notifier.take() {
        let _ = tx.send(outcome);
    }
    engine.jobs.lock().remove(&key);
}

async fn execute_job(
    engine: &SegmentEngine,
    source: SegmentSource,
    key: &StreamCacheKey,
    notifier: &mut Option<oneshot::Sender<SegmentOutcome>>,
) -> SegmentOutcome {
    let settings = &engine.settings;
    let dir = key.cache_dir(&settings.cache_root);
    let manifest = key.manifest_path(&settings.cache_root);

    // A pre-existing directory without a complete manifest is a leftover
    // from a crashed run: no job owned it when this one started. Move it
    // aside and delete it in the background so the fresh run starts clean.
    if tokio::fs::metadata(&dir).await.is_ok() {
        match tokio::fs::read_to_string(&manifest).await {
            Ok(content) if hls::is_complete(&content) => return SegmentOutcome::Ready,
            _ => {
                tracing::info!(key = %key, "Clearing stale segment cache");
                discard_directory(&dir).await;
            }
        }
    }

    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        return SegmentOutcome::failed(format!("failed to create cache dir: {e}"));
    }

    let input = match &source {
        SegmentSource::Local(path) => {
            // A zero-byte clip is a write the recorder never completed;
            // feeding it to ffmpeg would only fail later.
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_file() && meta.len() > 0 => {}
                _ => {
                    let _ = tokio::fs::remove_dir_all(&dir).await;
                    return SegmentOutcome::SourceMissing;
                }
            }
            path.to_string_lossy().into_owned()
        }
        SegmentSource::Remote(remote) => remote.url.clone(),
    };

    // Slot acquisition is FIFO; the permit is held until the process exits.
    let _permit = match engine.semaphore.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return SegmentOutcome::failed("segmentation engine shut down"),
    };

    let args = build_ffmpeg_args(&source, &key.profile, &dir, settings);
    tracing::debug!(key = %key, ffmpeg = ?settings.ffmpeg, ?args, "Spawning ffmpeg");

    let mut child = match Command::new(&settings.ffmpeg)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            let _ = tokio::fs::remove_dir_all(&dir).await;
            return SegmentOutcome::failed(format!("failed to spawn ffmpeg: {e}"));
        }
    };

    // Drain stderr concurrently so the child can never block on the pipe.
    let stderr_task = child.stderr.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let needs_encode = !matches!(key.profile, EncodingProfile::Copy);
    let is_remote = matches!(source, SegmentSource::Remote(_));
    let timeout = if needs_encode || is_remote {
        settings.encode_timeout
    } else {
        settings.copy_timeout
    };

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let mut poll = tokio::time::interval(MANIFEST_POLL_INTERVAL);

    let exit = loop {
        tokio::select! {
            status = child.wait() => break JobEnd::Exited(status),
            _ = poll.tick() => {
                if notifier.is_some() && tokio::fs::metadata(&manifest).await.is_ok() {
                    if let Some(tx) = notifier.take() {
                        tracing::debug!(key = %key, "Playlist appeared, stream ready");
                        let _ = tx.send(SegmentOutcome::Ready);
                    }
                }
            }
            _ = &mut deadline => {
                tracing::warn!(key = %key, ?timeout, "Segmentation timed out, killing ffmpeg");
                let _ = child.kill().await;
                break JobEnd::TimedOut;
            }
        }
    };

    // A killed ffmpeg can leave a descendant holding the pipe's write end
    // open; the drain must not outlive the deadline.
    let stderr = match (stderr_task, &exit) {
        (Some(task), JobEnd::TimedOut) => {
            task.abort();
            String::new()
        }
        (Some(task), _) => task.await.unwrap_or_default(),
        (None, _) => String::new(),
    };

    match exit {
        JobEnd::Exited(Ok(status)) if status.success() => {
            finish_successful(&dir, &manifest).await
        }
        JobEnd::Exited(Ok(status)) => {
            let reason = format!("ffmpeg exited with {status}: {}", stderr.trim());
            salvage_or_fail(&dir, &manifest, reason).await
        }
        JobEnd::Exited(Err(e)) => {
            salvage_or_fail(&dir, &manifest, format!("failed to wait for ffmpeg: {e}")).await
        }
        JobEnd::TimedOut => {
            salvage_or_fail(&dir, &manifest, format!("timed out after {timeout:?}")).await
        }
    }
}

enum JobEnd {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
}

/// Clean exit. ffmpeg finalizes event playlists itself; the marker is only
/// appended here if it somehow did not.
async fn finish_successful(dir: &Path, manifest: &Path) -> SegmentOutcome {
    match tokio::fs::read_to_string(manifest).await {
        Ok(content) if hls::is_complete(&content) => SegmentOutcome::Ready,
        Ok(content) => match hls::finalize(&content) {
            Some(fixed) => match tokio::fs::write(manifest, fixed).await {
                Ok(()) => SegmentOutcome::Ready,
                Err(e) => {
                    SegmentOutcome::failed(format!("failed to finalize playlist: {e}"))
                }
            },
            None => {
                let _ = tokio::fs::remove_dir_all(dir).await;
                SegmentOutcome::failed("ffmpeg succeeded but produced no chunks")
            }
        },
        Err(e) => {
            let _ = tokio::fs::remove_dir_all(dir).await;
            SegmentOutcome::failed(format!("ffmpeg succeeded but playlist unreadable: {e}"))
        }
    }
}

/// Failed or killed job. A partial playlist with at least one chunk is
/// finalized and served as a shortened stream; anything less is removed so
/// the next request starts from scratch.
async fn salvage_or_fail(dir: &Path, manifest: &Path, reason: String) -> SegmentOutcome {
    if let Ok(content) = tokio::fs::read_to_string(manifest).await {
        if let Some(fixed) = hls::finalize(&content) {
            if tokio::fs::write(manifest, fixed).await.is_ok() {
                tracing::info!(
                    ?manifest,
                    "Salvaged partial segmentation ({} chunks)",
                    hls::chunk_names(&content).len()
                );
                return SegmentOutcome::Ready;
            }
        }
    }

    let _ = tokio::fs::remove_dir_all(dir).await;
    SegmentOutcome::failed(reason)
}

/// Rename a directory out of the way, then delete it off the hot path.
/// Rename is atomic, so no later request can observe a half-deleted cache
/// entry under the original name.
async fn discard_directory(dir: &Path) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cache".to_string());
    let graveyard = dir.with_file_name(format!("{name}.stale-{nanos}"));

    match tokio::fs::rename(dir, &graveyard).await {
        Ok(()) => {
            tokio::spawn(async move {
                if let Err(e) = tokio::fs::remove_dir_all(&graveyard).await {
                    tracing::warn!(?graveyard, "Failed to remove stale cache: {}", e);
                }
            });
        }
        Err(_) => {
            // Rename can fail across filesystems; fall back to inline removal.
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
    }
}

/// ffmpeg argument list for one job.
fn build_ffmpeg_args(
    source: &SegmentSource,
    profile: &EncodingProfile,
    dir: &Path,
    settings: &SegmenterSettings,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
    ];

    let input = match source {
        SegmentSource::Local(path) => path.to_string_lossy().into_owned(),
        SegmentSource::Remote(remote) => {
            if !remote.headers.is_empty() {
                let header_block: String = remote
                    .headers
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}\r\n"))
                    .collect();
                args.push("-headers".into());
                args.push(header_block);
            }
            args.extend(
                [
                    "-reconnect",
                    "1",
                    "-reconnect_streamed",
                    "1",
                    "-reconnect_delay_max",
                    "5",
                ]
                .map(String::from),
            );
            remote.url.clone()
        }
    };

    args.push("-i".into());
    args.push(input);

    match profile {
        EncodingProfile::Copy => {
            args.push("-c".into());
            args.push("copy".into());
        }
        EncodingProfile::Bitrate(rate) => {
            let encoder = settings.hardware_encoder.as_deref().unwrap_or("libx264");
            args.push("-c:v".into());
            args.push(encoder.to_string());
            if encoder == "libx264" {
                args.push("-preset".into());
                args.push("veryfast".into());
            }
            args.extend(["-b:v".into(), rate.clone(), "-maxrate".into(), rate.clone()]);
            args.push("-c:a".into());
            args.push("copy".into());
        }
    }

    args.extend([
        "-f".into(),
        "hls".into(),
        "-hls_time".into(),
        settings.segment_duration_secs.to_string(),
        "-hls_playlist_type".into(),
        "event".into(),
        "-hls_segment_filename".into(),
        dir.join("chunk_%03d.ts").to_string_lossy().into_owned(),
        dir.join("stream.m3u8").to_string_lossy().into_owned(),
    ]);

    args
}
