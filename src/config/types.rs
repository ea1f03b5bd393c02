use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root of the recorder's directory layout (the folder containing
    /// RecentClips/SavedClips/SentryClips).
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Where segmented HLS artifacts are written.
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./TeslaCam")
}
fn default_cache_root() -> PathBuf {
    PathBuf::from("./cache")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            cache_root: default_cache_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Target HLS chunk duration in seconds (default: 4)
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,

    /// Target video bitrate in ffmpeg syntax, e.g. "2500k".
    /// Empty means stream-copy without re-encoding (default).
    #[serde(default)]
    pub target_bitrate: String,

    /// Use a hardware H.264 encoder when one is available
    #[serde(default)]
    pub hardware_acceleration: bool,

    /// Maximum concurrent ffmpeg jobs. Unset picks a default based on
    /// whether hardware encoding is in use.
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,

    /// Timeout for stream-copy jobs in seconds (default: 60)
    #[serde(default = "default_copy_timeout")]
    pub copy_timeout_secs: u64,

    /// Timeout for re-encode and remote-input jobs in seconds (default: 300)
    #[serde(default = "default_encode_timeout")]
    pub encode_timeout_secs: u64,
}

fn default_segment_duration() -> u32 {
    4
}
fn default_copy_timeout() -> u64 {
    60
}
fn default_encode_timeout() -> u64 {
    300
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            segment_duration_secs: default_segment_duration(),
            target_bitrate: String::new(),
            hardware_acceleration: false,
            max_concurrent_jobs: None,
            copy_timeout_secs: default_copy_timeout(),
            encode_timeout_secs: default_encode_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Number of extraction results held in the in-process cache
    /// (default: 64)
    #[serde(default = "default_cache_entries")]
    pub cache_entries: usize,
}

fn default_cache_entries() -> usize {
    64
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            cache_entries: default_cache_entries(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}
