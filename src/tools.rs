//! External tool discovery.
//!
//! ffmpeg is the only required tool. The configured path wins; otherwise it
//! is resolved from PATH. Hardware encoder support is probed once at startup
//! by scanning `ffmpeg -encoders` output.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Hardware H.264 encoders in preference order.
const HW_ENCODERS: [&str; 4] = ["h264_nvenc", "h264_qsv", "h264_videotoolbox", "h264_vaapi"];

/// Availability of one external tool.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub available: bool,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

/// Resolve the ffmpeg binary, preferring the configured override.
pub fn find_ffmpeg(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if !path.exists() {
            anyhow::bail!("Configured ffmpeg path does not exist: {:?}", path);
        }
        return Ok(path.to_path_buf());
    }

    which::which("ffmpeg").context("ffmpeg not found in PATH")
}

/// Probe ffmpeg for a usable hardware H.264 encoder.
///
/// An encoder listed by `-encoders` is compiled in but not necessarily
/// backed by working hardware; a job started with it can still fail at
/// runtime, which surfaces through the normal segmentation failure path.
pub async fn detect_hardware_encoder(ffmpeg: &Path) -> Option<String> {
    let output = tokio::process::Command::new(ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    for encoder in HW_ENCODERS {
        if listing
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(encoder))
        {
            tracing::info!("Hardware encoder available: {}", encoder);
            return Some(encoder.to_string());
        }
    }

    tracing::debug!("No hardware H.264 encoder found");
    None
}

/// Check availability of all external tools, for the `check-tools` command.
pub fn check_tools(configured_ffmpeg: Option<&Path>) -> Vec<ToolStatus> {
    let mut statuses = Vec::new();

    match find_ffmpeg(configured_ffmpeg) {
        Ok(path) => {
            let version = std::process::Command::new(&path)
                .arg("-version")
                .output()
                .ok()
                .filter(|out| out.status.success())
                .map(|out| String::from_utf8_lossy(&out.stdout).to_string());

            statuses.push(ToolStatus {
                name: "ffmpeg",
                available: true,
                path: Some(path),
                version,
            });
        }
        Err(_) => statuses.push(ToolStatus {
            name: "ffmpeg",
            available: false,
            path: None,
            version: None,
        }),
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_override_rejected() {
        let result = find_ffmpeg(Some(Path::new("/nonexistent/ffmpeg-xyz")));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_detect_on_missing_binary() {
        let result = detect_hardware_encoder(Path::new("/nonexistent/ffmpeg-xyz")).await;
        assert!(result.is_none());
    }
}
