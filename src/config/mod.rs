mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./dashvault.toml",
        "~/.config/dashvault/config.toml",
        "/etc/dashvault/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.streaming.segment_duration_secs == 0 {
        anyhow::bail!("Segment duration cannot be 0");
    }

    if config.telemetry.cache_entries == 0 {
        anyhow::bail!("Telemetry cache size cannot be 0");
    }

    if let Some(jobs) = config.streaming.max_concurrent_jobs {
        if jobs == 0 {
            anyhow::bail!("max_concurrent_jobs cannot be 0");
        }
    }

    if !config.library.media_root.exists() {
        tracing::warn!("Media root does not exist: {:?}", config.library.media_root);
    }

    Ok(())
}
