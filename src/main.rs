mod cli;

use dashvault::{
    config,
    segmenter::{SegmentEngine, SegmenterSettings},
    server::{self, AppContext},
    storage::LocalStorage,
    telemetry::TelemetryService,
    tools,
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use std::time::Duration;

async fn start_server(
    host: String,
    port: u16,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    config.server.host = host;
    config.server.port = port;

    tracing::info!("Starting Dashvault server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let ffmpeg = tools::find_ffmpeg(config.tools.ffmpeg_path.as_deref())?;
    tracing::info!("Using ffmpeg at {:?}", ffmpeg);

    let hardware_encoder = if config.streaming.hardware_acceleration {
        tools::detect_hardware_encoder(&ffmpeg).await
    } else {
        None
    };
    if config.streaming.hardware_acceleration && hardware_encoder.is_none() {
        tracing::warn!("Hardware acceleration requested but no encoder found, using libx264");
    }

    let storage = Arc::new(LocalStorage::new(config.library.media_root.clone()));
    let engine = SegmentEngine::new(SegmenterSettings {
        cache_root: config.library.cache_root.clone(),
        ffmpeg,
        segment_duration_secs: config.streaming.segment_duration_secs,
        hardware_encoder,
        max_concurrent_jobs: config.streaming.max_concurrent_jobs,
        copy_timeout: Duration::from_secs(config.streaming.copy_timeout_secs),
        encode_timeout: Duration::from_secs(config.streaming.encode_timeout_secs),
    });
    let telemetry = Arc::new(TelemetryService::new(
        storage.clone(),
        config.telemetry.cache_entries,
    ));

    let ctx = AppContext {
        config: Arc::new(config),
        storage,
        engine,
        telemetry,
    };

    server::start_server(ctx).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dashvault=trace,dashvault_media=trace,dashvault_common=debug,tower_http=debug"
                .to_string()
        } else {
            "dashvault=debug,dashvault_media=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Telemetry { file, json } => telemetry_file(&file, json),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("dashvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn telemetry_file(file: &std::path::Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let buf = std::fs::read(file)?;
    let data = dashvault_media::extract_telemetry(&buf);

    match data {
        Some(data) if json => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Some(data) => {
            println!("File: {}", file.display());
            println!("Frames: {}", data.frames.len());
            if let (Some(first), Some(last)) =
                (data.frame_times_ms.first(), data.frame_times_ms.last())
            {
                println!("Span: {:.0} ms .. {:.0} ms", first, last);
            }
            for (time, frame) in data.frame_times_ms.iter().zip(&data.frames).take(10) {
                println!(
                    "  {:>8.1} ms  seq {}  {:.1} m/s  heading {:.1}",
                    time, frame.frame_seq_no, frame.vehicle_speed_mps, frame.heading_deg
                );
            }
            if data.frames.len() > 10 {
                println!("  ... {} more frames", data.frames.len() - 10);
            }
        }
        None => {
            println!("No telemetry found in {:?}", file);
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&std::path::Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = tools::check_tools(config.tools.ffmpeg_path.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Media root: {:?}", config.library.media_root);
            println!("  Cache root: {:?}", config.library.cache_root);
            println!(
                "  Encoding: {}",
                if config.streaming.target_bitrate.is_empty() {
                    "stream copy".to_string()
                } else {
                    config.streaming.target_bitrate.clone()
                }
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Media root: {:?}", config.library.media_root);
        }
    }

    Ok(())
}
