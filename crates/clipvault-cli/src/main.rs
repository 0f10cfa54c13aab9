//! clipvault CLI: probe, ingest and sign videos against the configured storage backend.
//!
//! Configuration is read from the environment (and `.env`), see `clipvault_core::Config`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use clipvault_cli::init_tracing;
use clipvault_core::{AspectBucket, Config, StorageLocator};
use clipvault_processing::{FfprobeProber, IngestOrchestrator, MediaProber};
use clipvault_storage::create_storage;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "clipvault", about = "Video ingestion tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stream geometry and aspect bucket of a local video
    Probe {
        /// Path to the video file
        file: PathBuf,
        /// ffprobe binary to use
        #[arg(long, default_value = "ffprobe")]
        ffprobe_path: String,
        /// Give up after this many seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
    },
    /// Ingest a local video into object storage
    Ingest {
        /// Path to the video file
        file: PathBuf,
        /// Declared content type of the upload
        #[arg(long, default_value = "video/mp4")]
        content_type: String,
        /// Locator (`bucket,key`) of the object this upload replaces
        #[arg(long)]
        prior: Option<StorageLocator>,
    },
    /// Issue a signed read URL for a stored video
    Sign {
        /// Locator of the stored object, `bucket,key`
        locator: StorageLocator,
    },
}

#[derive(Serialize)]
struct ProbeOutput {
    width: u32,
    height: u32,
    codec: Option<String>,
    aspect: AspectBucket,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn orchestrator() -> anyhow::Result<IngestOrchestrator> {
    let config = Config::from_env().context("Invalid configuration")?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    IngestOrchestrator::from_config(&config, storage).context("Invalid media tool configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Probe {
            file,
            ffprobe_path,
            timeout_secs,
        } => {
            let prober = FfprobeProber::new(ffprobe_path, Duration::from_secs(timeout_secs))?;
            let info = prober
                .probe(&file)
                .await
                .with_context(|| format!("Failed to probe {}", file.display()))?;
            print_json(&ProbeOutput {
                aspect: AspectBucket::from_dimensions(info.width, info.height),
                width: info.width,
                height: info.height,
                codec: info.codec_name,
            })?;
        }
        Commands::Ingest {
            file,
            content_type,
            prior,
        } => {
            let orchestrator = orchestrator().await?;
            let upload = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;

            let locator = orchestrator
                .ingest(Box::pin(upload), &content_type, prior.as_ref())
                .await?;
            let access = orchestrator.resolve_read_url(Some(&locator)).await?;

            tracing::info!(locator = %locator, "Ingest finished");
            print_json(&serde_json::json!({
                "locator": locator.to_string(),
                "bucket": locator.bucket,
                "key": locator.key,
                "url": access.as_ref().map(|a| a.url.clone()),
                "expires_at": access.map(|a| a.expires_at),
            }))?;
        }
        Commands::Sign { locator } => {
            let orchestrator = orchestrator().await?;
            let access = orchestrator.resolve_read_url(Some(&locator)).await?;
            print_json(&access)?;
        }
    }

    Ok(())
}
