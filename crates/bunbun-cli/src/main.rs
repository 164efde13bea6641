//! bunbun CLI: push local videos into a Bunny Stream library.
//!
//! Set BUN_API_KEY and BUN_LIBRARY_ID (optionally BUN_CDN_HOSTNAME and the
//! BUNBUN_* tuning variables). A `.env` file is read when present.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bunbun_cli::{guess_mime, init_tracing};
use bunbun_core::{
    AttachmentId, Credentials, EnvSettingsStore, InMemoryMediaStore, PlaybackHost,
    PlaybackUrlBuilder, SettingsStore, StoredAttachment, StreamConfig, SyncOutcome, API_KEY_KEY,
    CDN_HOSTNAME_KEY, LIBRARY_ID_KEY,
};
use bunbun_plugins::{BunnyStreamClient, UploadSyncHandler};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "bunbun", about = "Bunny Stream upload sync CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a remote video for a local file, upload it and verify it
    Sync {
        /// Path to the video file
        file: PathBuf,
        /// Video title (defaults to BUNBUN_DEFAULT_TITLE)
        #[arg(long)]
        title: Option<String>,
        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },
    /// Fetch a video record by ID
    Get {
        /// Remote video ID (guid)
        video_id: String,
    },
    /// Print the playback URL for a video
    PlaybackUrl {
        /// Remote video ID (guid)
        video_id: String,
        /// Use the configured CDN hostname instead of the player host
        #[arg(long)]
        cdn: bool,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before tracing, so RUST_LOG from `.env` applies.
    dotenvy::dotenv().ok();
    init_tracing();

    let config = StreamConfig::from_env().context("Invalid BUNBUN_* configuration")?;
    let settings = Arc::new(EnvSettingsStore::new());

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { file, title, mime } => {
            let file = std::fs::canonicalize(&file)
                .with_context(|| format!("Cannot resolve {}", file.display()))?;
            let mime = mime.unwrap_or_else(|| guess_mime(&file).to_string());

            let attachment_id = AttachmentId::from(1u64);
            let store = InMemoryMediaStore::new();
            store.insert(
                attachment_id.clone(),
                StoredAttachment {
                    mime_type: Some(mime),
                    file_path: Some(file),
                    title,
                    ..Default::default()
                },
            );

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling upload");
                    on_signal.cancel();
                }
            });

            let handler = UploadSyncHandler::new(settings, Arc::new(store), config)?
                .with_cancellation(cancel);

            match handler.on_attachment_created(&attachment_id).await {
                SyncOutcome::Synced(result) => print_json(&result)?,
                SyncOutcome::Skipped(reason) => {
                    anyhow::bail!("Nothing uploaded: {:?}", reason)
                }
                SyncOutcome::Failed(err) => {
                    return Err(err).context("Video sync failed");
                }
            }
        }
        Commands::Get { video_id } => {
            let api_key = settings.get_option(API_KEY_KEY).await?.unwrap_or_default();
            let library_id = settings.get_option(LIBRARY_ID_KEY).await?.unwrap_or_default();
            let credentials = Credentials::new(api_key, library_id)
                .context("Set BUN_API_KEY and BUN_LIBRARY_ID")?;

            let client = BunnyStreamClient::new(credentials, &config)?;
            let video = client.get_video(&video_id).await?;
            print_json(&video)?;
        }
        Commands::PlaybackUrl { video_id, cdn } => {
            let library_id = settings
                .get_option(LIBRARY_ID_KEY)
                .await?
                .context("Set BUN_LIBRARY_ID")?;
            let cdn_hostname = settings.get_option(CDN_HOSTNAME_KEY).await?;

            let host = if cdn {
                PlaybackHost::Cdn
            } else {
                PlaybackHost::Player
            };
            let url = PlaybackUrlBuilder::new(config.player_host.clone())
                .with_cdn_hostname(cdn_hostname)
                .build(host, &library_id, &video_id)
                .context("No playback host configured (set BUN_CDN_HOSTNAME for --cdn)")?;
            println!("{}", url);
        }
    }

    Ok(())
}
