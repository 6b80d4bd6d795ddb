use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytscribe::batch::BatchExtractor;
use ytscribe::cli::Cli;
use ytscribe::resolver::{self, InputRef};
use ytscribe::transcript::{InnertubeSource, TranscriptResult};
use ytscribe::youtube::{self, ApiKey, CollectionKind, CollectionRequest, DataApi};
use ytscribe::ExtractorError;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ytscribe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let delay = Duration::from_secs_f64(cli.delay.max(0.0));
    let source = InnertubeSource::new();
    let extractor = BatchExtractor::new(&source, delay);

    // Batch mode: one reference per line, unresolvable lines are skipped.
    if let Some(list_path) = &cli.video_list {
        let content = fs_err::read_to_string(list_path)
            .with_context(|| format!("failed to read video list {}", list_path.display()))?;

        let mut video_ids = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match resolver::resolve(line) {
                Some(id) => video_ids.push(id),
                None => tracing::warn!("Could not extract video ID from: {}", line),
            }
        }

        let results = extractor
            .run(&video_ids, cli.language.as_deref(), cli.output_dir.as_deref())
            .await?;
        print_summary(&results);
        return Ok(());
    }

    let input = cli.input.as_deref().context("no input given")?;
    let Some(reference) = resolver::classify(input) else {
        tracing::warn!("URL not recognized as a YouTube video, playlist, or channel");
        println!("Error: could not resolve input: {}", input);
        return Ok(());
    };

    match reference {
        InputRef::Video(video_id) => {
            let results = extractor
                .run(
                    std::slice::from_ref(&video_id),
                    cli.language.as_deref(),
                    cli.output_dir.as_deref(),
                )
                .await?;
            print_single(&results[0]);
        }
        InputRef::Playlist(playlist_id) => {
            let api = DataApi::new(require_api_key(&cli)?);
            tracing::info!("Enumerating playlist {}", playlist_id);
            let request = CollectionRequest {
                kind: CollectionKind::Playlist(playlist_id),
                max_results: cli.max_results,
            };
            let Some(video_ids) = enumerate_or_report(&api, &request).await? else {
                return Ok(());
            };

            let results = extractor
                .run(&video_ids, cli.language.as_deref(), cli.output_dir.as_deref())
                .await?;
            print_summary(&results);
        }
        InputRef::Channel(channel) => {
            let api = DataApi::new(require_api_key(&cli)?);
            tracing::info!("Enumerating uploads for channel {}", channel);
            let request = CollectionRequest {
                kind: CollectionKind::Channel(channel),
                max_results: cli.max_results,
            };
            let Some(video_ids) = enumerate_or_report(&api, &request).await? else {
                return Ok(());
            };

            let results = extractor
                .run(&video_ids, cli.language.as_deref(), cli.output_dir.as_deref())
                .await?;
            print_summary(&results);
        }
    }

    Ok(())
}

/// Enumerate a collection, downgrading per-job failures (unresolvable
/// channel, channel-lookup service errors) to a printed message and a zero
/// exit. Only configuration errors keep propagating.
async fn enumerate_or_report(
    api: &DataApi,
    request: &CollectionRequest,
) -> Result<Option<Vec<ytscribe::VideoId>>> {
    match youtube::enumerate(api, request).await {
        Ok(video_ids) => Ok(Some(video_ids)),
        Err(e) => {
            if e.downcast_ref::<ExtractorError>()
                .is_some_and(ExtractorError::is_fatal)
            {
                return Err(e);
            }
            tracing::warn!("Enumeration failed: {}", e);
            println!("Error: {}", e);
            Ok(None)
        }
    }
}

/// The credential check happens here, before any network call is attempted.
fn require_api_key(cli: &Cli) -> Result<ApiKey> {
    cli.api_key
        .as_deref()
        .map(ApiKey::new)
        .ok_or_else(|| ExtractorError::MissingApiKey.into())
}

fn print_single(result: &TranscriptResult) {
    match &result.transcript {
        Some(text) => {
            println!("\nTranscript for video {}:", result.video_id);
            let preview: String = text.chars().take(1000).collect();
            if preview.len() < text.len() {
                println!("{}...", preview);
            } else {
                println!("{}", preview);
            }
        }
        None => {
            println!("\nNo transcript available for video {}", result.video_id);
            if let Some(error) = &result.error {
                println!("{}", error);
            }
        }
    }
}

fn print_summary(results: &[TranscriptResult]) {
    let successful = results.iter().filter(|r| r.transcript.is_some()).count();
    println!(
        "\nProcessed {} videos, {} transcripts extracted",
        results.len(),
        successful
    );
}
