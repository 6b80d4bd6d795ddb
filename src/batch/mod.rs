use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::resolver::VideoId;
use crate::transcript::{fetch_transcript, TranscriptResult, TranscriptSource};

/// Sequential batch driver over a transcript source.
///
/// One item's failure never aborts the batch: unexpected fetch errors are
/// caught and recorded on that item's result, and the loop always reaches
/// the last identifier.
pub struct BatchExtractor<'a> {
    source: &'a dyn TranscriptSource,
    delay: Duration,
}

impl<'a> BatchExtractor<'a> {
    pub fn new(source: &'a dyn TranscriptSource, delay: Duration) -> Self {
        Self { source, delay }
    }

    /// Fetch transcripts for every id, in order, returning one result per
    /// input (output length always equals input length). Successful
    /// transcripts are written to `{output_dir}/{video_id}.txt` when an
    /// output directory is given; the directory is created first, parents
    /// included.
    pub async fn run(
        &self,
        video_ids: &[VideoId],
        language: Option<&str>,
        output_dir: Option<&Path>,
    ) -> crate::Result<Vec<TranscriptResult>> {
        if let Some(dir) = output_dir {
            fs_err::create_dir_all(dir)
                .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        }

        let progress = ProgressBar::new(video_ids.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap(),
        );

        let mut results = Vec::with_capacity(video_ids.len());
        for (i, video_id) in video_ids.iter().enumerate() {
            progress.set_message(video_id.to_string());
            tracing::info!(
                "Processing video {}/{}: {}",
                i + 1,
                video_ids.len(),
                video_id
            );

            let result = match fetch_transcript(self.source, video_id, language).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Unexpected error fetching transcript for {}: {}", video_id, e);
                    TranscriptResult::failure(video_id.clone(), e.to_string())
                }
            };

            if let (Some(dir), Some(text)) = (output_dir, result.transcript.as_deref()) {
                let path = dir.join(format!("{}.txt", result.video_id));
                fs_err::write(&path, text)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                tracing::info!("Saved transcript to {}", path.display());
            }

            results.push(result);
            progress.inc(1);

            // Pacing only, no retry: sleep between items, never after the last.
            if i + 1 < video_ids.len() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        progress.finish_and_clear();
        Ok(results)
    }
}
