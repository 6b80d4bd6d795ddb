use async_trait::async_trait;
use serde::Serialize;

use crate::resolver::VideoId;

pub mod innertube;

pub use innertube::InnertubeSource;

/// A single caption segment as returned by the transcript service.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptSegment {
    pub text: String,
}

/// Failure taxonomy for a single transcript fetch.
///
/// `TranscriptsDisabled` and `NoTranscriptFound` are expected conditions and
/// get downgraded to an error-bearing [`TranscriptResult`]; everything else
/// propagates to the caller.
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("transcripts are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error("no transcript found for video {video_id} in language {language}")]
    NoTranscriptFound { video_id: String, language: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("could not parse transcript data for video {0}: {1}")]
    Unparsable(String, String),
}

impl TranscriptError {
    /// Expected, recoverable conditions: the video simply has no usable track.
    fn is_expected(&self) -> bool {
        matches!(
            self,
            TranscriptError::TranscriptsDisabled(_) | TranscriptError::NoTranscriptFound { .. }
        )
    }
}

/// Remote transcript service boundary.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript segments for a video, honoring the requested
    /// language when one is given and falling back to the default track
    /// otherwise.
    async fn fetch(
        &self,
        video_id: &VideoId,
        language: Option<&str>,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Outcome of one transcript fetch: exactly one of `transcript`/`error` is
/// populated on completion.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResult {
    pub video_id: VideoId,
    pub transcript: Option<String>,
    pub error: Option<String>,
}

impl TranscriptResult {
    pub fn success(video_id: VideoId, transcript: String) -> Self {
        Self {
            video_id,
            transcript: Some(transcript),
            error: None,
        }
    }

    pub fn failure(video_id: VideoId, error: String) -> Self {
        Self {
            video_id,
            transcript: None,
            error: Some(error),
        }
    }
}

/// Collapse every run of whitespace (spaces, newlines, tabs) to a single
/// space and trim the edges.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetch and normalize the transcript for one video.
///
/// Expected failures (disabled captions, no matching-language track) come
/// back as an `Ok` result with the `error` field populated; anything else is
/// a genuine `Err` for this fetch and the batch layer decides containment.
pub async fn fetch_transcript(
    source: &dyn TranscriptSource,
    video_id: &VideoId,
    language: Option<&str>,
) -> crate::Result<TranscriptResult> {
    match source.fetch(video_id, language).await {
        Ok(segments) => {
            let joined = segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Ok(TranscriptResult::success(
                video_id.clone(),
                normalize_text(&joined),
            ))
        }
        Err(e) if e.is_expected() => {
            tracing::warn!("Error extracting transcript for video {}: {}", video_id, e);
            Ok(TranscriptResult::failure(video_id.clone(), e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
