//! ytscribe - A Rust CLI tool for extracting YouTube transcripts
//!
//! This library resolves video, playlist, and channel references into video
//! ids, enumerates collections via the YouTube Data API, and fetches
//! transcripts through YouTube's InnerTube player endpoint.

pub mod batch;
pub mod cli;
pub mod resolver;
pub mod transcript;
pub mod youtube;

pub use batch::BatchExtractor;
pub use cli::Cli;
pub use resolver::{ChannelRef, InputRef, VideoId};
pub use transcript::{InnertubeSource, TranscriptResult, TranscriptSource};
pub use youtube::{ApiKey, CollectionKind, CollectionRequest, DataApi};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Errors surfaced by the extraction pipeline itself, as opposed to remote
/// service failures wrapped in anyhow.
#[derive(thiserror::Error, Debug)]
pub enum ExtractorError {
    #[error("YouTube API key is required for playlist and channel operations")]
    MissingApiKey,

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),
}

impl ExtractorError {
    /// Only configuration-level failures abort the process with a non-zero
    /// exit; everything else is reported as human-readable text and the
    /// process still exits zero.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractorError::MissingApiKey)
    }
}
