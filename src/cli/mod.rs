use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ytscribe",
    about = "Extract transcripts from YouTube videos, playlists, and channels",
    version,
    long_about = "A CLI tool for extracting YouTube transcripts. Accepts a video URL or id, \
                  a playlist URL, or a channel URL; playlist and channel enumeration requires \
                  a YouTube Data API key."
)]
pub struct Cli {
    /// YouTube video URL or id, playlist URL, or channel URL
    #[arg(value_name = "INPUT", required_unless_present = "video_list")]
    pub input: Option<String>,

    /// YouTube Data API key (required for playlists and channels)
    #[arg(long, env = "YOUTUBE_API_KEY", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Language code for the transcript (e.g. 'en', 'es'); default track if omitted
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<String>,

    /// Directory to save one <video_id>.txt file per transcript
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File with one video URL or id per line (batch mode)
    #[arg(long, value_name = "FILE", conflicts_with = "input")]
    pub video_list: Option<PathBuf>,

    /// Maximum number of videos to enumerate from a playlist or channel
    #[arg(long, value_name = "COUNT", default_value_t = 50)]
    pub max_results: u32,

    /// Delay between transcript requests in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 0.5)]
    pub delay: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_or_video_list_required() {
        assert!(Cli::try_parse_from(["ytscribe"]).is_err());
        assert!(Cli::try_parse_from(["ytscribe", "dQw4w9WgXcQ"]).is_ok());
        assert!(Cli::try_parse_from(["ytscribe", "--video-list", "ids.txt"]).is_ok());
        assert!(Cli::try_parse_from(["ytscribe", "dQw4w9WgXcQ", "--video-list", "ids.txt"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ytscribe", "dQw4w9WgXcQ"]).unwrap();
        assert_eq!(cli.max_results, 50);
        assert_eq!(cli.delay, 0.5);
        assert!(cli.language.is_none());
        assert!(cli.output_dir.is_none());
    }
}
