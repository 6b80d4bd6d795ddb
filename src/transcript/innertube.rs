use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use super::{TranscriptError, TranscriptSegment, TranscriptSource};
use crate::resolver::VideoId;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player?key=";

/// Transcript source backed by YouTube's InnerTube player endpoint.
///
/// Flow: fetch the watch page, lift the INNERTUBE_API_KEY out of it, hit the
/// player endpoint for the caption track list, then fetch the selected
/// track's segments in json3 form.
pub struct InnertubeSource {
    client: Client,
}

impl InnertubeSource {
    pub fn new() -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US"),
        );

        Self {
            client: Client::builder()
                .default_headers(headers)
                .build()
                .expect("failed to create HTTP client"),
        }
    }

    async fn fetch_watch_html(&self, video_id: &VideoId) -> Result<String, TranscriptError> {
        let url = format!("{}{}", WATCH_URL, video_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TranscriptError::Http(format!("failed to fetch watch page: {}", e)))?;

        check_status(&response)?;

        response
            .text()
            .await
            .map_err(|e| TranscriptError::Http(format!("failed to read watch page: {}", e)))
    }

    async fn fetch_player_response(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<PlayerResponse, TranscriptError> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id.as_str()
        });

        let response = self
            .client
            .post(format!("{}{}", PLAYER_URL, api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptError::Http(format!("failed to call player endpoint: {}", e)))?;

        check_status(&response)?;

        response
            .json::<PlayerResponse>()
            .await
            .map_err(|e| TranscriptError::Unparsable(video_id.to_string(), e.to_string()))
    }

    async fn fetch_track_segments(
        &self,
        video_id: &VideoId,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let url = format!("{}&fmt=json3", track.base_url.replace("&fmt=srv3", ""));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TranscriptError::Http(format!("failed to fetch transcript: {}", e)))?;

        check_status(&response)?;

        let transcript = response
            .json::<Json3Transcript>()
            .await
            .map_err(|e| TranscriptError::Unparsable(video_id.to_string(), e.to_string()))?;

        Ok(transcript
            .events
            .into_iter()
            .flat_map(|event| event.segs)
            .filter(|seg| !seg.utf8.trim().is_empty())
            .map(|seg| TranscriptSegment { text: seg.utf8 })
            .collect())
    }
}

impl Default for InnertubeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for InnertubeSource {
    async fn fetch(
        &self,
        video_id: &VideoId,
        language: Option<&str>,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        let html = self.fetch_watch_html(video_id).await?;
        let api_key = extract_innertube_api_key(&html, video_id)?;
        let player = self.fetch_player_response(video_id, &api_key).await?;

        let tracks = player
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .map(|r| r.caption_tracks)
            .filter(|tracks| !tracks.is_empty())
            .ok_or_else(|| TranscriptError::TranscriptsDisabled(video_id.to_string()))?;

        let track = select_track(&tracks, language).ok_or_else(|| {
            TranscriptError::NoTranscriptFound {
                video_id: video_id.to_string(),
                language: language.unwrap_or("default").to_string(),
            }
        })?;

        self.fetch_track_segments(video_id, track).await
    }
}

fn innertube_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid regex")
    })
}

fn extract_innertube_api_key(html: &str, video_id: &VideoId) -> Result<String, TranscriptError> {
    innertube_key_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            TranscriptError::Unparsable(
                video_id.to_string(),
                "no INNERTUBE_API_KEY in watch page".to_string(),
            )
        })
}

/// Pick the caption track for the requested language, preferring a manually
/// created track over an auto-generated (`asr`) one; with no language
/// preference the platform's first-listed track is the default.
fn select_track<'a>(tracks: &'a [CaptionTrack], language: Option<&str>) -> Option<&'a CaptionTrack> {
    match language {
        None => tracks.first(),
        Some(lang) => tracks
            .iter()
            .find(|t| t.language_code == lang && !t.is_generated())
            .or_else(|| tracks.iter().find(|t| t.language_code == lang)),
    }
}

fn check_status(response: &reqwest::Response) -> Result<(), TranscriptError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TranscriptError::Http(format!(
            "HTTP {}: {}",
            status,
            status.canonical_reason().unwrap_or("unknown error")
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(lang: &str, kind: Option<&str>) -> CaptionTrack {
        CaptionTrack {
            base_url: format!("https://example.com/{}", lang),
            language_code: lang.to_string(),
            kind: kind.map(|k| k.to_string()),
        }
    }

    #[test]
    fn test_extract_innertube_api_key() {
        let video_id = VideoId::new("dQw4w9WgXcQ").unwrap();
        let html = r#"..."INNERTUBE_API_KEY": "AIzaSyAO_x1-abc_DEF"..."#;
        assert_eq!(
            extract_innertube_api_key(html, &video_id).unwrap(),
            "AIzaSyAO_x1-abc_DEF"
        );
        assert!(extract_innertube_api_key("<html></html>", &video_id).is_err());
    }

    #[test]
    fn test_select_track_default_is_first() {
        let tracks = vec![track("en", None), track("es", None)];
        assert_eq!(select_track(&tracks, None).unwrap().language_code, "en");
    }

    #[test]
    fn test_select_track_prefers_manual_over_generated() {
        let tracks = vec![track("en", Some("asr")), track("en", None)];
        let selected = select_track(&tracks, Some("en")).unwrap();
        assert!(!selected.is_generated());
    }

    #[test]
    fn test_select_track_falls_back_to_generated() {
        let tracks = vec![track("en", Some("asr"))];
        assert!(select_track(&tracks, Some("en")).unwrap().is_generated());
    }

    #[test]
    fn test_select_track_missing_language() {
        let tracks = vec![track("en", None)];
        assert!(select_track(&tracks, Some("fr")).is_none());
    }

    #[test]
    fn test_json3_parsing() {
        let json = r#"{"events":[{"tStartMs":0,"segs":[{"utf8":"Never "}]},{"tStartMs":100},{"segs":[{"utf8":"\n"},{"utf8":"gonna"}]}]}"#;
        let transcript: Json3Transcript = serde_json::from_str(json).unwrap();
        let texts: Vec<String> = transcript
            .events
            .into_iter()
            .flat_map(|e| e.segs)
            .filter(|s| !s.utf8.trim().is_empty())
            .map(|s| s.utf8)
            .collect();
        assert_eq!(texts, vec!["Never ", "gonna"]);
    }
}
