use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ApiKey, CollectionListing, VideoPage};
use crate::resolver::{ChannelRef, VideoId};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API v3 client. The credential is supplied at construction
/// and threaded into every request; there is no process-wide singleton.
pub struct DataApi {
    client: Client,
    api_key: ApiKey,
}

impl DataApi {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> crate::Result<T> {
        let response = self
            .client
            .get(format!("{}/{}", API_BASE, resource))
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {} failed", resource))?;

        if !response.status().is_success() {
            anyhow::bail!("YouTube Data API error: HTTP {}", response.status());
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("could not parse {} response", resource))
    }

    /// Resolve a custom URL or handle to a channel id via a search lookup.
    /// Matching is by display name and can pick the wrong channel for
    /// ambiguous names; the exact-match semantics are unspecified upstream.
    async fn search_channel_id(&self, name: &str) -> crate::Result<Option<String>> {
        let response: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", name),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.id.channel_id))
    }

    async fn channel_id_for_username(&self, username: &str) -> crate::Result<Option<String>> {
        let response: ChannelListResponse = self
            .get_json("channels", &[("part", "id"), ("forUsername", username)])
            .await?;

        Ok(response.items.into_iter().next().and_then(|item| item.id))
    }
}

#[async_trait]
impl CollectionListing for DataApi {
    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> crate::Result<VideoPage> {
        let page_size = page_size.to_string();
        let mut query = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(cursor) = cursor {
            query.push(("pageToken", cursor));
        }

        let response: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;

        let video_ids = response
            .items
            .into_iter()
            .filter_map(|item| {
                let raw = item.content_details.video_id;
                match VideoId::new(&raw) {
                    Some(id) => Some(id),
                    None => {
                        tracing::warn!("Skipping malformed video id in playlist response: {}", raw);
                        None
                    }
                }
            })
            .collect();

        Ok(VideoPage {
            video_ids,
            next_cursor: response.next_page_token,
        })
    }

    async fn uploads_playlist(&self, channel: &ChannelRef) -> crate::Result<Option<String>> {
        let channel_id = match channel {
            ChannelRef::Id(id) => Some(id.clone()),
            ChannelRef::Custom(name) => self.search_channel_id(name).await?,
            ChannelRef::Username(name) => self.channel_id_for_username(name).await?,
        };
        let Some(channel_id) = channel_id else {
            return Ok(None);
        };

        let response: ChannelListResponse = self
            .get_json("channels", &[("part", "contentDetails"), ("id", &channel_id)])
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.content_details)
            .map(|details| details.related_playlists.uploads))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    id: Option<String>,
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    id: SearchResultId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    channel_id: Option<String>,
}
