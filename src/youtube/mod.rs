use std::fmt;

use async_trait::async_trait;

use crate::resolver::{ChannelRef, VideoId};
use crate::ExtractorError;

pub mod data_api;

pub use data_api::DataApi;

/// The Data API caps playlist pages at 50 items.
pub const MAX_PAGE_SIZE: u32 = 50;

/// An opaque YouTube Data API credential. Never logged; the Debug impl
/// redacts the key.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// What to enumerate: a playlist by id, or a channel's uploads.
#[derive(Debug, Clone)]
pub enum CollectionKind {
    Playlist(String),
    Channel(ChannelRef),
}

#[derive(Debug, Clone)]
pub struct CollectionRequest {
    pub kind: CollectionKind,
    pub max_results: u32,
}

/// One page of a paginated listing: the ids it carried, plus the opaque
/// continuation cursor when more pages exist.
#[derive(Debug, Clone)]
pub struct VideoPage {
    pub video_ids: Vec<VideoId>,
    pub next_cursor: Option<String>,
}

/// Remote paginated-listing boundary (YouTube Data API v3 in production).
#[async_trait]
pub trait CollectionListing: Send + Sync {
    /// Fetch one page of a playlist's video ids.
    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> crate::Result<VideoPage>;

    /// Resolve a channel reference to its uploads playlist id, or `None`
    /// when the channel does not exist.
    async fn uploads_playlist(&self, channel: &ChannelRef) -> crate::Result<Option<String>>;
}

/// Walk a cursor-paginated collection and return up to `max_results` video
/// ids, in listing order.
///
/// Channel requests resolve the uploads playlist first; an unresolvable
/// channel is an explicit error, never a silent empty result. A page error
/// mid-enumeration logs a warning and returns whatever accumulated so far.
pub async fn enumerate(
    listing: &dyn CollectionListing,
    request: &CollectionRequest,
) -> crate::Result<Vec<VideoId>> {
    let playlist_id = match &request.kind {
        CollectionKind::Playlist(id) => id.clone(),
        CollectionKind::Channel(channel) => listing
            .uploads_playlist(channel)
            .await?
            .ok_or_else(|| ExtractorError::ChannelNotFound(channel.to_string()))?,
    };

    if request.max_results == 0 {
        return Ok(Vec::new());
    }

    let mut video_ids: Vec<VideoId> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let remaining = request.max_results.saturating_sub(video_ids.len() as u32);
        let page_size = remaining.min(MAX_PAGE_SIZE);

        let page = match listing
            .playlist_page(&playlist_id, page_size, cursor.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Error retrieving playlist videos: {}", e);
                break;
            }
        };

        video_ids.extend(page.video_ids);
        cursor = page.next_cursor;

        if cursor.is_none() || video_ids.len() as u32 >= request.max_results {
            break;
        }
    }

    video_ids.truncate(request.max_results as usize);
    Ok(video_ids)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory listing over a fixed collection, optionally failing from a
    /// given page onwards.
    struct FakeListing {
        ids: Vec<VideoId>,
        uploads: Option<String>,
        fail_from_page: Option<usize>,
        calls: AtomicUsize,
    }

    impl FakeListing {
        fn with_items(count: usize) -> Self {
            let ids = (0..count)
                .map(|i| VideoId::new(&format!("video{:06}", i)).unwrap())
                .collect();
            Self {
                ids,
                uploads: Some("UUuploads".to_string()),
                fail_from_page: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CollectionListing for FakeListing {
        async fn playlist_page(
            &self,
            _playlist_id: &str,
            page_size: u32,
            cursor: Option<&str>,
        ) -> crate::Result<VideoPage> {
            let page = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_from_page == Some(page) {
                anyhow::bail!("HTTP 503: Service Unavailable");
            }

            let offset: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            let end = (offset + page_size as usize).min(self.ids.len());
            let next_cursor = (end < self.ids.len()).then(|| end.to_string());
            Ok(VideoPage {
                video_ids: self.ids[offset..end].to_vec(),
                next_cursor,
            })
        }

        async fn uploads_playlist(&self, _channel: &ChannelRef) -> crate::Result<Option<String>> {
            Ok(self.uploads.clone())
        }
    }

    fn playlist_request(max_results: u32) -> CollectionRequest {
        CollectionRequest {
            kind: CollectionKind::Playlist("PLtest".to_string()),
            max_results,
        }
    }

    #[tokio::test]
    async fn test_enumerate_enforces_cap_exactly() {
        let listing = FakeListing::with_items(120);
        let ids = enumerate(&listing, &playlist_request(50)).await.unwrap();
        assert_eq!(ids.len(), 50);
        assert_eq!(ids[0].as_str(), "video000000");
        assert_eq!(ids[49].as_str(), "video000049");
    }

    #[tokio::test]
    async fn test_enumerate_paginates_past_page_limit() {
        let listing = FakeListing::with_items(120);
        let ids = enumerate(&listing, &playlist_request(80)).await.unwrap();
        assert_eq!(ids.len(), 80);
        assert_eq!(listing.call_count(), 2);
        // The page after the first full one only asks for what is missing.
        assert_eq!(ids[79].as_str(), "video000079");
    }

    #[tokio::test]
    async fn test_enumerate_stops_at_end_of_collection() {
        let listing = FakeListing::with_items(70);
        let ids = enumerate(&listing, &playlist_request(200)).await.unwrap();
        assert_eq!(ids.len(), 70);
        assert_eq!(listing.call_count(), 2);
    }

    #[tokio::test]
    async fn test_enumerate_preserves_listing_order() {
        let listing = FakeListing::with_items(7);
        let ids = enumerate(&listing, &playlist_request(50)).await.unwrap();
        let expected: Vec<String> = (0..7).map(|i| format!("video{:06}", i)).collect();
        let actual: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_enumerate_returns_partial_results_on_page_error() {
        let mut listing = FakeListing::with_items(120);
        listing.fail_from_page = Some(1);
        let ids = enumerate(&listing, &playlist_request(120)).await.unwrap();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn test_enumerate_channel_delegates_to_uploads_playlist() {
        let listing = FakeListing::with_items(3);
        let request = CollectionRequest {
            kind: CollectionKind::Channel(ChannelRef::Id("UCtest".to_string())),
            max_results: 50,
        };
        let ids = enumerate(&listing, &request).await.unwrap();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_enumerate_unresolvable_channel_is_an_error() {
        let mut listing = FakeListing::with_items(3);
        listing.uploads = None;
        let request = CollectionRequest {
            kind: CollectionKind::Channel(ChannelRef::Custom("nosuch".to_string())),
            max_results: 50,
        };
        let err = enumerate(&listing, &request).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractorError>(),
            Some(ExtractorError::ChannelNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_channel_not_found_does_not_abort_the_process() {
        let mut listing = FakeListing::with_items(3);
        listing.uploads = None;
        let request = CollectionRequest {
            kind: CollectionKind::Channel(ChannelRef::Id("UCnosuch".to_string())),
            max_results: 50,
        };
        let err = enumerate(&listing, &request).await.unwrap_err();

        // Non-zero exit is reserved for configuration errors; an
        // unresolvable channel is reported and the process exits zero.
        let extractor_err = err.downcast_ref::<ExtractorError>().unwrap();
        assert!(!extractor_err.is_fatal());
        assert!(ExtractorError::MissingApiKey.is_fatal());
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret-key");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }
}
