//! Video catalog gateway
//!
//! Wraps the video platform's search/list API (and its public Atom feed as a
//! fallback) behind the `CatalogSource` trait, and hosts the local
//! post-processing: popularity ranking, substring filtering, and the guest
//! extraction heuristic.
//!
//! "Most popular" here means *most-viewed among the last N uploads*, not
//! all-time popularity. A true all-time ranking would need a full channel
//! scan; the recent-window approximation is the documented behavior.

pub mod feed;
pub mod guests;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use feed::FeedVideo;
pub use guests::GuestMention;

const SEARCH_API_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const VIDEOS_API_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// A single catalog entry as the relay re-serves it. Read-only: the relay
/// never mutates catalog data, only reads and reshapes fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub published: String,
    pub description: String,
    pub view_count: Option<u64>,
    pub link: String,
}

impl VideoRecord {
    pub fn watch_link(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={video_id}")
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog credentials are not configured")]
    MissingConfig,

    #[error("catalog API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no matching videos")]
    NoResults,

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog payload parse error: {0}")]
    Feed(String),
}

/// Seam for the external catalog. Tests substitute a stub; production uses
/// [`YouTubeCatalog`].
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The single most recent upload.
    async fn latest_video(&self) -> Result<VideoRecord, CatalogError>;

    /// The `n` most recent uploads with view statistics attached.
    async fn recent_videos_with_stats(&self, n: usize) -> Result<Vec<VideoRecord>, CatalogError>;

    /// Up to `limit` entries from the public syndication feed.
    async fn feed_videos(&self, limit: usize) -> Result<Vec<FeedVideo>, CatalogError>;
}

// ============================================================================
// Local post-processing
// ============================================================================

/// Top `k` of `videos` by view count descending. The sort is stable, so
/// videos with equal (or missing) counts keep their catalog order.
pub fn rank_by_views(videos: &[VideoRecord], k: usize) -> Vec<VideoRecord> {
    let mut ranked = videos.to_vec();
    ranked.sort_by(|a, b| b.view_count.unwrap_or(0).cmp(&a.view_count.unwrap_or(0)));
    ranked.truncate(k);
    ranked
}

/// Case-insensitive, whitespace-normalized substring test of `term` against
/// title + description. No tokenization, no stemming, no ranking.
pub fn filter_by_term(videos: &[VideoRecord], term: &str) -> Vec<VideoRecord> {
    let needle = normalize_text(term);
    if needle.is_empty() {
        return Vec::new();
    }
    videos
        .iter()
        .filter(|v| {
            let haystack = normalize_text(&format!("{} {}", v.title, v.description));
            haystack.contains(&needle)
        })
        .cloned()
        .collect()
}

fn normalize_text(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// YouTube implementation
// ============================================================================

pub struct YouTubeCatalog {
    client: HttpClient,
    api_key: Option<String>,
    channel_id: Option<String>,
}

impl YouTubeCatalog {
    pub fn new(client: HttpClient, api_key: Option<String>, channel_id: Option<String>) -> Self {
        Self { client, api_key, channel_id }
    }

    fn credentials(&self) -> Result<(&str, &str), CatalogError> {
        match (self.api_key.as_deref(), self.channel_id.as_deref()) {
            (Some(key), Some(channel)) => Ok((key, channel)),
            _ => Err(CatalogError::MissingConfig),
        }
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, CatalogError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("catalog API returned {status}"));
            return Err(CatalogError::Api { status: status.as_u16(), message });
        }

        Ok(body)
    }

    /// Search API: `n` most recent uploads, snippet only (no statistics).
    async fn search_recent(&self, n: usize) -> Result<Vec<VideoRecord>, CatalogError> {
        let (key, channel) = self.credentials()?;
        let url = format!(
            "{SEARCH_API_URL}?part=snippet&channelId={}&order=date&maxResults={n}&type=video&key={}",
            urlencoding::encode(channel),
            urlencoding::encode(key),
        );

        let body = self.get_json(&url).await?;
        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| CatalogError::Feed(e.to_string()))?;

        let videos: Vec<VideoRecord> = response
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                let snippet = item.snippet?;
                Some(VideoRecord {
                    link: VideoRecord::watch_link(&video_id),
                    video_id,
                    title: snippet.title,
                    published: snippet.published_at,
                    description: snippet.description,
                    view_count: None,
                })
            })
            .collect();

        if videos.is_empty() {
            return Err(CatalogError::NoResults);
        }
        Ok(videos)
    }
}

#[async_trait]
impl CatalogSource for YouTubeCatalog {
    async fn latest_video(&self) -> Result<VideoRecord, CatalogError> {
        // No API key but a channel id: the public feed still works.
        if self.api_key.is_none() {
            if let Some(channel) = self.channel_id.as_deref() {
                let entries = feed::fetch_feed(&self.client, channel).await?;
                return entries
                    .into_iter()
                    .next()
                    .map(FeedVideo::into_record)
                    .ok_or(CatalogError::NoResults);
            }
        }

        let videos = self.search_recent(1).await?;
        videos.into_iter().next().ok_or(CatalogError::NoResults)
    }

    async fn recent_videos_with_stats(&self, n: usize) -> Result<Vec<VideoRecord>, CatalogError> {
        let (key, _) = self.credentials()?;
        let mut videos = self.search_recent(n).await?;

        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        let url = format!(
            "{VIDEOS_API_URL}?part=statistics&id={}&key={}",
            urlencoding::encode(&ids.join(",")),
            urlencoding::encode(key),
        );

        let body = self.get_json(&url).await?;
        let response: VideosResponse =
            serde_json::from_value(body).map_err(|e| CatalogError::Feed(e.to_string()))?;

        for item in response.items {
            let count = item
                .statistics
                .as_ref()
                .and_then(|s| s.view_count.as_deref())
                .and_then(|c| c.parse::<u64>().ok());
            if let Some(video) = videos.iter_mut().find(|v| v.video_id == item.id) {
                video.view_count = count;
            }
        }

        Ok(videos)
    }

    async fn feed_videos(&self, limit: usize) -> Result<Vec<FeedVideo>, CatalogError> {
        let channel = self.channel_id.as_deref().ok_or(CatalogError::MissingConfig)?;
        let mut entries = feed::fetch_feed(&self.client, channel).await?;
        entries.truncate(limit);
        Ok(entries)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(rename = "publishedAt", default)]
    published_at: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideosItem>,
}

#[derive(Deserialize)]
struct VideosItem {
    id: String,
    statistics: Option<Statistics>,
}

#[derive(Deserialize)]
struct Statistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, title: &str, description: &str, views: Option<u64>) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            title: title.to_string(),
            published: "2025-06-01T00:00:00Z".to_string(),
            description: description.to_string(),
            view_count: views,
            link: VideoRecord::watch_link(id),
        }
    }

    #[test]
    fn test_rank_by_views_descending() {
        let videos = vec![
            video("a", "A", "", Some(10)),
            video("b", "B", "", Some(500)),
            video("c", "C", "", Some(42)),
        ];
        let ranked = rank_by_views(&videos, 3);
        let ids: Vec<&str> = ranked.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_ties_preserve_catalog_order() {
        let videos = vec![
            video("first", "First", "", Some(100)),
            video("second", "Second", "", Some(100)),
            video("third", "Third", "", Some(100)),
        ];
        let ranked = rank_by_views(&videos, 3);
        let ids: Vec<&str> = ranked.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_truncates_to_k() {
        let videos = vec![
            video("a", "A", "", Some(1)),
            video("b", "B", "", Some(2)),
            video("c", "C", "", Some(3)),
        ];
        assert_eq!(rank_by_views(&videos, 2).len(), 2);
    }

    #[test]
    fn test_missing_view_counts_sort_last() {
        let videos = vec![
            video("a", "A", "", None),
            video("b", "B", "", Some(5)),
        ];
        let ranked = rank_by_views(&videos, 2);
        assert_eq!(ranked[0].video_id, "b");
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let videos = vec![
            video("a", "Intro to Robotics", "A deep dive", None),
            video("b", "ML Basics", "All about machine learning", None),
        ];
        let hits = filter_by_term(&videos, "robot");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].video_id, "a");
    }

    #[test]
    fn test_filter_matches_description_too() {
        let videos = vec![video("a", "Episode 12", "We discuss ROBOTICS at length", None)];
        assert_eq!(filter_by_term(&videos, "Robotics").len(), 1);
    }

    #[test]
    fn test_filter_normalizes_whitespace() {
        let videos = vec![video("a", "Deep  Learning", "spaced   out", None)];
        assert_eq!(filter_by_term(&videos, "deep learning").len(), 1);
    }

    #[test]
    fn test_filter_empty_term_matches_nothing() {
        let videos = vec![video("a", "Anything", "", None)];
        assert!(filter_by_term(&videos, "   ").is_empty());
    }
}
