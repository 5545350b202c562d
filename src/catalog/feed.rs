//! Public syndication feed (Atom XML) for a channel.
//!
//! The feed needs no API key, so it backs both the `/api/videos/latest`
//! endpoint and the latest-video lookup when only a channel id is configured.

use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client as HttpClient;
use serde::Serialize;
use std::time::Duration;

use super::{CatalogError, VideoRecord};

const FEED_TIMEOUT_SECS: u64 = 15;

/// One feed entry, normalized to the fields the widget renders.
#[derive(Debug, Clone, Serialize)]
pub struct FeedVideo {
    pub title: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub link: String,
    pub published: String,
    pub thumbnail: String,
    #[serde(skip_serializing)]
    pub description: String,
}

impl FeedVideo {
    /// Promote a feed entry to the richer record shape. The feed never
    /// carries view counts.
    pub fn into_record(self) -> VideoRecord {
        VideoRecord {
            video_id: self.video_id,
            title: self.title,
            published: self.published,
            description: self.description,
            view_count: None,
            link: self.link,
        }
    }
}

pub fn feed_url(channel_id: &str) -> String {
    format!(
        "https://www.youtube.com/feeds/videos.xml?channel_id={}",
        urlencoding::encode(channel_id)
    )
}

pub async fn fetch_feed(
    client: &HttpClient,
    channel_id: &str,
) -> Result<Vec<FeedVideo>, CatalogError> {
    let response = client
        .get(feed_url(channel_id))
        .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(CatalogError::Api {
            status: status.as_u16(),
            message: format!("feed returned {status}"),
        });
    }

    let xml = response.text().await?;
    parse_feed(&xml)
}

/// Pull `<entry>` elements out of the Atom document. Only the handful of
/// elements the relay re-serves are tracked.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedVideo>, CatalogError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut videos = Vec::new();
    let mut buf = Vec::new();
    let mut in_entry = false;
    let mut current_element = String::new();
    let mut entry = PartialEntry::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "entry" {
                    in_entry = true;
                    entry = PartialEntry::default();
                } else if in_entry {
                    entry.grab_attributes(e);
                }
                current_element = name;
            }
            Ok(Event::Empty(ref e)) if in_entry => {
                entry.grab_attributes(e);
            }
            Ok(Event::Text(e)) if in_entry => {
                let text = e
                    .xml_content()
                    .map_err(|err| CatalogError::Feed(err.to_string()))?;
                match current_element.as_str() {
                    "yt:videoId" => entry.video_id = text.to_string(),
                    "title" => entry.title = text.to_string(),
                    "published" => entry.published = text.to_string(),
                    "media:description" => entry.description = text.to_string(),
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"entry" {
                    in_entry = false;
                    if let Some(video) = entry.take() {
                        videos.push(video);
                    }
                }
                current_element.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CatalogError::Feed(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(videos)
}

fn attr_value(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_string()
}

#[derive(Default)]
struct PartialEntry {
    video_id: String,
    title: String,
    link: String,
    published: String,
    thumbnail: String,
    description: String,
}

impl PartialEntry {
    /// `<link>` and `<media:thumbnail>` carry their payload in attributes,
    /// and appear both self-closing and not in the wild.
    fn grab_attributes(&mut self, element: &quick_xml::events::BytesStart<'_>) {
        match element.name().as_ref() {
            b"link" => {
                if let Ok(Some(href)) = element.try_get_attribute("href") {
                    self.link = attr_value(href.value.as_ref());
                }
            }
            b"media:thumbnail" => {
                if let Ok(Some(url)) = element.try_get_attribute("url") {
                    self.thumbnail = attr_value(url.value.as_ref());
                }
            }
            _ => {}
        }
    }

    /// An entry without a video id is noise (the feed's channel header also
    /// carries `<title>`); skip it.
    fn take(&mut self) -> Option<FeedVideo> {
        if self.video_id.is_empty() {
            return None;
        }
        let link = if self.link.is_empty() {
            VideoRecord::watch_link(&self.video_id)
        } else {
            std::mem::take(&mut self.link)
        };
        Some(FeedVideo {
            title: std::mem::take(&mut self.title),
            video_id: std::mem::take(&mut self.video_id),
            link,
            published: std::mem::take(&mut self.published),
            thumbnail: std::mem::take(&mut self.thumbnail),
            description: std::mem::take(&mut self.description),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015"
      xmlns:media="http://search.yahoo.com/mrss/"
      xmlns="http://www.w3.org/2005/Atom">
  <title>Channel Title</title>
  <entry>
    <id>yt:video:abc123</id>
    <yt:videoId>abc123</yt:videoId>
    <title>First Episode</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc123"/>
    <published>2025-06-10T09:00:00+00:00</published>
    <media:group>
      <media:title>First Episode</media:title>
      <media:thumbnail url="https://i.ytimg.com/vi/abc123/hqdefault.jpg" width="480" height="360"/>
      <media:description>A long talk about robotics with Jane Doe.</media:description>
    </media:group>
  </entry>
  <entry>
    <id>yt:video:def456</id>
    <yt:videoId>def456</yt:videoId>
    <title>Second Episode</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=def456"/>
    <published>2025-06-03T09:00:00+00:00</published>
    <media:group>
      <media:thumbnail url="https://i.ytimg.com/vi/def456/hqdefault.jpg" width="480" height="360"/>
      <media:description>Short one.</media:description>
    </media:group>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed_extracts_entries() {
        let videos = parse_feed(SAMPLE_FEED).unwrap();
        assert_eq!(videos.len(), 2);

        let first = &videos[0];
        assert_eq!(first.video_id, "abc123");
        assert_eq!(first.title, "First Episode");
        assert_eq!(first.link, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(first.published, "2025-06-10T09:00:00+00:00");
        assert_eq!(first.thumbnail, "https://i.ytimg.com/vi/abc123/hqdefault.jpg");
        assert!(first.description.contains("robotics"));
    }

    #[test]
    fn test_channel_header_title_is_not_an_entry() {
        let videos = parse_feed(SAMPLE_FEED).unwrap();
        assert!(videos.iter().all(|v| v.title != "Channel Title"));
    }

    #[test]
    fn test_into_record_has_no_view_count() {
        let videos = parse_feed(SAMPLE_FEED).unwrap();
        let record = videos.into_iter().next().unwrap().into_record();
        assert_eq!(record.view_count, None);
        assert_eq!(record.video_id, "abc123");
    }

    #[test]
    fn test_parse_feed_empty_document() {
        let videos = parse_feed("<feed></feed>").unwrap();
        assert!(videos.is_empty());
    }

    #[test]
    fn test_feed_url_encodes_channel() {
        assert_eq!(
            feed_url("UC abc"),
            "https://www.youtube.com/feeds/videos.xml?channel_id=UC%20abc"
        );
    }
}
