use serde::{Deserialize, Deserializer, Serialize};

use super::VideoId;

/// Placeholder shown when a record carries neither a description nor a title
pub const NO_DESCRIPTION: &str = "No description";

/// One entry of the video feed as delivered by the feed API.
///
/// Stream locations are optional: the upstream sends `null` or an empty
/// string when a transport is unavailable, both of which become `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,

    #[serde(rename = "m3u8", default, deserialize_with = "empty_as_none")]
    pub adaptive_stream_url: Option<String>,

    #[serde(rename = "mp4", default, deserialize_with = "empty_as_none")]
    pub progressive_stream_url: Option<String>,

    #[serde(rename = "image")]
    pub poster_url: String,

    #[serde(rename = "title_en", default)]
    pub title: Option<String>,

    #[serde(rename = "description_en", default)]
    pub description: Option<String>,

    /// Duration in seconds as advertised by the API, if any
    #[serde(default)]
    pub duration: Option<f64>,
}

impl VideoRecord {
    pub fn new(id: impl Into<VideoId>, poster_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            adaptive_stream_url: None,
            progressive_stream_url: None,
            poster_url: poster_url.into(),
            title: None,
            description: None,
            duration: None,
        }
    }

    pub fn with_adaptive(mut self, url: impl Into<String>) -> Self {
        self.adaptive_stream_url = Some(url.into());
        self
    }

    pub fn with_progressive(mut self, url: impl Into<String>) -> Self {
        self.progressive_stream_url = Some(url.into());
        self
    }

    pub fn with_text(mut self, title: Option<&str>, description: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self.description = description.map(str::to_string);
        self
    }

    /// A record with no stream location at all can never play
    pub fn is_playable(&self) -> bool {
        self.adaptive_stream_url.is_some() || self.progressive_stream_url.is_some()
    }

    /// Text for the description overlay: description, then title, then a placeholder
    pub fn display_text(&self) -> &str {
        [self.description.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
            .unwrap_or(NO_DESCRIPTION)
    }
}

/// A page of records returned by the feed API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub total: u64,
    pub data: Vec<VideoRecord>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
