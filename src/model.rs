//! Search parameters and result records.
//!
//! Both records live only for the lifetime of one session: `SearchParams` is
//! edited in place by the form, `SearchPage` is replaced wholesale on every
//! successful search.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sort order accepted by the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Order {
    #[default]
    Relevance,
    Date,
    Rating,
    Title,
    #[value(name = "viewCount")]
    ViewCount,
    #[value(name = "videoCount")]
    VideoCount,
}

/// Result-type filter. `Any` leaves the filter off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Any,
    #[default]
    Video,
    Channel,
    Playlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoDuration {
    #[default]
    Any,
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoDefinition {
    #[default]
    Any,
    High,
    Standard,
}

/// Symbolic recency filter, translated to an absolute timestamp when a
/// query is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    #[default]
    Any,
    Day,
    Week,
}

/// Wire values, in the order the form cycles through them.
pub trait Choice: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl Choice for Order {
    const ALL: &'static [Self] = &[
        Order::Relevance,
        Order::Date,
        Order::Rating,
        Order::Title,
        Order::ViewCount,
        Order::VideoCount,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Order::Relevance => "relevance",
            Order::Date => "date",
            Order::Rating => "rating",
            Order::Title => "title",
            Order::ViewCount => "viewCount",
            Order::VideoCount => "videoCount",
        }
    }
}

impl Choice for ResultType {
    const ALL: &'static [Self] = &[
        ResultType::Any,
        ResultType::Video,
        ResultType::Channel,
        ResultType::Playlist,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ResultType::Any => "any",
            ResultType::Video => "video",
            ResultType::Channel => "channel",
            ResultType::Playlist => "playlist",
        }
    }
}

impl Choice for VideoDuration {
    const ALL: &'static [Self] = &[
        VideoDuration::Any,
        VideoDuration::Short,
        VideoDuration::Medium,
        VideoDuration::Long,
    ];

    fn as_str(self) -> &'static str {
        match self {
            VideoDuration::Any => "any",
            VideoDuration::Short => "short",
            VideoDuration::Medium => "medium",
            VideoDuration::Long => "long",
        }
    }
}

impl Choice for VideoDefinition {
    const ALL: &'static [Self] = &[
        VideoDefinition::Any,
        VideoDefinition::High,
        VideoDefinition::Standard,
    ];

    fn as_str(self) -> &'static str {
        match self {
            VideoDefinition::Any => "any",
            VideoDefinition::High => "high",
            VideoDefinition::Standard => "standard",
        }
    }
}

impl Choice for Recency {
    const ALL: &'static [Self] = &[Recency::Any, Recency::Day, Recency::Week];

    fn as_str(self) -> &'static str {
        match self {
            Recency::Any => "any",
            Recency::Day => "day",
            Recency::Week => "week",
        }
    }
}

/// Form state. No validation beyond what the search endpoint enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub term: String,
    pub max_results: u32,
    pub order: Order,
    pub result_type: ResultType,
    pub duration: VideoDuration,
    pub definition: VideoDefinition,
    pub region_code: String,
    pub recency: Recency,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            term: String::new(),
            max_results: 12,
            order: Order::default(),
            result_type: ResultType::default(),
            duration: VideoDuration::default(),
            definition: VideoDefinition::default(),
            region_code: "US".into(),
            recency: Recency::default(),
        }
    }
}

/// Identifier of a result item; the kind decides where it links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ResultId {
    Video(String),
    Channel(String),
    Playlist(String),
}

impl ResultId {
    pub fn kind_label(&self) -> &'static str {
        match self {
            ResultId::Video(_) => "video",
            ResultId::Channel(_) => "channel",
            ResultId::Playlist(_) => "playlist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub id: Option<ResultId>,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub channel_title: String,
}

/// One page of results plus the cursors around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub items: Vec<ResultItem>,
    pub next_page_token: Option<String>,
    pub prev_page_token: Option<String>,
}

/// Destination URL for a result item, `"#"` when it has no identifier.
pub fn watch_url(item: &ResultItem) -> String {
    match &item.id {
        Some(ResultId::Video(id)) => format!("https://www.youtube.com/watch?v={id}"),
        Some(ResultId::Playlist(id)) => format!("https://www.youtube.com/playlist?list={id}"),
        Some(ResultId::Channel(id)) => format!("https://www.youtube.com/channel/{id}"),
        None => "#".to_string(),
    }
}

// -----------------------------------------------------------------------------
// Wire format of `youtube/v3/search`
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSearchResponse {
    #[serde(default)]
    items: Vec<RawItem>,
    next_page_token: Option<String>,
    prev_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: Option<RawId>,
    snippet: Option<RawSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawId {
    #[serde(default)]
    kind: String,
    video_id: Option<String>,
    channel_id: Option<String>,
    playlist_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: RawThumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct RawThumbnails {
    default: Option<RawThumbnail>,
    medium: Option<RawThumbnail>,
    high: Option<RawThumbnail>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: String,
}

impl RawId {
    fn into_result_id(self) -> Option<ResultId> {
        match self.kind.as_str() {
            "youtube#video" => self.video_id.map(ResultId::Video),
            "youtube#channel" => self.channel_id.map(ResultId::Channel),
            "youtube#playlist" => self.playlist_id.map(ResultId::Playlist),
            _ => None,
        }
    }
}

impl From<RawSearchResponse> for SearchPage {
    fn from(raw: RawSearchResponse) -> Self {
        let items = raw
            .items
            .into_iter()
            .map(|item| {
                let snippet = item.snippet.unwrap_or_default();
                let thumbs = snippet.thumbnails;
                let thumbnail_url = thumbs
                    .medium
                    .or(thumbs.default)
                    .or(thumbs.high)
                    .map(|t| t.url);
                ResultItem {
                    id: item.id.and_then(RawId::into_result_id),
                    title: decode_entities(&snippet.title),
                    description: decode_entities(&snippet.description),
                    thumbnail_url,
                    channel_title: decode_entities(&snippet.channel_title),
                }
            })
            .collect();

        SearchPage {
            items,
            next_page_token: raw.next_page_token,
            prev_page_token: raw.prev_page_token,
        }
    }
}

/// The API HTML-escapes snippet text.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: Option<ResultId>) -> ResultItem {
        ResultItem {
            id,
            title: "t".into(),
            description: String::new(),
            thumbnail_url: None,
            channel_title: "c".into(),
        }
    }

    #[test]
    fn watch_url_per_kind() {
        assert_eq!(
            watch_url(&item(Some(ResultId::Video("dQw4w9WgXcQ".into())))),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(
            watch_url(&item(Some(ResultId::Playlist("PL123".into())))),
            "https://www.youtube.com/playlist?list=PL123"
        );
        assert_eq!(
            watch_url(&item(Some(ResultId::Channel("UCabc".into())))),
            "https://www.youtube.com/channel/UCabc"
        );
    }

    #[test]
    fn watch_url_without_id_is_hash() {
        assert_eq!(watch_url(&item(None)), "#");
    }

    #[test]
    fn decodes_search_response() {
        let body = r#"{
            "kind": "youtube#searchListResponse",
            "nextPageToken": "CAUQAA",
            "prevPageToken": "CAUQAQ",
            "items": [
                {
                    "id": {"kind": "youtube#video", "videoId": "abc"},
                    "snippet": {
                        "title": "Rock &amp; Roll &#39;live&#39;",
                        "description": "desc",
                        "channelTitle": "Chan",
                        "thumbnails": {
                            "default": {"url": "https://i.ytimg.com/d.jpg"},
                            "medium": {"url": "https://i.ytimg.com/m.jpg"}
                        }
                    }
                },
                {
                    "id": {"kind": "youtube#channel", "channelId": "UC1"},
                    "snippet": {"title": "A channel", "channelTitle": "A channel"}
                },
                {
                    "id": {"kind": "youtube#somethingElse"},
                    "snippet": {"title": "odd"}
                }
            ]
        }"#;
        let raw: RawSearchResponse = serde_json::from_str(body).unwrap();
        let page = SearchPage::from(raw);

        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        assert_eq!(page.prev_page_token.as_deref(), Some("CAUQAQ"));
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].id, Some(ResultId::Video("abc".into())));
        assert_eq!(page.items[0].title, "Rock & Roll 'live'");
        assert_eq!(
            page.items[0].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/m.jpg")
        );
        assert_eq!(page.items[1].id, Some(ResultId::Channel("UC1".into())));
        assert_eq!(page.items[1].thumbnail_url, None);
        assert_eq!(page.items[2].id, None);
    }

    #[test]
    fn decodes_first_page_without_prev_token() {
        let raw: RawSearchResponse =
            serde_json::from_str(r#"{"items": [], "nextPageToken": "N"}"#).unwrap();
        let page = SearchPage::from(raw);
        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token.as_deref(), Some("N"));
        assert!(page.prev_page_token.is_none());
    }

    #[test]
    fn choices_cycle_both_ways() {
        assert_eq!(Order::VideoCount.next(), Order::Relevance);
        assert_eq!(Order::Relevance.prev(), Order::VideoCount);
        assert_eq!(Recency::Any.next(), Recency::Day);
        assert_eq!(ResultType::Video.as_str(), "video");
    }

    #[test]
    fn order_serializes_as_wire_value() {
        assert_eq!(
            serde_json::to_string(&Order::ViewCount).unwrap(),
            "\"viewCount\""
        );
    }
}
