use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::model::{
    Choice, Order, Recency, ResultType, SearchParams, VideoDefinition, VideoDuration,
};

/// Field projection requested from the search endpoint.
pub const FIELD_PROJECTION: &str = "nextPageToken,prevPageToken,\
items(id,snippet(title,description,channelTitle,thumbnails(default/url,medium/url,high/url)))";

impl Recency {
    /// Lower bound on publication time, relative to `now`.
    pub fn published_after(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Recency::Any => None,
            Recency::Day => Some(now - Duration::days(1)),
            Recency::Week => Some(now - Duration::days(7)),
        }
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A submitted search, frozen at submit time.
///
/// Page tokens are only meaningful for the query that produced them, so
/// paging clones this snapshot rather than re-reading the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub max_results: u32,
    pub order: Order,
    pub result_type: ResultType,
    pub duration: VideoDuration,
    pub definition: VideoDefinition,
    pub region_code: String,
    pub published_after: Option<DateTime<Utc>>,
    pub page_token: Option<String>,
}

impl SearchQuery {
    pub fn from_params(params: &SearchParams, now: DateTime<Utc>) -> Self {
        Self {
            term: params.term.trim().to_string(),
            max_results: params.max_results,
            order: params.order,
            result_type: params.result_type,
            duration: params.duration,
            definition: params.definition,
            region_code: params.region_code.trim().to_string(),
            published_after: params.recency.published_after(now),
            page_token: None,
        }
    }

    pub fn with_page_token(&self, token: impl Into<String>) -> Self {
        Self {
            page_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Query-string pairs for `youtube/v3/search`, minus credentials.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("part", "snippet".to_string()),
            ("fields", FIELD_PROJECTION.to_string()),
            ("q", self.term.clone()),
            ("maxResults", self.max_results.to_string()),
            ("order", self.order.as_str().to_string()),
        ];
        if self.result_type != ResultType::Any {
            pairs.push(("type", self.result_type.as_str().to_string()));
        }
        if self.duration != VideoDuration::Any {
            pairs.push(("videoDuration", self.duration.as_str().to_string()));
        }
        if self.definition != VideoDefinition::Any {
            pairs.push(("videoDefinition", self.definition.as_str().to_string()));
        }
        if !self.region_code.is_empty() {
            pairs.push(("regionCode", self.region_code.clone()));
        }
        if let Some(ts) = self.published_after {
            pairs.push(("publishedAfter", format_timestamp(ts)));
        }
        if let Some(token) = &self.page_token {
            pairs.push(("pageToken", token.clone()));
        }
        pairs
    }
}
