//! YouTube Data API v3 client for the `search` endpoint.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::query::SearchQuery;
use crate::auth::AccessToken;
use crate::config::Config;
use crate::model::{RawSearchResponse, SearchPage};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("search API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode search response: {0}")]
    Decode(String),

    #[error("discovery document unusable: {0}")]
    Discovery(String),
}

/// Anything that can run a search on the user's behalf.
pub trait SearchBackend: Send + Sync + 'static {
    fn search(
        &self,
        token: &AccessToken,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchPage, ApiError>> + Send;
}

pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.clone(),
        })
    }

    /// Build the client and load the v3 discovery document, checking that
    /// `search.list` is on offer before declaring the client ready.
    pub async fn init(config: &Config) -> Result<Self, ApiError> {
        let client = Self::new(config)?;
        let url = format!("{}/discovery/v1/apis/youtube/v3/rest", client.base_url);
        let doc: Value = client
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_discovery(&doc)?;
        tracing::debug!(base_url = %client.base_url, "API client initialized");
        Ok(client)
    }

    pub fn search_url(&self) -> String {
        format!("{}/youtube/v3/search", self.base_url)
    }
}

impl SearchBackend for ApiClient {
    async fn search(
        &self,
        token: &AccessToken,
        query: &SearchQuery,
    ) -> Result<SearchPage, ApiError> {
        let mut params = query.to_query_pairs();
        params.push(("key", self.api_key.clone()));

        tracing::debug!(term = %query.term, page = ?query.page_token, "search request");
        let response = self
            .http
            .get(self.search_url())
            .query(&params)
            .bearer_auth(token.secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(http_error(status.as_u16(), &body));
        }

        let raw: RawSearchResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::Decode(format!(
                "{e} (first 200 chars: {})",
                body.chars().take(200).collect::<String>()
            ))
        })?;
        let page = SearchPage::from(raw);
        tracing::info!(
            items = page.items.len(),
            has_next = page.next_page_token.is_some(),
            has_prev = page.prev_page_token.is_some(),
            "search completed"
        );
        Ok(page)
    }
}

fn check_discovery(doc: &Value) -> Result<(), ApiError> {
    if doc.pointer("/resources/search/methods/list").is_none() {
        return Err(ApiError::Discovery("search.list method missing".into()));
    }
    Ok(())
}

fn http_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    ApiError::Http { status, message }
}
