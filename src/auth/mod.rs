//! Google sign-in.
//!
//! Implements the OAuth 2.0 installed-app flow: the browser is sent to
//! Google's consent page, Google redirects back to a loopback listener with
//! an authorization code, and the code (plus the PKCE verifier) is exchanged
//! for a short-lived access token.
//!
//! ```rust,ignore
//! let identity = IdentityClient::init(&config).await?;
//! let token = identity.request_access_token().await?;
//! ```

pub mod loopback;
pub mod pkce;

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;
use loopback::LoopbackListener;

/// Read-only access is all searching needs.
pub const SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const FALLBACK_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const FALLBACK_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(300);

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Google sign-in is still loading, try again in a moment")]
    NotReady,

    #[error("sign-in was refused: {0}")]
    Denied(String),

    #[error("redirect state did not match this sign-in attempt")]
    StateMismatch,

    #[error("redirect carried no authorization code")]
    MissingCode,

    #[error("malformed redirect: {0}")]
    MalformedRedirect(String),

    #[error("no sign-in redirect received within {0} seconds")]
    Timeout(u64),

    #[error("token endpoint returned HTTP {status}: {message}")]
    TokenEndpoint { status: u16, message: String },

    #[error("system random generator failed")]
    Random,

    #[error("invalid authorization endpoint: {0}")]
    Endpoint(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bearer credential for the search endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// A token obtained elsewhere; Google tokens live for an hour.
    pub fn external(secret: impl Into<String>) -> Self {
        Self::new(secret, Utc::now() + chrono::Duration::hours(1))
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Discovery {
    authorization_endpoint: String,
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Sign-in client bound to one OAuth client id.
pub struct IdentityClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    auth_endpoint: String,
    token_endpoint: String,
}

/// A started sign-in: the consent URL is known, the redirect is pending.
pub struct PendingAuthorization<'a> {
    client: &'a IdentityClient,
    listener: LoopbackListener,
    url: String,
    state: String,
    verifier: String,
}

impl IdentityClient {
    /// Resolve Google's endpoints and bind the configured client id.
    ///
    /// Falls back to the well-known endpoints when discovery is unreachable;
    /// the network is needed again at sign-in anyway.
    pub async fn init(config: &Config) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let (auth_endpoint, token_endpoint) = match fetch_discovery(&http).await {
            Ok(d) => (d.authorization_endpoint, d.token_endpoint),
            Err(e) => {
                tracing::warn!(error = %e, "OpenID discovery failed, using default endpoints");
                (
                    FALLBACK_AUTH_ENDPOINT.to_string(),
                    FALLBACK_TOKEN_ENDPOINT.to_string(),
                )
            }
        };
        tracing::debug!(%auth_endpoint, %token_endpoint, "identity client initialized");
        Ok(Self::with_endpoints(config, http, auth_endpoint, token_endpoint))
    }

    pub fn with_endpoints(
        config: &Config,
        http: reqwest::Client,
        auth_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_endpoint: auth_endpoint.into(),
            token_endpoint: token_endpoint.into(),
        }
    }

    /// Consent-page URL for one sign-in attempt.
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        challenge: &str,
    ) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.auth_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("state", state),
                ("code_challenge", challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| AuthError::Endpoint(e.to_string()))?;
        Ok(url.into())
    }

    /// Bind the loopback listener and prepare the consent URL.
    pub async fn begin(&self) -> Result<PendingAuthorization<'_>, AuthError> {
        let listener = LoopbackListener::bind().await?;
        let verifier = pkce::code_verifier()?;
        let state = pkce::random_token(16)?;
        let url = self.authorization_url(
            listener.redirect_uri(),
            &state,
            &pkce::code_challenge(&verifier),
        )?;
        Ok(PendingAuthorization {
            client: self,
            listener,
            url,
            state,
            verifier,
        })
    }

    /// Full sign-in: open the browser, wait for the redirect, exchange the code.
    pub async fn request_access_token(&self) -> Result<AccessToken, AuthError> {
        let pending = self.begin().await?;
        if let Err(e) = open::that_detached(pending.url()) {
            tracing::warn!(
                error = %e,
                url = pending.url(),
                "could not open browser; visit the URL manually"
            );
        }
        pending.finish().await
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, AuthError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self.http.post(&self.token_endpoint).form(&form).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(token_error(status.as_u16(), &body));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::TokenEndpoint {
                status: status.as_u16(),
                message: format!("unreadable token response: {e}"),
            })?;
        let expires_at =
            expiry_after(Utc::now(), token.expires_in).ok_or_else(|| AuthError::TokenEndpoint {
                status: status.as_u16(),
                message: format!("unusable expires_in: {}", token.expires_in),
            })?;
        tracing::info!(expires_in = token.expires_in, "access token granted");
        Ok(AccessToken::new(token.access_token, expires_at))
    }
}

impl PendingAuthorization<'_> {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn finish(self) -> Result<AccessToken, AuthError> {
        let redirect_uri = self.listener.redirect_uri().to_string();
        let code = self
            .listener
            .accept_code(&self.state, REDIRECT_TIMEOUT)
            .await?;
        self.client
            .exchange_code(&code, &self.verifier, &redirect_uri)
            .await
    }
}

async fn fetch_discovery(http: &reqwest::Client) -> Result<Discovery, reqwest::Error> {
    http.get(DISCOVERY_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// `now + expires_in` seconds, or `None` when that is not representable.
fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    chrono::TimeDelta::try_seconds(expires_in).and_then(|ttl| now.checked_add_signed(ttl))
}

fn token_error(status: u16, body: &str) -> AuthError {
    let message = match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(desc) => format!("{}: {desc}", err.error),
            None => err.error,
        },
        Err(_) => body.chars().take(200).collect(),
    };
    AuthError::TokenEndpoint { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::load_with(None, |key| match key {
            crate::config::ENV_API_KEY => Some("key".into()),
            crate::config::ENV_CLIENT_ID => Some("client-123.apps.googleusercontent.com".into()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn authorization_url_carries_pkce_and_scope() {
        let client = IdentityClient::with_endpoints(
            &config(),
            reqwest::Client::new(),
            FALLBACK_AUTH_ENDPOINT,
            FALLBACK_TOKEN_ENDPOINT,
        );
        let url = client
            .authorization_url("http://127.0.0.1:4567", "st", "chal")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with(FALLBACK_AUTH_ENDPOINT));
        assert_eq!(pairs["client_id"], "client-123.apps.googleusercontent.com");
        assert_eq!(pairs["redirect_uri"], "http://127.0.0.1:4567");
        assert_eq!(pairs["scope"], SCOPE);
        assert_eq!(pairs["state"], "st");
        assert_eq!(pairs["code_challenge"], "chal");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["response_type"], "code");
    }

    #[test]
    fn token_expiry_has_margin() {
        let now = Utc::now();
        assert!(!AccessToken::new("t", now + chrono::Duration::minutes(10)).is_expired(now));
        assert!(AccessToken::new("t", now + chrono::Duration::seconds(10)).is_expired(now));
        assert!(AccessToken::new("t", now - chrono::Duration::seconds(1)).is_expired(now));
    }

    #[test]
    fn expiry_rejects_out_of_range_lifetimes() {
        let now = Utc::now();
        assert_eq!(
            expiry_after(now, 3600),
            Some(now + chrono::Duration::hours(1))
        );
        assert_eq!(expiry_after(now, i64::MAX), None);
        assert_eq!(expiry_after(now, i64::MAX / 1000), None);
    }

    #[test]
    fn debug_redacts_secret() {
        let token = AccessToken::external("ya29.very-secret");
        let dbg = format!("{token:?}");
        assert!(!dbg.contains("very-secret"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn token_error_uses_description() {
        let err = token_error(
            400,
            r#"{"error":"invalid_grant","error_description":"Bad Request"}"#,
        );
        assert_eq!(
            err.to_string(),
            "token endpoint returned HTTP 400: invalid_grant: Bad Request"
        );
    }

    #[test]
    fn not_ready_message() {
        assert!(AuthError::NotReady.to_string().contains("still loading"));
    }
}
