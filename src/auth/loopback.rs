//! Single-use HTTP listener on 127.0.0.1 that receives the OAuth redirect.

use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

use super::AuthError;

/// How long in-flight responses get to finish once the code has arrived.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const SUCCESS_PAGE: &str = "<!doctype html><html><body>\
<h3>Signed in.</h3><p>You can close this tab and return to tubesearch.</p>\
</body></html>";

const FAILURE_PAGE: &str = "<!doctype html><html><body>\
<h3>Sign-in did not complete.</h3><p>Return to tubesearch for details.</p>\
</body></html>";

pub struct LoopbackListener {
    listener: TcpListener,
    redirect_uri: String,
}

/// What a request to the listener turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum Redirect {
    Code(String),
    /// Browsers also ask for `/favicon.ico` and the like.
    Unrelated,
}

#[derive(Clone)]
struct RedirectState {
    expected_state: String,
    outcome: mpsc::Sender<Result<String, AuthError>>,
}

impl LoopbackListener {
    pub async fn bind() -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        Ok(Self {
            listener,
            redirect_uri: format!("http://127.0.0.1:{port}"),
        })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Serve until the redirect carrying `expected_state` arrives and return
    /// its code. Connections are handled concurrently, so an idle browser
    /// connection does not hold up the real redirect.
    pub async fn accept_code(
        self,
        expected_state: &str,
        timeout: Duration,
    ) -> Result<String, AuthError> {
        let (outcome_tx, mut outcome_rx) = mpsc::channel(1);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let app = Router::new()
            .route("/", get(redirect_handler))
            .with_state(RedirectState {
                expected_state: expected_state.to_string(),
                outcome: outcome_tx,
            });

        let mut server = tokio::spawn(async move {
            let shutdown = async {
                let _ = stop_rx.await;
            };
            if let Err(e) = axum::serve(self.listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::debug!(error = %e, "redirect listener stopped");
            }
        });

        let outcome = tokio::time::timeout(timeout, outcome_rx.recv()).await;
        let _ = stop_tx.send(());
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await;
        server.abort();

        match outcome {
            Ok(Some(result)) => result,
            Ok(None) => Err(AuthError::Io(std::io::Error::other(
                "redirect listener stopped before sign-in completed",
            ))),
            Err(_) => Err(AuthError::Timeout(timeout.as_secs())),
        }
    }
}

async fn redirect_handler(State(state): State<RedirectState>, uri: Uri) -> Response {
    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
    tracing::debug!(path = uri.path(), "redirect request");
    match parse_redirect(target, &state.expected_state) {
        Ok(Redirect::Code(code)) => {
            let _ = state.outcome.try_send(Ok(code));
            (StatusCode::OK, Html(SUCCESS_PAGE)).into_response()
        }
        Ok(Redirect::Unrelated) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            let _ = state.outcome.try_send(Err(e));
            (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE)).into_response()
        }
    }
}

/// Interpret the request target (`/?code=...&state=...`) of a redirect.
pub fn parse_redirect(target: &str, expected_state: &str) -> Result<Redirect, AuthError> {
    let url = Url::parse(&format!("http://127.0.0.1{target}"))
        .map_err(|e| AuthError::MalformedRedirect(e.to_string()))?;
    if url.path() != "/" {
        return Ok(Redirect::Unrelated);
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() && state.is_none() {
        return Ok(Redirect::Unrelated);
    }
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }
    if let Some(error) = error {
        return Err(AuthError::Denied(error));
    }
    code.map(Redirect::Code).ok_or(AuthError::MissingCode)
}
