//! View state for the search screen.
//!
//! Background work (sign-in, search calls) runs in spawned tasks that report
//! back over oneshot channels; [`App::check_pending`] polls them once per
//! frame so all state changes happen on the view loop.

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::auth::{AccessToken, AuthError};
use crate::model::{ResultItem, SearchPage, SearchParams, watch_url};
use crate::ready::Readiness;
use crate::search::{ApiClient, ApiError, SearchBackend, SearchQuery};
use crate::ui::form::FormField;

/// Blocking modal shown over the view until dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// Sign-in was requested before the identity client finished loading.
    IdentityNotReady,
    /// The identity client could not be initialized at all.
    IdentityUnavailable,
    /// A search was submitted without an access token.
    AuthorizationRequired,
}

impl Alert {
    pub fn title(self) -> &'static str {
        match self {
            Alert::IdentityNotReady => "Not ready",
            Alert::IdentityUnavailable => "Sign-in unavailable",
            Alert::AuthorizationRequired => "Sign in required",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Alert::IdentityNotReady => {
                "Google sign-in is still loading. Try again in a moment."
            }
            Alert::IdentityUnavailable => {
                "Google sign-in failed to initialize. See the log for details."
            }
            Alert::AuthorizationRequired => {
                "Sign in with Google before searching. Enter signs in, Esc dismisses."
            }
        }
    }
}

/// What a search request turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Started,
    /// A search is already in flight.
    Busy,
    ApiNotReady,
    NeedsAuthorization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Form(FormField),
    Results,
}

/// Enabled state of the two pagination buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerState {
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

struct PendingSearch {
    query: SearchQuery,
    rx: oneshot::Receiver<Result<SearchPage, ApiError>>,
}

#[derive(Default)]
struct AsyncTasks {
    search: Option<PendingSearch>,
    auth_rx: Option<oneshot::Receiver<Result<AccessToken, AuthError>>>,
}

pub struct App<B: SearchBackend = ApiClient> {
    pub params: SearchParams,
    pub focus: Focus,
    pub page: SearchPage,
    /// Query that produced `page`; its cursors are only valid against it.
    pub current_query: Option<SearchQuery>,
    pub selected: usize,
    /// Card columns at the last render, for up/down navigation.
    pub grid_columns: usize,
    pub alert: Option<Alert>,
    pub status: Option<String>,
    pub should_quit: bool,
    token: Option<AccessToken>,
    readiness: Readiness<B>,
    tasks: AsyncTasks,
    clock: fn() -> DateTime<Utc>,
}

impl<B: SearchBackend> App<B> {
    pub fn new(params: SearchParams, readiness: Readiness<B>) -> Self {
        Self {
            params,
            focus: Focus::Form(FormField::Term),
            page: SearchPage::default(),
            current_query: None,
            selected: 0,
            grid_columns: 1,
            alert: None,
            status: None,
            should_quit: false,
            token: None,
            readiness,
            tasks: AsyncTasks::default(),
            clock: Utc::now,
        }
    }

    /// Replace the wall clock (used to translate the recency filter).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn readiness(&self) -> &Readiness<B> {
        &self.readiness
    }

    pub fn is_busy(&self) -> bool {
        self.tasks.search.is_some()
    }

    pub fn is_authorizing(&self) -> bool {
        self.tasks.auth_rx.is_some()
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    pub fn has_valid_token(&self) -> bool {
        let now = (self.clock)();
        self.token.as_ref().is_some_and(|t| !t.is_expired(now))
    }

    pub fn pager(&self) -> PagerState {
        PagerState {
            prev_enabled: self.page.prev_page_token.is_some(),
            next_enabled: self.page.next_page_token.is_some(),
        }
    }

    pub fn selected_item(&self) -> Option<&ResultItem> {
        self.page.items.get(self.selected)
    }

    // -------------------------------------------------------------------------
    // Authorization
    // -------------------------------------------------------------------------

    /// Ask the identity client for an access token.
    pub fn authorize(&mut self) {
        if self.is_authorizing() {
            return;
        }
        let Some(identity) = self.readiness.identity.get() else {
            self.alert = Some(if self.readiness.identity.is_abandoned() {
                Alert::IdentityUnavailable
            } else {
                Alert::IdentityNotReady
            });
            return;
        };

        tracing::info!("authorization requested");
        self.status = Some("Waiting for Google sign-in in your browser…".to_string());
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(identity.request_access_token().await);
        });
        self.tasks.auth_rx = Some(rx);
    }

    fn finish_authorization(&mut self, result: Result<AccessToken, AuthError>) {
        match result {
            Ok(token) => {
                let until = token.expires_at.with_timezone(&chrono::Local);
                self.status = Some(format!("Signed in until {}", until.format("%H:%M")));
                self.token = Some(token);
            }
            Err(e) => {
                tracing::error!(error = %e, "authorization failed");
                self.status = Some(format!("Sign-in failed: {e}"));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Searching
    // -------------------------------------------------------------------------

    /// Submit the form as a new query.
    pub fn trigger_search(&mut self) -> Dispatch {
        let query = SearchQuery::from_params(&self.params, (self.clock)());
        self.dispatch(query)
    }

    pub fn next_page(&mut self) -> Option<Dispatch> {
        let token = self.page.next_page_token.clone()?;
        let query = self.current_query.as_ref()?.with_page_token(token);
        Some(self.dispatch(query))
    }

    pub fn prev_page(&mut self) -> Option<Dispatch> {
        let token = self.page.prev_page_token.clone()?;
        let query = self.current_query.as_ref()?.with_page_token(token);
        Some(self.dispatch(query))
    }

    fn dispatch(&mut self, query: SearchQuery) -> Dispatch {
        if self.is_busy() {
            return Dispatch::Busy;
        }
        let Some(backend) = self.readiness.api.get() else {
            let status = if self.readiness.api.is_abandoned() {
                "API client failed to initialize (see log)"
            } else {
                "API client is still loading"
            };
            self.status = Some(status.to_string());
            return Dispatch::ApiNotReady;
        };
        let token = match &self.token {
            Some(token) if !token.is_expired((self.clock)()) => token.clone(),
            _ => {
                self.alert = Some(Alert::AuthorizationRequired);
                return Dispatch::NeedsAuthorization;
            }
        };

        tracing::info!(term = %query.term, page = ?query.page_token, "search triggered");
        self.status = Some(format!("Searching '{}'…", query.term));
        let (tx, rx) = oneshot::channel();
        let task_query = query.clone();
        tokio::spawn(async move {
            let _ = tx.send(backend.search(&token, &task_query).await);
        });
        self.tasks.search = Some(PendingSearch { query, rx });
        Dispatch::Started
    }

    /// Apply a completed search. Failures are logged and leave the current
    /// page untouched.
    fn finish_search(&mut self, query: SearchQuery, result: Result<SearchPage, ApiError>) {
        self.status = None;
        match result {
            Ok(page) => {
                self.status = Some(match page.items.len() {
                    0 => "No results".to_string(),
                    1 => "1 result".to_string(),
                    n => format!("{n} results"),
                });
                self.page = page;
                self.current_query = Some(query);
                self.selected = 0;
            }
            Err(e) => {
                tracing::error!(error = %e, term = %query.term, "search failed");
            }
        }
    }

    /// Poll background tasks without blocking.
    pub fn check_pending(&mut self) {
        if let Some(mut pending) = self.tasks.search.take() {
            match pending.rx.try_recv() {
                Ok(result) => self.finish_search(pending.query, result),
                Err(oneshot::error::TryRecvError::Empty) => self.tasks.search = Some(pending),
                Err(oneshot::error::TryRecvError::Closed) => {
                    tracing::error!("search task ended without a result");
                    self.status = None;
                }
            }
        }

        if let Some(mut rx) = self.tasks.auth_rx.take() {
            match rx.try_recv() {
                Ok(result) => self.finish_authorization(result),
                Err(oneshot::error::TryRecvError::Empty) => self.tasks.auth_rx = Some(rx),
                Err(oneshot::error::TryRecvError::Closed) => {
                    tracing::error!("authorization task ended without a result");
                    self.status = Some("Sign-in failed.".to_string());
                }
            }
        }
    }

    /// Wait for every in-flight task and apply its result.
    pub async fn settle(&mut self) {
        if let Some(pending) = self.tasks.search.take() {
            match pending.rx.await {
                Ok(result) => self.finish_search(pending.query, result),
                Err(_) => tracing::error!("search task ended without a result"),
            }
        }
        if let Some(rx) = self.tasks.auth_rx.take()
            && let Ok(result) = rx.await
        {
            self.finish_authorization(result);
        }
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Form(field) if field.is_last() && !self.page.items.is_empty() => Focus::Results,
            Focus::Form(field) => Focus::Form(field.next()),
            Focus::Results => Focus::Form(FormField::Term),
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focus::Form(FormField::Term) if !self.page.items.is_empty() => Focus::Results,
            Focus::Form(field) => Focus::Form(field.prev()),
            Focus::Results => Focus::Form(FormField::Recency),
        };
    }

    /// Move the card selection by `delta`, clamped to the page.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.page.items.len();
        if len == 0 {
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn move_selection_rows(&mut self, rows: isize) {
        self.move_selection(rows * self.grid_columns.max(1) as isize);
    }

    /// Open the selected card in the browser.
    pub fn open_selected(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let url = watch_url(item);
        if url == "#" {
            return;
        }
        if let Err(e) = open::that_detached(&url) {
            tracing::warn!(error = %e, %url, "failed to open browser");
            self.status = Some(format!("Open {url}"));
        }
    }

    /// Tear down: stop client initialization that is still running.
    pub fn shutdown(&mut self) {
        self.readiness.shutdown();
    }
}

/// Test double for the search endpoint.
#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub enum Scripted {
        Page(SearchPage),
        Fail,
    }

    pub struct FakeBackend {
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<SearchQuery>>,
        pub script: Mutex<Vec<Scripted>>,
    }

    impl FakeBackend {
        pub fn new(script: Vec<Scripted>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                script: Mutex::new(script),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SearchBackend for FakeBackend {
        async fn search(
            &self,
            _token: &AccessToken,
            query: &SearchQuery,
        ) -> Result<SearchPage, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(query.clone());
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.is_empty() {
                    Scripted::Fail
                } else {
                    script.remove(0)
                }
            };
            match next {
                Scripted::Page(page) => Ok(page),
                Scripted::Fail => Err(ApiError::Http {
                    status: 403,
                    message: "quotaExceeded".into(),
                }),
            }
        }
    }
}
