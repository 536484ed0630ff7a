//! One-shot readiness signals for the two clients the view depends on.
//!
//! Each client is initialized by a background task that owns a
//! [`ReadyResolver`]. Anything that needs the client holds a cloneable
//! [`ReadySignal`] and either checks it without blocking (the view, once per
//! frame) or awaits it (the CLI).

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::IdentityClient;
use crate::search::ApiClient;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadyError {
    #[error("{0} failed to initialize")]
    Abandoned(&'static str),
}

/// Where a signal stands, checked without blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Pending,
    Ready,
    /// The resolver went away without a value; initialization failed.
    Failed,
}

/// Write half. Resolving consumes it, so a signal resolves at most once.
pub struct ReadyResolver<T> {
    name: &'static str,
    tx: watch::Sender<Option<Arc<T>>>,
}

/// Read half.
pub struct ReadySignal<T> {
    name: &'static str,
    rx: watch::Receiver<Option<Arc<T>>>,
}

impl<T> Clone for ReadySignal<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            rx: self.rx.clone(),
        }
    }
}

impl<T> ReadySignal<T> {
    pub fn new(name: &'static str) -> (ReadyResolver<T>, ReadySignal<T>) {
        let (tx, rx) = watch::channel(None);
        (ReadyResolver { name, tx }, ReadySignal { name, rx })
    }

    /// An already-resolved signal.
    pub fn ready(name: &'static str, value: T) -> Self {
        let (resolver, signal) = Self::new(name);
        resolver.resolve(value);
        signal
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.rx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// True once the resolver is gone without having resolved.
    pub fn is_abandoned(&self) -> bool {
        self.rx.borrow().is_none() && self.rx.has_changed().is_err()
    }

    pub fn state(&self) -> ReadyState {
        if self.is_ready() {
            ReadyState::Ready
        } else if self.is_abandoned() {
            ReadyState::Failed
        } else {
            ReadyState::Pending
        }
    }

    /// Wait until resolved. Fails if the resolver was dropped unresolved.
    pub async fn wait(&self) -> Result<Arc<T>, ReadyError> {
        let mut rx = self.rx.clone();
        let value = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| ReadyError::Abandoned(self.name))?;
        value.clone().ok_or(ReadyError::Abandoned(self.name))
    }
}

impl<T> ReadyResolver<T> {
    pub fn resolve(self, value: T) {
        tracing::debug!(client = self.name, "ready");
        // send_replace keeps the value even when no signal is listening yet.
        self.tx.send_replace(Some(Arc::new(value)));
    }
}

/// Readiness of both clients, plus the tasks initializing them.
pub struct Readiness<B = ApiClient> {
    pub identity: ReadySignal<IdentityClient>,
    pub api: ReadySignal<B>,
    tasks: Vec<JoinHandle<()>>,
}

impl<B> Readiness<B> {
    pub fn new(
        identity: ReadySignal<IdentityClient>,
        api: ReadySignal<B>,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            identity,
            api,
            tasks,
        }
    }

    pub fn both_ready(&self) -> bool {
        self.identity.is_ready() && self.api.is_ready()
    }

    /// Stop initialization that has not finished yet.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Readiness<ApiClient> {
    /// Spawn initialization of both clients from `config`.
    pub fn spawn(config: &crate::config::Config) -> Self {
        let (identity_resolver, identity) = ReadySignal::new("identity client");
        let (api_resolver, api) = ReadySignal::new("API client");

        let identity_cfg = config.clone();
        let identity_task = tokio::spawn(async move {
            match IdentityClient::init(&identity_cfg).await {
                Ok(client) => identity_resolver.resolve(client),
                Err(e) => tracing::error!(error = %e, "identity client init failed"),
            }
        });

        let api_cfg = config.clone();
        let api_task = tokio::spawn(async move {
            match ApiClient::init(&api_cfg).await {
                Ok(client) => api_resolver.resolve(client),
                Err(e) => tracing::error!(error = %e, "API client init failed"),
            }
        });

        Self::new(identity, api, vec![identity_task, api_task])
    }
}

impl<B> Drop for Readiness<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
