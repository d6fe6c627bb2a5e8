//! Per-request query workers.
//!
//! `submit` returns at once. Each submission gets its own tokio task, which
//! posts exactly one [`UiEvent::QueryFinished`] followed by one
//! [`UiEvent::BusyCleared`], on every path including a panicking service.
//! Results from different submissions arrive in whatever order they finish.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::assistant::local::{LocalCommand, UrlOpener, system_opener};
use crate::assistant::retry::{RetryMachine, RetryPolicy, Sleeper, TokioSleeper};
use crate::assistant::types::{AiService, QueryError, QueryPayload, QueryRequest, QueryResult};
use crate::ui::{Poster, UiEvent, View};

/// Per-attempt timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawns one worker per submitted query.
pub struct QueryDispatcher<V: View> {
    ai: Arc<dyn AiService>,
    sleeper: Arc<dyn Sleeper>,
    opener: UrlOpener,
    policy: RetryPolicy,
    request_timeout: Duration,
    local_commands: bool,
    poster: Poster<V>,
    runtime: Handle,
}

impl<V: View> Clone for QueryDispatcher<V> {
    fn clone(&self) -> Self {
        Self {
            ai: Arc::clone(&self.ai),
            sleeper: Arc::clone(&self.sleeper),
            opener: Arc::clone(&self.opener),
            policy: self.policy,
            request_timeout: self.request_timeout,
            local_commands: self.local_commands,
            poster: self.poster.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<V: View> QueryDispatcher<V> {
    pub fn new(ai: Arc<dyn AiService>, poster: Poster<V>, runtime: Handle) -> Self {
        Self {
            ai,
            sleeper: Arc::new(TokioSleeper),
            opener: system_opener(),
            policy: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            local_commands: true,
            poster,
            runtime,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Toggle the `ram usage` / `cpu usage` / `search` shortcuts.
    pub fn with_local_commands(mut self, enabled: bool) -> Self {
        self.local_commands = enabled;
        self
    }

    pub fn with_url_opener(mut self, opener: UrlOpener) -> Self {
        self.opener = opener;
        self
    }

    /// Start a query. Returns its id, or `None` for blank input.
    ///
    /// Posts [`UiEvent::QueryStarted`] before the worker is spawned.
    pub fn submit(&self, text: &str) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let request = QueryRequest::new(text);
        let request_id = request.id;
        info!(%request_id, "query submitted");
        self.poster.emit(UiEvent::QueryStarted {
            request_id,
            text: request.text.clone(),
        });

        let worker = self.clone();
        self.runtime.spawn(async move { worker.run(request).await });
        Some(request_id)
    }

    async fn run(self, request: QueryRequest) {
        let request_id = request.id;
        let result = match AssertUnwindSafe(self.resolve(&request)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                error!(%request_id, "query worker panicked");
                QueryResult {
                    request_id,
                    payload: QueryPayload::Failure(QueryError::Other(
                        "query worker panicked".to_owned(),
                    )),
                    retries_used: 0,
                }
            }
        };
        info!(
            %request_id,
            success = result.is_success(),
            retries = result.retries_used,
            "query finished"
        );
        self.poster.emit(UiEvent::QueryFinished(result));
        self.poster.emit(UiEvent::BusyCleared { request_id });
    }

    /// Produce the terminal result for `request`.
    pub(crate) async fn resolve(&self, request: &QueryRequest) -> QueryResult {
        if self.local_commands
            && let Some(command) = LocalCommand::parse(&request.text)
        {
            debug!(request_id = %request.id, ?command, "answering locally");
            let payload = match command.execute(&self.opener).await {
                Ok(text) => QueryPayload::Success(text),
                Err(e) => QueryPayload::Failure(e),
            };
            return QueryResult {
                request_id: request.id,
                payload,
                retries_used: 0,
            };
        }

        let mut machine = RetryMachine::new(self.policy);
        machine.start();
        let payload = loop {
            let outcome =
                match tokio::time::timeout(self.request_timeout, self.ai.query(&request.text))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(QueryError::Timeout),
                };

            match outcome {
                Ok(response) => {
                    machine.on_success();
                    break QueryPayload::Success(response.into_text());
                }
                Err(error) => match machine.on_failure(error.is_retryable()) {
                    Some(backoff) => {
                        warn!(
                            request_id = %request.id,
                            backoff_secs = backoff.as_secs_f64(),
                            "rate limited; backing off"
                        );
                        self.sleeper.sleep(backoff).await;
                        machine.resume();
                    }
                    None => break QueryPayload::Failure(error),
                },
            }
        };

        QueryResult {
            request_id: request.id,
            payload,
            retries_used: machine.retries_used(),
        }
    }
}
