//! Pooled Postgres access with availability tracking and back-off.
//!
//! Every statement the crate issues goes through [`Store::run`], which gates
//! on the availability flag, wraps the query in a `db.query` tracing span,
//! and times it. When a connection-level failure is observed the store is
//! marked unavailable and further queries fast-fail until the back-off
//! window has elapsed; the next attempt after the window either clears the
//! flag or re-arms it.

use parking_lot::Mutex;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgQueryResult, PgRow};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info_span, Instrument};

use crate::config::StoreConfig;

/// How long connection attempts stay suppressed after a failure.
const BACKOFF_WINDOW: Duration = Duration::from_secs(30);

/// Statement preview length used in query logs.
const STATEMENT_PREVIEW_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The back-off window is open; no query was attempted.
    #[error("store unavailable, suppressing queries until back-off elapses")]
    Unavailable,
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Best-effort availability hint shared by all requests.
///
/// Races only affect whether a request fast-fails or attempts a doomed
/// query, never the correctness of committed data.
#[derive(Debug)]
struct AvailabilityGate {
    available: bool,
    last_failure: Option<Instant>,
}

impl AvailabilityGate {
    fn new() -> Self {
        Self {
            available: true,
            last_failure: None,
        }
    }

    /// Whether a query attempt is allowed at `now`.
    fn check_at(&self, now: Instant, window: Duration) -> bool {
        if self.available {
            return true;
        }
        match self.last_failure {
            // One probe is let through once the window has elapsed.
            Some(at) => now.duration_since(at) >= window,
            None => true,
        }
    }

    fn record_failure(&mut self, now: Instant) {
        self.available = false;
        self.last_failure = Some(now);
    }

    fn record_success(&mut self) {
        self.available = true;
        self.last_failure = None;
    }
}

struct StoreInner {
    pool: PgPool,
    gate: Mutex<AvailabilityGate>,
}

/// Handle to the relational store. Constructed once at process start and
/// cloned into every component that needs it.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Connect a bounded pool using the supplied configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection cannot be established.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = PgConnectOptions::new()
            .host(config.host())
            .port(config.port())
            .database(config.database())
            .username(config.username())
            .password(config.password().expose_secret());

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .idle_timeout(config.idle_timeout())
            .acquire_timeout(config.connect_timeout())
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool, e.g. one built by test fixtures.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                pool,
                gate: Mutex::new(AvailabilityGate::new()),
            }),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Whether the store is currently believed reachable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.gate.lock().available
    }

    /// Run one statement through the availability gate with timing and
    /// span instrumentation.
    pub(crate) async fn run<T, F>(
        &self,
        operation: &str,
        statement: &str,
        query: F,
    ) -> Result<T, StoreError>
    where
        T: RowCount,
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        if !self.inner.gate.lock().check_at(Instant::now(), BACKOFF_WINDOW) {
            return Err(StoreError::Unavailable);
        }

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = operation,
            db.statement = statement
        );
        let started = Instant::now();
        let result = query.instrument(span).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(value) => {
                self.inner.gate.lock().record_success();
                debug!(
                    statement = %statement_preview(statement),
                    rows = value.row_count(),
                    elapsed_ms,
                    "query ok"
                );
                Ok(value)
            }
            Err(err) => {
                if is_connection_error(&err) {
                    self.inner.gate.lock().record_failure(Instant::now());
                }
                debug!(
                    statement = %statement_preview(statement),
                    elapsed_ms,
                    "query failed: {err}"
                );
                Err(StoreError::Query(err))
            }
        }
    }
}

/// Row counts for query logs, reported where the driver exposes one.
pub(crate) trait RowCount {
    fn row_count(&self) -> u64;
}

impl RowCount for PgQueryResult {
    fn row_count(&self) -> u64 {
        self.rows_affected()
    }
}

impl RowCount for PgRow {
    fn row_count(&self) -> u64 {
        1
    }
}

impl RowCount for Option<PgRow> {
    fn row_count(&self) -> u64 {
        u64::from(self.is_some())
    }
}

/// Failures that indicate the store itself is unreachable, as opposed to a
/// bad statement or a decode mismatch.
fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

fn statement_preview(statement: &str) -> String {
    let collapsed = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.len() <= STATEMENT_PREVIEW_LEN {
        collapsed
    } else {
        let cut = collapsed
            .char_indices()
            .take_while(|(index, _)| *index < STATEMENT_PREVIEW_LEN)
            .last()
            .map_or(0, |(index, ch)| index + ch.len_utf8());
        format!("{}…", &collapsed[..cut])
    }
}
