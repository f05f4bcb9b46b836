// crates/hongd-core/src/runtime/query.rs
// ============================================================================
// Module: HONGD Directory Query Engine
// Description: Pooled forward and reverse lookups with retry and backoff.
// Purpose: Hide transient backend failures behind bounded, paced retries.
// Dependencies: tracing, crate::runtime::pool
// ============================================================================

//! ## Overview
//! Each lookup acquires one pooled connection and runs up to `max_tries`
//! attempts on it. After a transient failure the engine sleeps
//! `(1 << min(attempt, 30)) * backoff`, resets the session, and retries.
//! Absence is never retried. The connection returns to the pool on every
//! exit path through the [`PooledConnection`] guard.
//!
//! [`PooledConnection`]: crate::runtime::pool::PooledConnection

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;
use std::time::Duration;

use crate::core::error::NameError;
use crate::core::name::GdpName;
use crate::interfaces::DirectorySession;
use crate::interfaces::SessionError;
use crate::runtime::pool::Connection;
use crate::runtime::pool::ConnectionPhase;
use crate::runtime::pool::ConnectionPool;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of attempts per lookup.
pub const DEFAULT_MAX_TRIES: u32 = 10;

/// Default backoff unit between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1);

/// Largest shift applied to the backoff unit.
const MAX_BACKOFF_SHIFT: u32 = 30;

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Attempt bound and pacing for directory queries.
///
/// # Invariants
/// - `max_tries >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per lookup.
    max_tries: u32,
    /// Backoff unit.
    backoff: Duration,
}

impl RetryPolicy {
    /// Builds a policy; zero attempts is raised to one.
    #[must_use]
    pub fn new(max_tries: u32, backoff: Duration) -> Self {
        Self {
            max_tries: max_tries.max(1),
            backoff,
        }
    }

    /// Returns the attempt bound.
    #[must_use]
    pub const fn max_tries(&self) -> u32 {
        self.max_tries
    }

    /// Returns the backoff unit.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Returns the sleep before the attempt following `attempt`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1_u32 << attempt.min(MAX_BACKOFF_SHIFT))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRIES, DEFAULT_BACKOFF)
    }
}

// ============================================================================
// SECTION: Directory Query
// ============================================================================

/// Query engine over a connection pool.
pub struct DirectoryQuery {
    /// Pool supplying sessions.
    pool: ConnectionPool,
    /// Retry bound and pacing.
    retry: RetryPolicy,
}

impl DirectoryQuery {
    /// Creates a query engine.
    #[must_use]
    pub const fn new(pool: ConnectionPool, retry: RetryPolicy) -> Self {
        Self {
            pool,
            retry,
        }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Looks up the internal name registered for `human_name`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::NameUnknown`] when no row matches or the stored
    /// value has the wrong length, [`NameError::BackendError`] when retries
    /// are exhausted, and [`NameError::PoolUnavailable`] when the pool is
    /// disabled.
    pub fn lookup_by_name(&self, human_name: &str) -> Result<GdpName, NameError> {
        let row = self.with_retry(human_name, |session| session.lookup_name(human_name))?;
        let Some(bytes) = row else {
            return Err(NameError::NameUnknown(human_name.to_string()));
        };
        GdpName::from_slice(&bytes).ok_or_else(|| {
            tracing::warn!(
                hname = human_name,
                length = bytes.len(),
                "directory row has a malformed name; treating as unknown"
            );
            NameError::NameUnknown(human_name.to_string())
        })
    }

    /// Looks up the human name registered for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::NameUnknown`] when no row matches,
    /// [`NameError::BackendError`] when retries are exhausted, and
    /// [`NameError::PoolUnavailable`] when the pool is disabled.
    pub fn reverse_lookup(&self, name: &GdpName) -> Result<String, NameError> {
        let printable = name.to_printable();
        self.with_retry(&printable, |session| session.lookup_hname(name))?
            .ok_or(NameError::NameUnknown(printable))
    }

    /// Runs `query` on one pooled connection with bounded retries.
    fn with_retry<R, F>(&self, key: &str, mut query: F) -> Result<Option<R>, NameError>
    where
        F: FnMut(&mut dyn DirectorySession) -> Result<Option<R>, SessionError>,
    {
        let mut conn = self.pool.acquire(false)?;
        let mut attempt: u32 = 0;
        loop {
            let err = match run_attempt(&mut conn, &mut query) {
                Ok(row) => return Ok(row),
                Err(err) => err,
            };
            let last_attempt = attempt.saturating_add(1) >= self.retry.max_tries;
            if !err.is_transient() || last_attempt {
                tracing::warn!(
                    key,
                    connection = conn.id(),
                    attempts = attempt.saturating_add(1),
                    error = %err,
                    "directory query failed"
                );
                return Err(NameError::BackendError(err.to_string()));
            }
            let delay = self.retry.delay(attempt);
            tracing::warn!(
                key,
                connection = conn.id(),
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "directory query failed; retrying"
            );
            thread::sleep(delay);
            conn.reset();
            attempt += 1;
        }
    }
}

/// Runs one query attempt, recording the connection phase it ends in.
fn run_attempt<R, F>(conn: &mut Connection, query: &mut F) -> Result<Option<R>, SessionError>
where
    F: FnMut(&mut dyn DirectorySession) -> Result<Option<R>, SessionError>,
{
    conn.set_phase(ConnectionPhase::Query);
    let result = match conn.session() {
        Ok(session) => query(session),
        Err(err) => Err(err),
    };
    let phase = match &result {
        Ok(Some(_)) => ConnectionPhase::Fetch,
        Ok(None) => ConnectionPhase::Results,
        Err(_) => ConnectionPhase::Error,
    };
    conn.set_phase(phase);
    result
}
