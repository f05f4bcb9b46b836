// crates/hongd-core/src/runtime/pool.rs
// ============================================================================
// Module: HONGD Connection Pool
// Description: Bounded pool of directory sessions with blocking acquisition.
// Purpose: Cap concurrent backend sessions and hand each to one caller at a time.
// Dependencies: tracing, crate::interfaces
// ============================================================================

//! ## Overview
//! [`ConnectionPool`] allocates sessions on demand up to a fixed maximum and
//! keeps released sessions in a FIFO idle queue so the oldest idle session is
//! reused first. When the pool is saturated, [`ConnectionPool::acquire`]
//! blocks on a condition variable until a connection is released.
//!
//! Checked-out connections are owned by a [`PooledConnection`] guard whose
//! `Drop` returns them to the pool on every exit path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::ops::Deref;
use std::ops::DerefMut;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use crate::core::error::NameError;
use crate::interfaces::DirectorySession;
use crate::interfaces::SessionError;
use crate::interfaces::SharedDirectoryBackend;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum number of directory sessions.
pub const DEFAULT_MAX_CONNECTIONS: usize = 3;

/// Default pause unit after a failed open.
pub const DEFAULT_OPEN_BACKOFF: Duration = Duration::from_millis(1);

/// Largest shift applied to the open backoff between failed opens.
const MAX_OPEN_BACKOFF_SHIFT: u32 = 10;

// ============================================================================
// SECTION: Connection Phase
// ============================================================================

/// Lifecycle phase of a directory connection, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    /// Freshly opened session, checked out for its first use.
    New,
    /// Previously idle session, checked out again.
    Open,
    /// Query in flight.
    Query,
    /// Query returned no row.
    Results,
    /// Query returned a row that is being extracted.
    Fetch,
    /// Parked in the idle queue.
    Idle,
    /// Session state reset after a failure.
    Reset,
    /// Session closed.
    Closed,
    /// Last operation failed.
    Error,
}

impl ConnectionPhase {
    /// Returns the lowercase label for this phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Open => "open",
            Self::Query => "query",
            Self::Results => "results",
            Self::Fetch => "fetch",
            Self::Idle => "idle",
            Self::Reset => "reset",
            Self::Closed => "closed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Connection
// ============================================================================

/// One directory session plus its diagnostic phase.
///
/// # Invariants
/// - A connection is idle in the pool, checked out by one caller, or being
///   closed; never more than one at once.
/// - `session` is `None` only after the connection has been closed or moved.
pub struct Connection {
    /// Pool-assigned identifier.
    id: u64,
    /// Current lifecycle phase.
    phase: ConnectionPhase,
    /// Backend session; `None` once closed.
    session: Option<Box<dyn DirectorySession>>,
}

impl Connection {
    /// Wraps a freshly opened session.
    fn new(id: u64, session: Box<dyn DirectorySession>) -> Self {
        Self {
            id,
            phase: ConnectionPhase::New,
            session: Some(session),
        }
    }

    /// Returns the pool-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Records a new lifecycle phase.
    pub const fn set_phase(&mut self, phase: ConnectionPhase) {
        self.phase = phase;
    }

    /// Returns the backend session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Fatal`] when the connection has been closed.
    pub fn session(&mut self) -> Result<&mut dyn DirectorySession, SessionError> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(SessionError::Fatal(format!("connection {} is closed", self.id))),
        }
    }

    /// Moves the session out, leaving this value closed.
    fn take(&mut self) -> Self {
        let session = self.session.take();
        let phase = self.phase;
        self.phase = ConnectionPhase::Closed;
        Self {
            id: self.id,
            phase,
            session,
        }
    }

    /// Drops the session and marks the connection closed.
    fn close(&mut self) {
        self.session = None;
        self.phase = ConnectionPhase::Closed;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("open", &self.session.is_some())
            .finish()
    }
}

// ============================================================================
// SECTION: Settings and Stats
// ============================================================================

/// Pool sizing and open-failure pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Maximum sessions allocated at once; zero disables the pool.
    pub max_connections: usize,
    /// Pause unit applied after a failed open.
    pub open_backoff: Duration,
}

impl PoolSettings {
    /// Builds settings for a pool of `max_connections` sessions.
    #[must_use]
    pub const fn new(max_connections: usize, open_backoff: Duration) -> Self {
        Self {
            max_connections,
            open_backoff,
        }
    }

    /// Settings for a pool that refuses every acquisition.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(0, DEFAULT_OPEN_BACKOFF)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONNECTIONS, DEFAULT_OPEN_BACKOFF)
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Configured maximum.
    pub max_allocated: usize,
    /// Sessions allocated (idle plus checked out).
    pub n_allocated: usize,
    /// Sessions parked in the idle queue.
    pub idle: usize,
    /// True once the pool refuses acquisitions.
    pub disabled: bool,
}

// ============================================================================
// SECTION: Connection Pool
// ============================================================================

/// Mutable pool state guarded by one mutex.
struct PoolState {
    /// Idle sessions, oldest first.
    idle: VecDeque<Connection>,
    /// Sessions allocated, including reservations for in-flight opens.
    n_allocated: usize,
    /// True once the pool refuses acquisitions.
    disabled: bool,
    /// Next connection identifier.
    next_id: u64,
}

/// Bounded pool of directory sessions.
///
/// # Invariants
/// - `n_allocated <= max_allocated` at every observation point.
/// - No connection is handed to two callers before it is released.
pub struct ConnectionPool {
    /// Backend used to open sessions.
    backend: SharedDirectoryBackend,
    /// Configured maximum.
    max_allocated: usize,
    /// Pause unit after a failed open.
    open_backoff: Duration,
    /// Idle queue and counters.
    state: Mutex<PoolState>,
    /// Signaled on release and on failed open.
    available: Condvar,
}

impl ConnectionPool {
    /// Creates an empty pool. No session is opened until first acquisition.
    #[must_use]
    pub fn new(backend: SharedDirectoryBackend, settings: PoolSettings) -> Self {
        Self {
            backend,
            max_allocated: settings.max_connections,
            open_backoff: settings.open_backoff.max(Duration::from_millis(1)),
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                n_allocated: 0,
                disabled: settings.max_connections == 0,
                next_id: 1,
            }),
            available: Condvar::new(),
        }
    }

    /// Returns a description of the backend for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Acquires a connection, blocking while the pool is saturated.
    ///
    /// With `fail_fast`, a failed open returns immediately instead of waiting
    /// for another connection to become available.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::PoolUnavailable`] when the pool is disabled, or
    /// when `fail_fast` is set and a new session cannot be opened.
    pub fn acquire(&self, fail_fast: bool) -> Result<PooledConnection<'_>, NameError> {
        self.acquire_until(fail_fast, None)
    }

    /// Acquires a connection, giving up once `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::PoolTimeout`] when the deadline passes first and
    /// [`NameError::PoolUnavailable`] when the pool is disabled.
    pub fn acquire_timeout(&self, deadline: Instant) -> Result<PooledConnection<'_>, NameError> {
        self.acquire_until(false, Some(deadline))
    }

    /// Shared acquisition loop.
    fn acquire_until(
        &self,
        fail_fast: bool,
        deadline: Option<Instant>,
    ) -> Result<PooledConnection<'_>, NameError> {
        let mut failed_opens: u32 = 0;
        let mut state = self.lock_state();
        loop {
            if state.disabled {
                return Err(NameError::PoolUnavailable("directory pool is disabled".to_string()));
            }
            if let Some(mut conn) = state.idle.pop_front() {
                conn.phase = ConnectionPhase::Open;
                return Ok(PooledConnection::new(self, conn));
            }
            if state.n_allocated < self.max_allocated {
                state.n_allocated += 1;
                let id = state.next_id;
                state.next_id += 1;
                drop(state);
                match self.backend.open() {
                    Ok(session) => {
                        tracing::debug!(connection = id, "opened directory connection");
                        return Ok(PooledConnection::new(self, Connection::new(id, session)));
                    }
                    Err(err) => {
                        tracing::warn!(
                            backend = %self.backend.describe(),
                            error = %err,
                            "cannot open directory connection"
                        );
                        state = self.lock_state();
                        state.n_allocated = state.n_allocated.saturating_sub(1);
                        self.available.notify_one();
                        if fail_fast {
                            return Err(NameError::PoolUnavailable(err.to_string()));
                        }
                        let shift = failed_opens.min(MAX_OPEN_BACKOFF_SHIFT);
                        failed_opens = failed_opens.saturating_add(1);
                        let mut pause = self.open_backoff.saturating_mul(1_u32 << shift);
                        if let Some(deadline) = deadline {
                            pause = pause.min(remaining(deadline)?);
                        }
                        state = self
                            .available
                            .wait_timeout(state, pause)
                            .unwrap_or_else(PoisonError::into_inner)
                            .0;
                        continue;
                    }
                }
            }
            tracing::trace!(max = self.max_allocated, "directory pool saturated; waiting");
            state = match deadline {
                None => self.available.wait(state).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let wait = remaining(deadline)?;
                    self.available
                        .wait_timeout(state, wait)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    /// Returns a connection to the idle queue and wakes one waiter.
    ///
    /// Closed connections, and every connection released after the pool has
    /// been disabled, are dropped and their slot freed instead.
    fn release(&self, mut conn: Connection) {
        let mut state = self.lock_state();
        if state.disabled || conn.session.is_none() {
            conn.close();
            state.n_allocated = state.n_allocated.saturating_sub(1);
        } else {
            conn.phase = ConnectionPhase::Idle;
            state.idle.push_back(conn);
        }
        drop(state);
        self.available.notify_one();
    }

    /// Asks the backend to reset a connection's session state in place.
    ///
    /// Failures are logged and leave the connection in the `error` phase; the
    /// next query on it reports the underlying problem.
    pub fn reset(&self, conn: &mut Connection) {
        let id = conn.id;
        let result = conn.session().and_then(|session| session.reset());
        match result {
            Ok(()) => conn.phase = ConnectionPhase::Reset,
            Err(err) => {
                tracing::warn!(connection = id, error = %err, "directory connection reset failed");
                conn.phase = ConnectionPhase::Error;
            }
        }
    }

    /// Refuses further acquisitions and wakes every waiter.
    pub fn disable(&self) {
        let mut state = self.lock_state();
        state.disabled = true;
        drop(state);
        self.available.notify_all();
    }

    /// Closes every idle connection and disables the pool.
    ///
    /// Checked-out connections are closed when their guards drop. Returns the
    /// number of idle connections closed.
    pub fn shutdown(&self) -> usize {
        let mut state = self.lock_state();
        state.disabled = true;
        let mut closed = 0;
        while let Some(mut conn) = state.idle.pop_front() {
            conn.close();
            state.n_allocated = state.n_allocated.saturating_sub(1);
            closed += 1;
        }
        drop(state);
        self.available.notify_all();
        tracing::debug!(closed, "directory pool shut down");
        closed
    }

    /// Returns current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.lock_state();
        PoolStats {
            max_allocated: self.max_allocated,
            n_allocated: state.n_allocated,
            idle: state.idle.len(),
            disabled: state.disabled,
        }
    }

    /// Locks pool state, recovering from poisoning.
    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the time left before `deadline`, or a timeout error.
fn remaining(deadline: Instant) -> Result<Duration, NameError> {
    let now = Instant::now();
    if now >= deadline {
        return Err(NameError::PoolTimeout);
    }
    Ok(deadline - now)
}

// ============================================================================
// SECTION: Pooled Connection Guard
// ============================================================================

/// Exclusive handle to a checked-out connection; releases it on drop.
pub struct PooledConnection<'a> {
    /// Owning pool.
    pool: &'a ConnectionPool,
    /// Checked-out connection.
    conn: Connection,
}

impl<'a> PooledConnection<'a> {
    /// Wraps a checked-out connection.
    const fn new(pool: &'a ConnectionPool, conn: Connection) -> Self {
        Self {
            pool,
            conn,
        }
    }

    /// Resets the connection through its owning pool.
    pub fn reset(&mut self) {
        self.pool.reset(&mut self.conn);
    }
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        let conn = self.conn.take();
        self.pool.release(conn);
    }
}

impl fmt::Debug for PooledConnection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledConnection").field(&self.conn).finish()
    }
}
