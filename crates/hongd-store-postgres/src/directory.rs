// crates/hongd-store-postgres/src/directory.rs
// ============================================================================
// Module: Postgres Directory Backend
// Description: HONGD directory records stored in a Postgres table.
// Purpose: Answer forward and reverse name lookups from a shared database.
// Dependencies: hongd-core, postgres, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`PostgresDirectory`] validates its configuration at construction but does
//! not connect until a session is opened, so a resolver can start while the
//! database is still coming up. The directory table maps
//! `hname TEXT PRIMARY KEY` to `gname BYTEA`.
//!
//! Connection-class failures (closed sockets, SQLSTATE class `08`,
//! serialization and deadlock aborts, administrator shutdowns, and
//! connection limits) are transient. A session whose socket has closed
//! reconnects during reset.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use hongd_core::DEFAULT_DIRECTORY_TABLE;
use hongd_core::DirectoryBackend;
use hongd_core::DirectorySession;
use hongd_core::GdpName;
use hongd_core::SessionError;
use hongd_core::is_valid_table_name;
use postgres::Client;
use postgres::NoTls;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default Postgres port.
const DEFAULT_PORT: u16 = 5432;
/// Default connect timeout (milliseconds).
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default directory user.
const DEFAULT_USER: &str = "gdp_user";
/// Default directory database.
const DEFAULT_DATABASE: &str = "gdp_hongd";
/// SQLSTATE codes outside class `08` that are worth retrying.
const TRANSIENT_SQLSTATES: &[&str] = &["40001", "40P01", "57P01", "57P02", "57P03", "53300"];

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the Postgres directory.
///
/// # Invariants
/// - `host` must not be empty.
/// - `table` must be a plain SQL identifier.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct PostgresDirectoryConfig {
    /// Database host name or address.
    pub host: String,
    /// Database port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database user.
    #[serde(default = "default_user")]
    pub user: String,
    /// Database password.
    #[serde(default)]
    pub password: Option<String>,
    /// Database name.
    #[serde(default = "default_database")]
    pub database: String,
    /// Directory table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl PostgresDirectoryConfig {
    /// Builds a configuration with defaults for everything but the host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

impl Default for PostgresDirectoryConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            user: default_user(),
            password: None,
            database: default_database(),
            table: default_table(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for PostgresDirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDirectoryConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("table", &self.table)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

/// Returns the default Postgres port.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Returns the default directory user.
fn default_user() -> String {
    DEFAULT_USER.to_string()
}

/// Returns the default directory database.
fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

/// Returns the default directory table name.
fn default_table() -> String {
    DEFAULT_DIRECTORY_TABLE.to_string()
}

/// Returns the default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Postgres directory errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PostgresDirectoryError {
    /// Postgres error.
    #[error("postgres directory error: {0}")]
    Postgres(String),
    /// Invalid configuration or input.
    #[error("postgres directory invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Directory
// ============================================================================

/// Postgres-backed HONGD directory.
#[derive(Clone)]
pub struct PostgresDirectory {
    /// Validated configuration.
    config: PostgresDirectoryConfig,
    /// Client configuration derived from `config`.
    client_config: postgres::Config,
}

impl PostgresDirectory {
    /// Validates the configuration without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresDirectoryError::Invalid`] when the host is empty or
    /// the table name is not a plain identifier.
    pub fn new(config: PostgresDirectoryConfig) -> Result<Self, PostgresDirectoryError> {
        if config.host.trim().is_empty() {
            return Err(PostgresDirectoryError::Invalid("host must not be empty".to_string()));
        }
        if !is_valid_table_name(&config.table) {
            return Err(PostgresDirectoryError::Invalid(format!(
                "invalid directory table name: {}",
                config.table
            )));
        }
        let mut client_config = postgres::Config::new();
        client_config
            .host(&config.host)
            .port(config.port)
            .user(&config.user)
            .dbname(&config.database)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms));
        if let Some(password) = &config.password {
            client_config.password(password);
        }
        Ok(Self {
            config,
            client_config,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PostgresDirectoryConfig {
        &self.config
    }

    /// Creates the directory table and its reverse-lookup index if missing.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresDirectoryError::Postgres`] when the database cannot
    /// be reached or the statements fail.
    pub fn ensure_schema(&self) -> Result<(), PostgresDirectoryError> {
        let mut client = self.connect()?;
        let table = &self.config.table;
        client
            .batch_execute(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (hname TEXT PRIMARY KEY NOT NULL, gname \
                 BYTEA NOT NULL);CREATE INDEX IF NOT EXISTS idx_{table}_gname ON {table} (gname);"
            ))
            .map_err(|err| PostgresDirectoryError::Postgres(err.to_string()))
    }

    /// Registers `human_name` for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresDirectoryError::Invalid`] for an empty human name or
    /// the unset sentinel, and [`PostgresDirectoryError::Postgres`] when the
    /// insert fails (including when the human name is already registered).
    pub fn insert(&self, human_name: &str, name: &GdpName) -> Result<(), PostgresDirectoryError> {
        if human_name.is_empty() {
            return Err(PostgresDirectoryError::Invalid("human name must not be empty".to_string()));
        }
        if !name.is_valid() {
            return Err(PostgresDirectoryError::Invalid("name is the unset sentinel".to_string()));
        }
        let mut client = self.connect()?;
        let sql = format!("INSERT INTO {} (hname, gname) VALUES ($1, $2)", self.config.table);
        let bytes = name.as_bytes().as_slice();
        client
            .execute(&sql, &[&human_name, &bytes])
            .map_err(|err| PostgresDirectoryError::Postgres(err.to_string()))?;
        tracing::info!(hname = human_name, gname = %name, "directory record added");
        Ok(())
    }

    /// Removes `human_name`; returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns [`PostgresDirectoryError::Postgres`] when the delete fails.
    pub fn delete(&self, human_name: &str) -> Result<usize, PostgresDirectoryError> {
        let mut client = self.connect()?;
        let sql = format!("DELETE FROM {} WHERE hname = $1", self.config.table);
        let rows = client
            .execute(&sql, &[&human_name])
            .map_err(|err| PostgresDirectoryError::Postgres(err.to_string()))?;
        let rows = usize::try_from(rows).unwrap_or(usize::MAX);
        tracing::info!(hname = human_name, rows, "directory records deleted");
        Ok(rows)
    }

    /// Opens an administrative connection.
    fn connect(&self) -> Result<Client, PostgresDirectoryError> {
        self.client_config
            .connect(NoTls)
            .map_err(|err| PostgresDirectoryError::Postgres(err.to_string()))
    }
}

impl fmt::Debug for PostgresDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDirectory").field("config", &self.config).finish()
    }
}

impl DirectoryBackend for PostgresDirectory {
    fn open(&self) -> Result<Box<dyn DirectorySession>, SessionError> {
        let client = self.client_config.connect(NoTls).map_err(|err| classify_error(&err))?;
        let table = &self.config.table;
        Ok(Box::new(PostgresSession {
            client,
            client_config: self.client_config.clone(),
            lookup_sql: format!("SELECT gname FROM {table} WHERE hname = $1 LIMIT 1"),
            reverse_sql: format!("SELECT hname FROM {table} WHERE gname = $1 LIMIT 1"),
        }))
    }

    fn describe(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{}",
            self.config.user, self.config.host, self.config.port, self.config.database
        )
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// One pooled Postgres connection.
struct PostgresSession {
    /// Open client.
    client: Client,
    /// Client configuration used to reconnect.
    client_config: postgres::Config,
    /// Forward lookup statement text.
    lookup_sql: String,
    /// Reverse lookup statement text.
    reverse_sql: String,
}

impl DirectorySession for PostgresSession {
    fn lookup_name(&mut self, human_name: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let row = self
            .client
            .query_opt(self.lookup_sql.as_str(), &[&human_name])
            .map_err(|err| classify_error(&err))?;
        row.map(|row| row.try_get::<_, Vec<u8>>(0))
            .transpose()
            .map_err(|err| SessionError::Fatal(err.to_string()))
    }

    fn lookup_hname(&mut self, name: &GdpName) -> Result<Option<String>, SessionError> {
        let bytes = name.as_bytes().as_slice();
        let row = self
            .client
            .query_opt(self.reverse_sql.as_str(), &[&bytes])
            .map_err(|err| classify_error(&err))?;
        row.map(|row| row.try_get::<_, String>(0))
            .transpose()
            .map_err(|err| SessionError::Fatal(err.to_string()))
    }

    fn reset(&mut self) -> Result<(), SessionError> {
        if self.client.is_closed() {
            tracing::debug!("postgres session closed; reconnecting");
            self.client =
                self.client_config.connect(NoTls).map_err(|err| classify_error(&err))?;
            return Ok(());
        }
        self.client.batch_execute("DISCARD ALL").map_err(|err| classify_error(&err))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a Postgres error into a session error.
///
/// Errors without a server SQLSTATE come from the socket or protocol layer
/// and are treated as transient.
fn classify_error(err: &postgres::Error) -> SessionError {
    let transient = err.is_closed() || err.code().is_none_or(|state| is_transient_state(state.code()));
    if transient {
        SessionError::Transient(err.to_string())
    } else {
        SessionError::Fatal(err.to_string())
    }
}

/// Returns true when a SQLSTATE code names a retryable condition.
fn is_transient_state(code: &str) -> bool {
    code.starts_with("08") || TRANSIENT_SQLSTATES.contains(&code)
}
