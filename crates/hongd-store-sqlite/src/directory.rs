// crates/hongd-store-sqlite/src/directory.rs
// ============================================================================
// Module: SQLite Directory Backend
// Description: HONGD directory records stored in an SQLite table.
// Purpose: Answer forward and reverse name lookups from a local database.
// Dependencies: hongd-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteDirectory`] validates its path and table name at construction
//! without touching the filesystem, and opens one `SQLite` connection per
//! pooled session. Sessions never create the database file; only
//! [`SqliteDirectory::ensure_schema`] does. The directory table maps
//! `hname TEXT PRIMARY KEY` to `gname BLOB`.
//!
//! Busy, locked, and I/O failures are reported as transient so the query
//! engine resets and retries them; every other failure is fatal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use hongd_core::DEFAULT_DIRECTORY_TABLE;
use hongd_core::DirectoryBackend;
use hongd_core::DirectorySession;
use hongd_core::GdpName;
use hongd_core::SessionError;
use hongd_core::is_valid_table_name;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::types::Value;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version for the directory database.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (milliseconds).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for the `SQLite` directory.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `table` must be a plain SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteDirectoryConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Directory table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
}

impl SqliteDirectoryConfig {
    /// Builds a configuration with defaults for everything but the path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: default_table(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
        }
    }
}

/// Returns the default directory table name.
fn default_table() -> String {
    DEFAULT_DIRECTORY_TABLE.to_string()
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` directory errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteDirectoryError {
    /// Filesystem error.
    #[error("sqlite directory io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite directory db error: {0}")]
    Db(String),
    /// Schema version mismatch.
    #[error("sqlite directory version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or input.
    #[error("sqlite directory invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Directory
// ============================================================================

/// `SQLite`-backed HONGD directory.
#[derive(Debug, Clone)]
pub struct SqliteDirectory {
    /// Validated configuration.
    config: SqliteDirectoryConfig,
}

impl SqliteDirectory {
    /// Validates the configuration. Nothing is created or opened.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteDirectoryError::Invalid`] when the path or table name
    /// is invalid.
    pub fn new(config: SqliteDirectoryConfig) -> Result<Self, SqliteDirectoryError> {
        if !is_valid_table_name(&config.table) {
            return Err(SqliteDirectoryError::Invalid(format!(
                "invalid directory table name: {}",
                config.table
            )));
        }
        validate_store_path(&config.path)?;
        Ok(Self {
            config,
        })
    }

    /// Creates the database file, its parent directories, and the directory
    /// table when missing, or checks the schema version of an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteDirectoryError`] when the file cannot be created or
    /// opened, or its schema version differs.
    pub fn ensure_schema(&self) -> Result<(), SqliteDirectoryError> {
        ensure_parent_dir(&self.config.path)?;
        let mut connection = open_connection(&self.config, true)?;
        initialize_schema(&mut connection, &self.config.table)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteDirectoryConfig {
        &self.config
    }

    /// Registers `human_name` for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteDirectoryError::Invalid`] for an empty human name or the
    /// unset sentinel, and [`SqliteDirectoryError::Db`] when the insert fails
    /// (including when the human name is already registered).
    pub fn insert(&self, human_name: &str, name: &GdpName) -> Result<(), SqliteDirectoryError> {
        if human_name.is_empty() {
            return Err(SqliteDirectoryError::Invalid("human name must not be empty".to_string()));
        }
        if !name.is_valid() {
            return Err(SqliteDirectoryError::Invalid("name is the unset sentinel".to_string()));
        }
        let connection = open_connection(&self.config, false)?;
        let sql = format!("INSERT INTO {} (hname, gname) VALUES (?1, ?2)", self.config.table);
        connection
            .execute(&sql, params![human_name, name.as_bytes().as_slice()])
            .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
        tracing::info!(hname = human_name, gname = %name, "directory record added");
        Ok(())
    }

    /// Removes `human_name`; returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteDirectoryError::Db`] when the delete fails.
    pub fn delete(&self, human_name: &str) -> Result<usize, SqliteDirectoryError> {
        let connection = open_connection(&self.config, false)?;
        let sql = format!("DELETE FROM {} WHERE hname = ?1", self.config.table);
        let rows = connection
            .execute(&sql, params![human_name])
            .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
        tracing::info!(hname = human_name, rows, "directory records deleted");
        Ok(rows)
    }
}

impl DirectoryBackend for SqliteDirectory {
    fn open(&self) -> Result<Box<dyn DirectorySession>, SessionError> {
        let connection = Connection::open_with_flags(&self.config.path, session_flags())
            .map_err(|err| classify_error(&err))?;
        connection
            .busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(|err| classify_error(&err))?;
        let table = &self.config.table;
        Ok(Box::new(SqliteSession {
            connection,
            lookup_sql: format!("SELECT gname FROM {table} WHERE hname = ?1 LIMIT 1"),
            reverse_sql: format!("SELECT hname FROM {table} WHERE gname = ?1 LIMIT 1"),
        }))
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.config.path.display())
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// One pooled `SQLite` connection.
struct SqliteSession {
    /// Open connection.
    connection: Connection,
    /// Forward lookup statement text.
    lookup_sql: String,
    /// Reverse lookup statement text.
    reverse_sql: String,
}

impl DirectorySession for SqliteSession {
    fn lookup_name(&mut self, human_name: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let mut statement =
            self.connection.prepare_cached(&self.lookup_sql).map_err(|err| classify_error(&err))?;
        let value: Option<Value> = statement
            .query_row(params![human_name], |row| row.get(0))
            .optional()
            .map_err(|err| classify_error(&err))?;
        Ok(value.map(value_bytes))
    }

    fn lookup_hname(&mut self, name: &GdpName) -> Result<Option<String>, SessionError> {
        let mut statement =
            self.connection.prepare_cached(&self.reverse_sql).map_err(|err| classify_error(&err))?;
        statement
            .query_row(params![name.as_bytes().as_slice()], |row| row.get(0))
            .optional()
            .map_err(|err| classify_error(&err))
    }

    fn reset(&mut self) -> Result<(), SessionError> {
        self.connection.flush_prepared_statement_cache();
        if !self.connection.is_autocommit() {
            self.connection.execute_batch("ROLLBACK").map_err(|err| classify_error(&err))?;
        }
        Ok(())
    }
}

/// Returns the raw bytes of a stored name value.
///
/// Non-text, non-blob values yield no bytes and are rejected by the length
/// check downstream.
fn value_bytes(value: Value) -> Vec<u8> {
    match value {
        Value::Blob(bytes) => bytes,
        Value::Text(text) => text.into_bytes(),
        Value::Null | Value::Integer(_) | Value::Real(_) => Vec::new(),
    }
}

/// Maps an `SQLite` error into a session error.
fn classify_error(err: &rusqlite::Error) -> SessionError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::CannotOpen
            ) =>
        {
            SessionError::Transient(err.to_string())
        }
        _ => SessionError::Fatal(err.to_string()),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Flags for connections to an existing database file.
fn session_flags() -> OpenFlags {
    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_FULL_MUTEX
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteDirectoryError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteDirectoryError::Io(
            "directory path missing parent directory".to_string(),
        ));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteDirectoryError::Io(err.to_string()))
}

/// Validates database paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteDirectoryError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteDirectoryError::Invalid("directory path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteDirectoryError::Invalid("directory path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteDirectoryError::Invalid(
                "directory path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteDirectoryError::Invalid(
            "directory path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an administrative connection; only `create` allows a new file.
fn open_connection(
    config: &SqliteDirectoryConfig,
    create: bool,
) -> Result<Connection, SqliteDirectoryError> {
    let flags = if create {
        session_flags() | OpenFlags::SQLITE_OPEN_CREATE
    } else {
        session_flags()
    };
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteDirectoryConfig,
) -> Result<(), SqliteDirectoryError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the directory schema or validates the existing version.
fn initialize_schema(connection: &mut Connection, table: &str) -> Result<(), SqliteDirectoryError> {
    let tx = connection.transaction().map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteDirectoryError::VersionMismatch(format!(
                "unsupported schema version {other}"
            )));
        }
    }
    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            hname TEXT PRIMARY KEY NOT NULL,
            gname BLOB NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_gname ON {table} (gname);"
    ))
    .map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    tx.commit().map_err(|err| SqliteDirectoryError::Db(err.to_string()))?;
    Ok(())
}
