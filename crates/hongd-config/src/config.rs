// crates/hongd-config/src/config.rs
// ============================================================================
// Module: HONGD Configuration
// Description: Configuration loading and validation for the HONGD resolver.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: hongd-core, hongd-store-sqlite, hongd-store-postgres, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Pool and retry counts are clamped to at least one after parsing; anything
//! else that is out of range fails closed.
//!
//! The name root falls back to the `GDP_NAME_ROOT` environment variable when
//! the file leaves it unset.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use hongd_core::DEFAULT_DIRECTORY_TABLE;
use hongd_core::PoolSettings;
use hongd_core::ResolverSettings;
use hongd_core::RetryPolicy;
use hongd_core::is_valid_table_name;
use hongd_store_postgres::PostgresDirectoryConfig;
use hongd_store_sqlite::SqliteDirectoryConfig;
use hongd_store_sqlite::SqliteJournalMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "hongd.toml";
/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "HONGD_CONFIG";
/// Environment variable supplying the name root when the file has none.
pub const NAME_ROOT_ENV_VAR: &str = "GDP_NAME_ROOT";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum password file size in bytes.
const MAX_PASSWORD_FILE_SIZE: usize = 4096;
/// Maximum name root length.
const MAX_NAME_ROOT_LENGTH: usize = 255;
/// Maximum connect timeout in milliseconds.
const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;
/// Default Postgres port.
const DEFAULT_PORT: u16 = 5432;
/// Default connect and busy timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
/// Default pool size.
const DEFAULT_MAX_CONNECTIONS: usize = 3;
/// Default number of query attempts.
const DEFAULT_MAX_TRIES: u32 = 10;
/// Default base backoff in milliseconds.
const DEFAULT_BACKOFF_MS: u64 = 1;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// HONGD resolver configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HongdConfig {
    /// Directory backend configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Connection pool and retry configuration.
    #[serde(default)]
    pub pool: PoolConfig,
    /// Name resolution policy.
    #[serde(default)]
    pub names: NamesConfig,
}

impl HongdConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is taken from `path`, then `HONGD_CONFIG`, then `hongd.toml`
    /// in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.names.apply_root_fallback(env::var(NAME_ROOT_ENV_VAR).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration like [`HongdConfig::load`], but uses defaults when
    /// no path is given, `HONGD_CONFIG` is unset, and `hongd.toml` does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an existing file fails to load or validate.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let implicit = path.is_none() && env::var_os(CONFIG_ENV_VAR).is_none();
        if implicit && !Path::new(DEFAULT_CONFIG_NAME).exists() {
            let mut config = Self::default();
            config.names.apply_root_fallback(env::var(NAME_ROOT_ENV_VAR).ok());
            config.validate()?;
            return Ok(config);
        }
        Self::load(path)
    }

    /// Parses configuration text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid config TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration and normalizes clamped values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.directory.validate()?;
        self.pool.validate();
        self.names.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Directory Config
// ============================================================================

/// Directory backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryType {
    /// No directory; names resolve only through the printable and legacy paths.
    #[default]
    None,
    /// Local `SQLite` file.
    Sqlite,
    /// Postgres server.
    Postgres,
}

/// Directory backend configuration.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Backend type.
    #[serde(rename = "type", default)]
    pub directory_type: DirectoryType,
    /// `SQLite` database path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// Postgres host; when absent the directory is disabled.
    #[serde(default)]
    pub host: Option<String>,
    /// Postgres port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Postgres user.
    #[serde(default)]
    pub user: Option<String>,
    /// Postgres password.
    #[serde(default)]
    pub password: Option<String>,
    /// File whose first line is the Postgres password.
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    /// Postgres database name.
    #[serde(default)]
    pub database: Option<String>,
    /// Directory table name.
    #[serde(default = "default_table")]
    pub table: String,
    /// Postgres connect timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            directory_type: DirectoryType::default(),
            path: None,
            busy_timeout_ms: DEFAULT_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            host: None,
            port: DEFAULT_PORT,
            user: None,
            password: None,
            password_file: None,
            database: None,
            table: default_table(),
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("directory_type", &self.directory_type)
            .field("path", &self.path)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .field("journal_mode", &self.journal_mode)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_file", &self.password_file)
            .field("database", &self.database)
            .field("table", &self.table)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

impl DirectoryConfig {
    /// Validates directory configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_table_name(&self.table) {
            return Err(ConfigError::Invalid(format!(
                "directory.table must be a plain identifier: {}",
                self.table
            )));
        }
        match self.directory_type {
            DirectoryType::None => Ok(()),
            DirectoryType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite directory requires path".to_string())
                })?;
                validate_path_string("directory.path", &path.to_string_lossy())?;
                if self.host.is_some() {
                    return Err(ConfigError::Invalid(
                        "sqlite directory must not set host".to_string(),
                    ));
                }
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "directory.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
            DirectoryType::Postgres => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "postgres directory must not set path".to_string(),
                    ));
                }
                if self.host.as_deref().is_some_and(|host| host.trim().is_empty()) {
                    return Err(ConfigError::Invalid(
                        "directory.host must be non-empty when set".to_string(),
                    ));
                }
                if self.password.is_some() && self.password_file.is_some() {
                    return Err(ConfigError::Invalid(
                        "directory.password and directory.password_file are mutually exclusive"
                            .to_string(),
                    ));
                }
                if let Some(path) = &self.password_file {
                    validate_path_string("directory.password_file", &path.to_string_lossy())?;
                }
                if self.connect_timeout_ms == 0 || self.connect_timeout_ms > MAX_CONNECT_TIMEOUT_MS
                {
                    return Err(ConfigError::Invalid(format!(
                        "directory.connect_timeout_ms must be between 1 and \
                         {MAX_CONNECT_TIMEOUT_MS}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Returns the `SQLite` directory configuration, if selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteDirectoryConfig> {
        if self.directory_type != DirectoryType::Sqlite {
            return None;
        }
        let path = self.path.clone()?;
        let mut config = SqliteDirectoryConfig::new(path);
        config.table.clone_from(&self.table);
        config.busy_timeout_ms = self.busy_timeout_ms;
        config.journal_mode = self.journal_mode;
        Some(config)
    }

    /// Returns the Postgres directory configuration, if selected and a host
    /// is set. Reads the password file when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the password file cannot be read.
    pub fn postgres_config(&self) -> Result<Option<PostgresDirectoryConfig>, ConfigError> {
        if self.directory_type != DirectoryType::Postgres {
            return Ok(None);
        }
        let Some(host) = &self.host else {
            return Ok(None);
        };
        let mut config = PostgresDirectoryConfig::new(host.clone());
        config.port = self.port;
        if let Some(user) = &self.user {
            config.user.clone_from(user);
        }
        if let Some(database) = &self.database {
            config.database.clone_from(database);
        }
        config.table.clone_from(&self.table);
        config.connect_timeout_ms = self.connect_timeout_ms;
        config.password = self.password()?;
        Ok(Some(config))
    }

    /// Returns the configured password, reading `password_file` if set.
    ///
    /// Only the first line of the file is used, without its line ending.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or is too large.
    pub fn password(&self) -> Result<Option<String>, ConfigError> {
        if let Some(password) = &self.password {
            return Ok(Some(password.clone()));
        }
        let Some(path) = &self.password_file else {
            return Ok(None);
        };
        let bytes = fs::read(path).map_err(|err| {
            ConfigError::Io(format!("cannot read {}: {err}", path.display()))
        })?;
        if bytes.len() > MAX_PASSWORD_FILE_SIZE {
            return Err(ConfigError::Invalid("password file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("password file must be utf-8".to_string()))?;
        let first_line = content.lines().next().unwrap_or_default();
        Ok(Some(first_line.to_string()))
    }
}

/// Returns the default directory table name.
fn default_table() -> String {
    DEFAULT_DIRECTORY_TABLE.to_string()
}

/// Returns the default Postgres port.
const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Returns the default connect and busy timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

// ============================================================================
// SECTION: Pool Config
// ============================================================================

/// Connection pool and retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Maximum number of directory connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Maximum attempts per query.
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,
    /// Base backoff between attempts in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_tries: DEFAULT_MAX_TRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }
}

impl PoolConfig {
    /// Clamps every count to at least one.
    fn validate(&mut self) {
        self.max_connections = self.max_connections.max(1);
        self.max_tries = self.max_tries.max(1);
        self.backoff_ms = self.backoff_ms.max(1);
    }

    /// Returns the connection pool settings.
    #[must_use]
    pub const fn pool_settings(&self) -> PoolSettings {
        PoolSettings::new(self.max_connections, Duration::from_millis(self.backoff_ms))
    }

    /// Returns the query retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_tries, Duration::from_millis(self.backoff_ms))
    }
}

/// Returns the default pool size.
const fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

/// Returns the default number of query attempts.
const fn default_max_tries() -> u32 {
    DEFAULT_MAX_TRIES
}

/// Returns the default base backoff.
const fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF_MS
}

// ============================================================================
// SECTION: Names Config
// ============================================================================

/// Name resolution policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamesConfig {
    /// Namespace prefix for undotted human names.
    #[serde(default)]
    pub root: Option<String>,
    /// Whether unresolved names fall back to their SHA-256 hash.
    #[serde(default = "default_legacy_sha256")]
    pub legacy_sha256: bool,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            root: None,
            legacy_sha256: true,
        }
    }
}

impl NamesConfig {
    /// Uses `fallback` as the root when none is configured.
    pub fn apply_root_fallback(&mut self, fallback: Option<String>) {
        let configured = self.root.as_deref().is_some_and(|root| !root.trim().is_empty());
        if !configured {
            self.root = fallback;
        }
    }

    /// Validates the root; an empty root is normalized to unset.
    fn validate(&mut self) -> Result<(), ConfigError> {
        let Some(root) = self.root.take() else {
            return Ok(());
        };
        let root = root.trim();
        if root.is_empty() {
            return Ok(());
        }
        if root.len() > MAX_NAME_ROOT_LENGTH {
            return Err(ConfigError::Invalid("names.root exceeds max length".to_string()));
        }
        if root.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("names.root must not contain whitespace".to_string()));
        }
        self.root = Some(root.to_string());
        Ok(())
    }

    /// Returns the resolver settings.
    #[must_use]
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            name_root: self.root.clone(),
            legacy_sha256: self.legacy_sha256,
        }
    }
}

/// Returns the default legacy fallback switch.
const fn default_legacy_sha256() -> bool {
    true
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
