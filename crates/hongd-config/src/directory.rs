// crates/hongd-config/src/directory.rs
// ============================================================================
// Module: Configured Directory
// Description: Opens the directory backend named by configuration.
// Purpose: Give the CLI and embedders one handle for lookups and admin.
// Dependencies: hongd-core, hongd-store-sqlite, hongd-store-postgres
// ============================================================================

//! ## Overview
//! [`ConfiguredDirectory`] wraps whichever concrete backend the config
//! selects. [`HongdConfig::resolver`] builds a [`ResolverContext`] over it,
//! or a directory-less resolver when no backend is configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use hongd_core::GdpName;
use hongd_core::ResolverContext;
use hongd_core::SharedDirectoryBackend;
use hongd_store_postgres::PostgresDirectory;
use hongd_store_postgres::PostgresDirectoryError;
use hongd_store_sqlite::SqliteDirectory;
use hongd_store_sqlite::SqliteDirectoryError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::config::DirectoryType;
use crate::config::HongdConfig;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors opening or administering the configured directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// `SQLite` directory error.
    #[error(transparent)]
    Sqlite(#[from] SqliteDirectoryError),
    /// Postgres directory error.
    #[error(transparent)]
    Postgres(#[from] PostgresDirectoryError),
}

// ============================================================================
// SECTION: Configured Directory
// ============================================================================

/// Concrete directory backend selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredDirectory {
    /// `SQLite` directory.
    Sqlite(SqliteDirectory),
    /// Postgres directory.
    Postgres(PostgresDirectory),
}

impl ConfiguredDirectory {
    /// Returns a shared backend handle for the connection pool.
    #[must_use]
    pub fn backend(&self) -> SharedDirectoryBackend {
        match self {
            Self::Sqlite(directory) => Arc::new(directory.clone()),
            Self::Postgres(directory) => Arc::new(directory.clone()),
        }
    }

    /// Creates the directory table if it does not exist. For `SQLite` this
    /// also creates the database file.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the schema cannot be created.
    pub fn ensure_schema(&self) -> Result<(), DirectoryError> {
        match self {
            Self::Sqlite(directory) => directory.ensure_schema().map_err(DirectoryError::from),
            Self::Postgres(directory) => directory.ensure_schema().map_err(DirectoryError::from),
        }
    }

    /// Registers `human_name` for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the insert fails.
    pub fn insert(&self, human_name: &str, name: &GdpName) -> Result<(), DirectoryError> {
        match self {
            Self::Sqlite(directory) => {
                directory.insert(human_name, name).map_err(DirectoryError::from)
            }
            Self::Postgres(directory) => {
                directory.insert(human_name, name).map_err(DirectoryError::from)
            }
        }
    }

    /// Removes `human_name`; returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the delete fails.
    pub fn delete(&self, human_name: &str) -> Result<usize, DirectoryError> {
        match self {
            Self::Sqlite(directory) => directory.delete(human_name).map_err(DirectoryError::from),
            Self::Postgres(directory) => directory.delete(human_name).map_err(DirectoryError::from),
        }
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

impl HongdConfig {
    /// Opens the configured directory; `None` when no backend is configured
    /// or a Postgres directory has no host.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the backend rejects its configuration.
    pub fn open_directory(&self) -> Result<Option<ConfiguredDirectory>, DirectoryError> {
        match self.directory.directory_type {
            DirectoryType::None => Ok(None),
            DirectoryType::Sqlite => {
                let config = self.directory.sqlite_config().ok_or_else(|| {
                    ConfigError::Invalid("sqlite directory requires path".to_string())
                })?;
                Ok(Some(ConfiguredDirectory::Sqlite(SqliteDirectory::new(config)?)))
            }
            DirectoryType::Postgres => {
                let Some(config) = self.directory.postgres_config()? else {
                    tracing::warn!("postgres directory has no host; directory disabled");
                    return Ok(None);
                };
                Ok(Some(ConfiguredDirectory::Postgres(PostgresDirectory::new(config)?)))
            }
        }
    }

    /// Builds a resolver over the configured directory.
    ///
    /// No directory connection is opened and no file is created; call
    /// [`ResolverContext::initialize`] to connect eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError`] when the directory cannot be opened.
    pub fn resolver(&self) -> Result<ResolverContext, DirectoryError> {
        let settings = self.names.resolver_settings();
        let context = match self.open_directory()? {
            Some(directory) => ResolverContext::new(
                directory.backend(),
                self.pool.pool_settings(),
                self.pool.retry_policy(),
                settings,
            ),
            None => ResolverContext::without_directory(settings),
        };
        Ok(context)
    }
}
