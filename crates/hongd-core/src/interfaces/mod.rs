// crates/hongd-core/src/interfaces/mod.rs
// ============================================================================
// Module: HONGD Backend Interfaces
// Description: Traits implemented by directory backends.
// Purpose: Decouple the pool and query engine from any database driver.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`DirectoryBackend`] opens [`DirectorySession`]s. A session answers two
//! exact-match queries and can reset its state in place after a transient
//! failure. Backends classify failures as [`SessionError::Transient`]
//! (retryable communication failure) or [`SessionError::Fatal`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::name::GdpName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default directory table name.
pub const DEFAULT_DIRECTORY_TABLE: &str = "human_to_gdp";

/// Maximum length of a directory table name.
pub const MAX_TABLE_NAME_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors reported by directory sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Communication failure worth retrying after a reset.
    #[error("transient directory error: {0}")]
    Transient(String),
    /// Failure that retrying will not fix.
    #[error("directory error: {0}")]
    Fatal(String),
}

impl SessionError {
    /// Returns true when the failure may succeed on retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

// ============================================================================
// SECTION: Directory Session
// ============================================================================

/// One live session to a directory backend.
///
/// Sessions are used by one thread at a time; the pool guarantees exclusive
/// ownership while checked out.
pub trait DirectorySession: Send {
    /// Looks up the internal name bytes stored for a human name.
    ///
    /// Returns `Ok(None)` when no row matches. The returned bytes are not
    /// length-checked here.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the query cannot be executed.
    fn lookup_name(&mut self, human_name: &str) -> Result<Option<Vec<u8>>, SessionError>;

    /// Looks up the human name stored for an internal name.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the query cannot be executed.
    fn lookup_hname(&mut self, name: &GdpName) -> Result<Option<String>, SessionError>;

    /// Resets session state without closing the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the reset fails.
    fn reset(&mut self) -> Result<(), SessionError>;
}

// ============================================================================
// SECTION: Directory Backend
// ============================================================================

/// Factory for directory sessions.
pub trait DirectoryBackend: Send + Sync {
    /// Opens a new session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the backend cannot be reached.
    fn open(&self) -> Result<Box<dyn DirectorySession>, SessionError>;

    /// Returns a short description for diagnostics (never includes secrets).
    fn describe(&self) -> String;
}

/// Shared handle to a directory backend.
pub type SharedDirectoryBackend = Arc<dyn DirectoryBackend>;

// ============================================================================
// SECTION: Table Names
// ============================================================================

/// Returns true when `name` is safe to embed in SQL as a table identifier.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to [`MAX_TABLE_NAME_LENGTH`] bytes.
#[must_use]
pub fn is_valid_table_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    let Some(first) = bytes.next() else {
        return false;
    };
    name.len() <= MAX_TABLE_NAME_LENGTH
        && (first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}
