// crates/hongd-store-sqlite/src/lib.rs
// ============================================================================
// Module: HONGD SQLite Directory
// Description: SQLite-backed HONGD directory.
// Purpose: Provide a local, file-based directory backend.
// Dependencies: hongd-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate implements [`hongd_core::DirectoryBackend`] over an `SQLite`
//! file. Each pooled session owns its own `SQLite` connection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod directory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use directory::SqliteDirectory;
pub use directory::SqliteDirectoryConfig;
pub use directory::SqliteDirectoryError;
pub use directory::SqliteJournalMode;
