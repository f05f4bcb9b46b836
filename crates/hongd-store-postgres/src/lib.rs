// crates/hongd-store-postgres/src/lib.rs
// ============================================================================
// Module: HONGD Postgres Directory
// Description: Postgres-backed HONGD directory.
// Purpose: Provide a shared, networked directory backend.
// Dependencies: hongd-core, postgres
// ============================================================================

//! ## Overview
//! This crate implements [`hongd_core::DirectoryBackend`] over a Postgres
//! table. Each pooled session owns one blocking client connection; pooling
//! and retry are handled by the core connection pool.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod directory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use directory::PostgresDirectory;
pub use directory::PostgresDirectoryConfig;
pub use directory::PostgresDirectoryError;
