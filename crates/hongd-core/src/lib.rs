// crates/hongd-core/src/lib.rs
// ============================================================================
// Module: HONGD Core Library
// Description: Public API surface for the HONGD resolver core.
// Purpose: Expose the name codec, backend interfaces, and runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! HONGD translates human-oriented names into 32-byte GDP names through an
//! external directory. The core is backend-agnostic: directories plug in
//! through [`DirectoryBackend`], and resolution runs through an explicit
//! [`ResolverContext`] rather than process-wide state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::DEFAULT_DIRECTORY_TABLE;
pub use interfaces::DirectoryBackend;
pub use interfaces::DirectorySession;
pub use interfaces::SessionError;
pub use interfaces::SharedDirectoryBackend;
pub use interfaces::is_valid_table_name;
pub use runtime::ConnectionPhase;
pub use runtime::ConnectionPool;
pub use runtime::DirectoryQuery;
pub use runtime::InMemoryDirectory;
pub use runtime::PoolSettings;
pub use runtime::PoolStats;
pub use runtime::PooledConnection;
pub use runtime::ResolverContext;
pub use runtime::ResolverSettings;
pub use runtime::RetryPolicy;
