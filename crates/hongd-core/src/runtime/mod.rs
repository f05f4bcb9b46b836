// crates/hongd-core/src/runtime/mod.rs
// ============================================================================
// Module: HONGD Runtime
// Description: Connection pool, query engine, resolver, and in-memory backend.
// Purpose: Execute name resolution against a directory backend.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime components are blocking and thread-safe. A [`ResolverContext`]
//! is constructed once and shared by reference across resolving threads.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod memory;
pub mod pool;
pub mod query;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use memory::InMemoryDirectory;
pub use pool::Connection;
pub use pool::ConnectionPhase;
pub use pool::ConnectionPool;
pub use pool::DEFAULT_MAX_CONNECTIONS;
pub use pool::DEFAULT_OPEN_BACKOFF;
pub use pool::PoolSettings;
pub use pool::PoolStats;
pub use pool::PooledConnection;
pub use query::DEFAULT_BACKOFF;
pub use query::DEFAULT_MAX_TRIES;
pub use query::DirectoryQuery;
pub use query::RetryPolicy;
pub use resolver::ResolverContext;
pub use resolver::ResolverSettings;
