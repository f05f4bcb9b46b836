// crates/hongd-config/src/lib.rs
// ============================================================================
// Module: HONGD Config
// Description: Configuration model and directory construction for HONGD.
// Purpose: Provide strict config parsing and turn it into a ready resolver.
// Dependencies: hongd-core, hongd-store-sqlite, hongd-store-postgres, toml
// ============================================================================

//! ## Overview
//! [`HongdConfig`] is loaded from TOML with hard size and path limits and
//! validated after parsing. [`ConfiguredDirectory`] opens the configured
//! backend for resolution or record administration.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod directory;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DirectoryConfig;
pub use config::DirectoryType;
pub use config::HongdConfig;
pub use config::NAME_ROOT_ENV_VAR;
pub use config::NamesConfig;
pub use config::PoolConfig;
pub use directory::ConfiguredDirectory;
pub use directory::DirectoryError;
