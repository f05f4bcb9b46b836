// crates/hongd-core/src/runtime/resolver.rs
// ============================================================================
// Module: HONGD Name Resolver
// Description: Human-name resolution policy with root extension and legacy fallback.
// Purpose: Turn caller-supplied names into GDP names and report how.
// Dependencies: arc-swap, tracing, crate::runtime::query
// ============================================================================

//! ## Overview
//! [`ResolverContext`] owns the pooled query engine, the optional name root,
//! and the legacy-hash switch. Resolution tries candidates strictly in order:
//!
//! 1. a 43-character printable name is decoded with no directory call;
//! 2. a dotted name, or any name when no root is set, is looked up as given;
//! 3. with a root, `root.name` is looked up;
//! 4. with a root and an undotted name, the bare name is looked up;
//! 5. when enabled, the SHA-256 of the root-extended (undotted input) or
//!    original name is returned as a warning-level result.
//!
//! The name root is held in an [`ArcSwapOption`] so it can be replaced while
//! resolutions are running; each resolution reads it once.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::core::error::NameError;
use crate::core::hashing::legacy_sha256;
use crate::core::name::GDP_PNAME_LEN;
use crate::core::name::GdpName;
use crate::core::name::decode_internal;
use crate::core::resolution::Resolution;
use crate::core::resolution::ResolutionKind;
use crate::interfaces::DirectoryBackend;
use crate::interfaces::DirectorySession;
use crate::interfaces::SessionError;
use crate::interfaces::SharedDirectoryBackend;
use crate::runtime::pool::ConnectionPool;
use crate::runtime::pool::PoolSettings;
use crate::runtime::pool::PoolStats;
use crate::runtime::query::DirectoryQuery;
use crate::runtime::query::RetryPolicy;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Resolution policy settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Namespace prefix for undotted names; empty is treated as unset.
    pub name_root: Option<String>,
    /// Whether the legacy SHA-256 fallback is enabled.
    pub legacy_sha256: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            name_root: None,
            legacy_sha256: true,
        }
    }
}

// ============================================================================
// SECTION: Resolver Context
// ============================================================================

/// Explicit resolver state: pool, query engine, name root, and policy.
pub struct ResolverContext {
    /// Pooled query engine.
    query: DirectoryQuery,
    /// Current name root.
    name_root: ArcSwapOption<String>,
    /// Whether the legacy SHA-256 fallback is enabled.
    legacy_sha256: bool,
}

impl ResolverContext {
    /// Builds a resolver over `backend`. No session is opened until the
    /// first lookup or [`ResolverContext::initialize`].
    #[must_use]
    pub fn new(
        backend: SharedDirectoryBackend,
        pool: PoolSettings,
        retry: RetryPolicy,
        settings: ResolverSettings,
    ) -> Self {
        let pool = ConnectionPool::new(backend, pool);
        Self {
            query: DirectoryQuery::new(pool, retry),
            name_root: ArcSwapOption::from_pointee(normalize_root(settings.name_root.as_deref())),
            legacy_sha256: settings.legacy_sha256,
        }
    }

    /// Builds a resolver with no directory; every lookup reports
    /// [`NameError::PoolUnavailable`].
    #[must_use]
    pub fn without_directory(settings: ResolverSettings) -> Self {
        Self::new(
            Arc::new(NoDirectory),
            PoolSettings::disabled(),
            RetryPolicy::default(),
            settings,
        )
    }

    /// Opens one connection eagerly so configuration errors surface now.
    ///
    /// On failure the pool is disabled and every later lookup fails fast.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::PoolUnavailable`] when the backend cannot be
    /// opened or the pool is already disabled.
    pub fn initialize(&self) -> Result<(), NameError> {
        let pool = self.query.pool();
        match pool.acquire(true) {
            Ok(conn) => {
                drop(conn);
                tracing::debug!(backend = %pool.describe(), "directory pool initialized");
                Ok(())
            }
            Err(err) => {
                pool.disable();
                tracing::warn!(
                    backend = %pool.describe(),
                    error = %err,
                    "directory unavailable; disabling pool"
                );
                Err(err)
            }
        }
    }

    /// Resolves a human name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::NameInvalid`] for an empty name. With the legacy
    /// fallback disabled, returns [`NameError::NameUnknown`] when every
    /// lookup reported absence, or the last availability error otherwise.
    pub fn resolve(&self, human_name: &str) -> Result<Resolution, NameError> {
        if human_name.is_empty() {
            return Err(NameError::NameInvalid("empty human name".to_string()));
        }
        if human_name.len() == GDP_PNAME_LEN
            && let Ok(name) = decode_internal(human_name)
        {
            return Ok(resolved(name, ResolutionKind::DirectPrintable, human_name));
        }

        let root = self.name_root.load_full();
        let dotted = human_name.contains('.');
        let mut failure = None;

        if (dotted || root.is_none())
            && let Some(name) = self.try_lookup(human_name, &mut failure)
        {
            return Ok(resolved(name, ResolutionKind::Hongd, human_name));
        }

        let extended = root.map(|root| format!("{root}.{human_name}"));
        if let Some(extended) = extended.as_deref() {
            if let Some(name) = self.try_lookup(extended, &mut failure) {
                return Ok(resolved(name, ResolutionKind::Hongd, extended));
            }
            if !dotted
                && let Some(name) = self.try_lookup(human_name, &mut failure)
            {
                return Ok(resolved(name, ResolutionKind::Hongd, human_name));
            }
        }

        if self.legacy_sha256 {
            let effective = match extended.as_deref() {
                Some(extended) if !dotted => extended,
                _ => human_name,
            };
            tracing::info!(
                hname = human_name,
                xname = effective,
                "no directory entry; using legacy SHA-256 name"
            );
            return Ok(resolved(legacy_sha256(effective), ResolutionKind::LegacySha256, effective));
        }

        Err(failure.unwrap_or_else(|| NameError::NameUnknown(human_name.to_string())))
    }

    /// Returns the human name registered for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::NameInvalid`] for the all-zero sentinel,
    /// [`NameError::NameUnknown`] when the directory has no entry, and
    /// availability errors from the pool or backend.
    pub fn resolve_reverse(&self, name: &GdpName) -> Result<String, NameError> {
        if !name.is_valid() {
            return Err(NameError::NameInvalid("name is the unset sentinel".to_string()));
        }
        self.query.reverse_lookup(name)
    }

    /// Replaces the name root; `None` or an empty string clears it.
    pub fn set_name_root(&self, root: Option<&str>) {
        let root = normalize_root(root);
        tracing::debug!(root = root.as_deref().unwrap_or(""), "name root updated");
        self.name_root.store(root.map(Arc::new));
    }

    /// Returns the current name root.
    #[must_use]
    pub fn name_root(&self) -> Option<String> {
        self.name_root.load_full().map(|root| root.as_ref().clone())
    }

    /// Returns whether the legacy SHA-256 fallback is enabled.
    #[must_use]
    pub const fn legacy_sha256(&self) -> bool {
        self.legacy_sha256
    }

    /// Returns the query engine.
    #[must_use]
    pub const fn query(&self) -> &DirectoryQuery {
        &self.query
    }

    /// Returns pool counters.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.query.pool().stats()
    }

    /// Closes idle connections and disables the pool.
    pub fn shutdown(&self) -> usize {
        self.query.pool().shutdown()
    }

    /// Runs one lookup, recording availability failures and absorbing absence.
    fn try_lookup(&self, candidate: &str, failure: &mut Option<NameError>) -> Option<GdpName> {
        match self.query.lookup_by_name(candidate) {
            Ok(name) => Some(name),
            Err(err) => {
                tracing::debug!(candidate, error = %err, "directory lookup missed");
                if !err.is_absence() {
                    *failure = Some(err);
                }
                None
            }
        }
    }
}

/// Builds a resolution record.
fn resolved(name: GdpName, kind: ResolutionKind, xname: &str) -> Resolution {
    tracing::debug!(xname, kind = kind.as_str(), "name resolved");
    Resolution {
        name,
        kind,
        xname: xname.to_string(),
    }
}

/// Maps an empty root to `None`.
fn normalize_root(root: Option<&str>) -> Option<String> {
    root.filter(|root| !root.is_empty()).map(str::to_string)
}

// ============================================================================
// SECTION: No Directory
// ============================================================================

/// Backend used when no directory is configured.
struct NoDirectory;

impl DirectoryBackend for NoDirectory {
    fn open(&self) -> Result<Box<dyn DirectorySession>, SessionError> {
        Err(SessionError::Fatal("no directory configured".to_string()))
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}
