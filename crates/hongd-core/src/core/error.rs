// crates/hongd-core/src/core/error.rs
// ============================================================================
// Module: HONGD Name Errors
// Description: Error taxonomy shared by the codec, pool, query engine, and resolver.
// Purpose: Distinguish malformed input, absence, and inability-to-ask.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every fallible HONGD operation returns [`NameError`]. Callers decide how
//! to surface each variant; the core never terminates the process.
//!
//! - `NameInvalid` and codec errors are deterministic and never retried.
//! - `NameUnknown` is a definitive negative from the directory.
//! - `PoolUnavailable`, `PoolTimeout`, and `BackendError` mean the directory
//!   could not be asked, which is a service-health signal rather than a
//!   per-name failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while encoding, decoding, or resolving GDP names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Input is empty or otherwise malformed.
    #[error("invalid name: {0}")]
    NameInvalid(String),
    /// Every resolution path was exhausted without a result.
    #[error("name unknown: {0}")]
    NameUnknown(String),
    /// The directory pool is disabled or could not open a connection.
    #[error("directory pool unavailable: {0}")]
    PoolUnavailable(String),
    /// A deadline elapsed while waiting for a pooled connection.
    #[error("timed out waiting for a directory connection")]
    PoolTimeout,
    /// A directory query failed after exhausting retries.
    #[error("directory backend error: {0}")]
    BackendError(String),
    /// Printable encoding produced an unexpected length.
    #[error("name encode error: {0}")]
    EncodeError(String),
    /// Printable decoding failed.
    #[error("name decode error: {0}")]
    DecodeError(String),
    /// Hex form is malformed.
    #[error("name format error: {0}")]
    FormatError(String),
}

impl NameError {
    /// Returns true when the error reports absence rather than a failure to ask.
    #[must_use]
    pub const fn is_absence(&self) -> bool {
        matches!(self, Self::NameUnknown(_))
    }

    /// Returns true when the error means the directory could not be consulted.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::PoolUnavailable(_) | Self::PoolTimeout | Self::BackendError(_))
    }

    /// Returns the HTTP status a REST front end should report for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::NameInvalid(_) | Self::DecodeError(_) | Self::FormatError(_) => 400,
            Self::NameUnknown(_) => 404,
            Self::PoolUnavailable(_) | Self::PoolTimeout => 503,
            Self::BackendError(_) | Self::EncodeError(_) => 500,
        }
    }
}
