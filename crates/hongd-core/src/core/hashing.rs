// crates/hongd-core/src/core/hashing.rs
// ============================================================================
// Module: HONGD Legacy Hashing
// Description: SHA-256 derivation of GDP names from human names.
// Purpose: Reproduce names written before the directory existed.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Before the HONGD directory existed, a GDP name was the SHA-256 digest of
//! the raw bytes of its human name. The resolver falls back to this form when
//! the directory has no entry, and reports it as a warning-level result since
//! it is not directory-verified.

// ============================================================================
// SECTION: Imports
// ============================================================================

use sha2::Digest;
use sha2::Sha256;

use crate::core::name::GDP_NAME_LEN;
use crate::core::name::GdpName;

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Computes the legacy SHA-256 name for a human name.
#[must_use]
pub fn legacy_sha256(human_name: &str) -> GdpName {
    let mut hasher = Sha256::new();
    hasher.update(human_name.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; GDP_NAME_LEN];
    bytes.copy_from_slice(&digest);
    GdpName::from_bytes(bytes)
}
