// crates/hongd-core/src/core/mod.rs
// ============================================================================
// Module: HONGD Core Types
// Description: Name codec, legacy hashing, resolution results, and errors.
// Purpose: Provide pure types shared by the runtime and the backends.
// Dependencies: base64, serde, sha2, thiserror
// ============================================================================

//! ## Overview
//! Core types carry no I/O and no shared state. Everything here is safe to
//! call from any thread.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod error;
pub mod hashing;
pub mod name;
pub mod resolution;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::NameError;
pub use hashing::legacy_sha256;
pub use name::GDP_HEX_NAME_LEN;
pub use name::GDP_NAME_LEN;
pub use name::GDP_PNAME_LEN;
pub use name::GdpName;
pub use name::decode_internal;
pub use name::encode_printable;
pub use name::from_hex;
pub use name::is_valid;
pub use name::to_hex;
pub use resolution::Resolution;
pub use resolution::ResolutionKind;
