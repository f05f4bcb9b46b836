// crates/hongd-core/src/core/resolution.rs
// ============================================================================
// Module: HONGD Resolution Results
// Description: Outcome of resolving a human name.
// Purpose: Record which policy path produced a name.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Resolution`] pairs the resolved [`GdpName`] with the
//! [`ResolutionKind`] that produced it and the candidate name that was
//! actually used. Callers warn on [`ResolutionKind::LegacySha256`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::name::GdpName;

// ============================================================================
// SECTION: Resolution Kind
// ============================================================================

/// Policy path that produced a resolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// The input was already a printable name.
    DirectPrintable,
    /// The directory returned the name.
    Hongd,
    /// The name was derived by hashing the human name.
    LegacySha256,
}

impl ResolutionKind {
    /// Returns the stable label for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectPrintable => "printable",
            Self::Hongd => "HONGD",
            Self::LegacySha256 => "SHA256",
        }
    }

    /// Returns true when the result is not directory-verified.
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::LegacySha256)
    }
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolved name plus provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Resolved internal name.
    pub name: GdpName,
    /// Path that produced the name.
    pub kind: ResolutionKind,
    /// Candidate string that produced the name (root-extended when applicable).
    pub xname: String,
}
