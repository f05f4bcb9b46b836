// crates/hongd-cli/src/lib.rs
// ============================================================================
// Module: HONGD CLI Library
// Description: Shared helpers for the HONGD command-line interface.
// Purpose: Provide the message catalog and name reports for the binary and tests.
// Dependencies: hongd-core
// ============================================================================

//! ## Overview
//! This library houses the message catalog and the name translation report
//! used by `hongd xlate`. The binary entry point (`src/main.rs`) imports
//! these helpers to keep all user-facing output consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Internationalization helpers and message catalog.
pub mod i18n;
/// Name translation reports.
pub mod xlate;
