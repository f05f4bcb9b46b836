// crates/hongd-core/tests/resolver.rs
// ============================================================================
// Module: Name Resolver Tests
// Description: Resolution order, root extension, and legacy fallback.
// Purpose: Validate exactly which candidates are queried and which result
//          kind is reported for each path.
// ============================================================================

//! ## Overview
//! Integration tests for [`hongd_core::ResolverContext`]:
//! - Printable fast path without directory access
//! - Candidate order with and without a name root
//! - Legacy SHA-256 fallback and its effective name
//! - Error surfacing with the fallback disabled
//! - Initialization, reverse lookup, and root reconfiguration

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod support;

use std::sync::Arc;
use std::thread;

use hongd_core::GDP_PNAME_LEN;
use hongd_core::InMemoryDirectory;
use hongd_core::NameError;
use hongd_core::PoolSettings;
use hongd_core::ResolutionKind;
use hongd_core::ResolverContext;
use hongd_core::ResolverSettings;
use hongd_core::SessionError;
use hongd_core::legacy_sha256;
use sha2::Digest;
use sha2::Sha256;

use crate::support::ScriptedDirectory;
use crate::support::fast_retry;
use crate::support::filled_name;
use crate::support::resolver;

// ============================================================================
// SECTION: Fast Path
// ============================================================================

#[test]
fn printable_name_resolves_without_backend_calls() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, Some("org.example"), true);
    let name = filled_name(0x42);

    let resolution = ctx.resolve(&name.to_printable()).unwrap();
    assert_eq!(resolution.name, name);
    assert_eq!(resolution.kind, ResolutionKind::DirectPrintable);
    assert!(directory.lookups().is_empty());
    assert_eq!(directory.opens(), 0);
}

#[test]
fn undecodable_43_character_name_falls_through_to_directory() {
    let text = "!".repeat(GDP_PNAME_LEN);
    let name = filled_name(0x07);
    let directory = ScriptedDirectory::new().with_record(&text, name);
    let ctx = resolver(&directory, None, false);

    let resolution = ctx.resolve(&text).unwrap();
    assert_eq!(resolution.kind, ResolutionKind::Hongd);
    assert_eq!(directory.lookups(), vec![text]);
}

#[test]
fn empty_name_is_invalid() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, None, true);
    assert!(matches!(ctx.resolve(""), Err(NameError::NameInvalid(_))));
    assert!(directory.lookups().is_empty());
}

// ============================================================================
// SECTION: Candidate Order
// ============================================================================

#[test]
fn rooted_undotted_name_tries_extended_name_first() {
    let name = filled_name(0x01);
    let directory = ScriptedDirectory::new().with_record("org.example.widget", name);
    let ctx = resolver(&directory, Some("org.example"), true);

    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.name, name);
    assert_eq!(resolution.kind, ResolutionKind::Hongd);
    assert_eq!(resolution.xname, "org.example.widget");
    assert_eq!(directory.lookups(), vec!["org.example.widget".to_string()]);
}

#[test]
fn unrooted_name_is_queried_exactly_once() {
    let name = filled_name(0x01);
    let directory = ScriptedDirectory::new().with_record("widget", name);
    let ctx = resolver(&directory, None, true);

    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.kind, ResolutionKind::Hongd);
    assert_eq!(directory.lookups(), vec!["widget".to_string()]);
}

#[test]
fn rooted_undotted_name_falls_back_to_bare_name() {
    let name = filled_name(0x09);
    let directory = ScriptedDirectory::new().with_record("widget", name);
    let ctx = resolver(&directory, Some("org.example"), false);

    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.name, name);
    assert_eq!(resolution.xname, "widget");
    assert_eq!(
        directory.lookups(),
        vec!["org.example.widget".to_string(), "widget".to_string()]
    );
}

#[test]
fn rooted_dotted_name_tries_as_given_then_extended_only() {
    let name = filled_name(0x0a);
    let directory = ScriptedDirectory::new().with_record("org.example.lab.sensor", name);
    let ctx = resolver(&directory, Some("org.example"), false);

    let resolution = ctx.resolve("lab.sensor").unwrap();
    assert_eq!(resolution.name, name);
    assert_eq!(
        directory.lookups(),
        vec!["lab.sensor".to_string(), "org.example.lab.sensor".to_string()]
    );
}

// ============================================================================
// SECTION: Legacy Fallback
// ============================================================================

#[test]
fn legacy_fallback_hashes_literal_name_without_root() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, None, true);

    let resolution = ctx.resolve("legacyname").unwrap();
    let digest = Sha256::digest(b"legacyname");
    assert_eq!(resolution.name.as_bytes().as_slice(), digest.as_slice());
    assert_eq!(resolution.kind, ResolutionKind::LegacySha256);
    assert!(resolution.kind.is_warning());
    assert_eq!(directory.lookups(), vec!["legacyname".to_string()]);
}

#[test]
fn legacy_fallback_hashes_extended_name_for_undotted_input() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, Some("org.example"), true);

    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.name, legacy_sha256("org.example.widget"));
    assert_eq!(resolution.xname, "org.example.widget");
}

#[test]
fn legacy_fallback_hashes_original_dotted_name() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, Some("org.example"), true);

    let resolution = ctx.resolve("lab.sensor").unwrap();
    assert_eq!(resolution.name, legacy_sha256("lab.sensor"));
    assert_eq!(resolution.xname, "lab.sensor");
}

#[test]
fn disabled_legacy_fallback_reports_unknown() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, Some("org.example"), false);
    assert!(matches!(ctx.resolve("widget"), Err(NameError::NameUnknown(_))));
}

#[test]
fn disabled_legacy_fallback_surfaces_backend_errors() {
    let directory = ScriptedDirectory::new()
        .fail_always(SessionError::Transient("connection refused".to_string()));
    let ctx = resolver(&directory, None, false);
    assert!(matches!(ctx.resolve("widget"), Err(NameError::BackendError(_))));
    assert_eq!(ctx.pool_stats().idle, 1);
}

#[test]
fn backend_errors_still_reach_legacy_fallback() {
    let directory = ScriptedDirectory::new()
        .fail_always(SessionError::Fatal("permission denied".to_string()));
    let ctx = resolver(&directory, None, true);
    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.kind, ResolutionKind::LegacySha256);
}

// ============================================================================
// SECTION: Initialization and Configuration
// ============================================================================

#[test]
fn failed_initialization_disables_pool() {
    let directory = ScriptedDirectory::new();
    directory.set_open_failure(Some(SessionError::Fatal("unknown host".to_string())));
    let ctx = resolver(&directory, None, false);

    assert!(matches!(ctx.initialize(), Err(NameError::PoolUnavailable(_))));
    assert!(ctx.pool_stats().disabled);
    directory.set_open_failure(None);
    assert!(matches!(ctx.resolve("widget"), Err(NameError::PoolUnavailable(_))));
    assert_eq!(directory.opens(), 0);
}

#[test]
fn successful_initialization_leaves_one_idle_connection() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, None, true);
    ctx.initialize().unwrap();
    let stats = ctx.pool_stats();
    assert_eq!(stats.n_allocated, 1);
    assert_eq!(stats.idle, 1);
    assert_eq!(ctx.shutdown(), 1);
}

#[test]
fn resolver_without_directory_uses_legacy_names() {
    let ctx = ResolverContext::without_directory(ResolverSettings::default());
    assert!(ctx.initialize().is_err());
    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.kind, ResolutionKind::LegacySha256);
    assert_eq!(resolution.name, legacy_sha256("widget"));
}

#[test]
fn name_root_can_be_replaced_and_cleared() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, Some("org.example"), true);
    assert_eq!(ctx.name_root().as_deref(), Some("org.example"));

    ctx.set_name_root(Some("edu.berkeley"));
    assert_eq!(ctx.resolve("widget").unwrap().xname, "edu.berkeley.widget");

    ctx.set_name_root(Some(""));
    assert_eq!(ctx.name_root(), None);
    assert_eq!(ctx.resolve("widget").unwrap().xname, "widget");
}

#[test]
fn root_swaps_during_concurrent_resolution_are_safe() {
    let directory = InMemoryDirectory::new();
    directory.insert("a.widget", &filled_name(0x0a));
    directory.insert("b.widget", &filled_name(0x0b));
    let ctx = ResolverContext::new(
        Arc::new(directory),
        PoolSettings::default(),
        fast_retry(3),
        ResolverSettings {
            name_root: Some("a".to_string()),
            legacy_sha256: false,
        },
    );

    thread::scope(|scope| {
        for _ in 0 .. 4 {
            scope.spawn(|| {
                for _ in 0 .. 50 {
                    let resolution = ctx.resolve("widget").unwrap();
                    let expected = if resolution.xname == "a.widget" { 0x0a } else { 0x0b };
                    assert_eq!(resolution.name, filled_name(expected));
                }
            });
        }
        for index in 0 .. 50 {
            ctx.set_name_root(Some(if index % 2 == 0 { "b" } else { "a" }));
            thread::yield_now();
        }
    });
}

// ============================================================================
// SECTION: Reverse Resolution
// ============================================================================

#[test]
fn reverse_resolution_returns_human_name() {
    let name = filled_name(0x5c);
    let directory = ScriptedDirectory::new().with_record("org.example.widget", name);
    let ctx = resolver(&directory, None, true);

    assert_eq!(ctx.resolve_reverse(&name).unwrap(), "org.example.widget");
    assert!(matches!(ctx.resolve_reverse(&filled_name(0x01)), Err(NameError::NameUnknown(_))));
}

#[test]
fn reverse_resolution_rejects_sentinel() {
    let directory = ScriptedDirectory::new();
    let ctx = resolver(&directory, None, true);
    assert!(matches!(
        ctx.resolve_reverse(&hongd_core::GdpName::INVALID),
        Err(NameError::NameInvalid(_))
    ));
    assert_eq!(directory.reverse_lookups(), 0);
}
