// crates/hongd-store-sqlite/tests/sqlite_directory.rs
// ============================================================================
// Module: SQLite Directory Tests
// Description: Schema setup, admin operations, and pooled lookups on SQLite.
// Purpose: Validate path safety, schema versioning, record management, and
//          resolution through the core resolver.
// ============================================================================

//! ## Overview
//! Integration tests for [`hongd_store_sqlite::SqliteDirectory`]:
//! - Path and table-name validation
//! - Schema creation and version checks, and no file creation outside it
//! - Insert, duplicate rejection, and delete row counts
//! - Forward and reverse resolution through a pooled resolver
//! - Malformed rows and fatal query errors

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

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hongd_core::GdpName;
use hongd_core::NameError;
use hongd_core::PoolSettings;
use hongd_core::ResolutionKind;
use hongd_core::ResolverContext;
use hongd_core::ResolverSettings;
use hongd_core::RetryPolicy;
use hongd_core::legacy_sha256;
use hongd_store_sqlite::SqliteDirectory;
use hongd_store_sqlite::SqliteDirectoryConfig;
use hongd_store_sqlite::SqliteDirectoryError;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn directory_in(dir: &TempDir) -> SqliteDirectory {
    let directory =
        SqliteDirectory::new(SqliteDirectoryConfig::new(dir.path().join("hongd.sqlite3"))).unwrap();
    directory.ensure_schema().unwrap();
    directory
}

fn resolver_over(directory: &SqliteDirectory, root: Option<&str>, legacy: bool) -> ResolverContext {
    ResolverContext::new(
        Arc::new(directory.clone()),
        PoolSettings::new(2, Duration::from_millis(1)),
        RetryPolicy::new(3, Duration::from_millis(1)),
        ResolverSettings {
            name_root: root.map(str::to_string),
            legacy_sha256: legacy,
        },
    )
}

fn raw_connection(path: &Path) -> Connection {
    Connection::open(path).unwrap()
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn rejects_invalid_table_name() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteDirectoryConfig::new(dir.path().join("hongd.sqlite3"));
    config.table = "names; DROP TABLE store_meta".to_string();
    assert!(matches!(SqliteDirectory::new(config), Err(SqliteDirectoryError::Invalid(_))));
}

#[test]
fn rejects_directory_path() {
    let dir = TempDir::new().unwrap();
    let config = SqliteDirectoryConfig::new(dir.path());
    assert!(matches!(SqliteDirectory::new(config), Err(SqliteDirectoryError::Invalid(_))));
}

#[test]
fn rejects_overlong_path_component() {
    let dir = TempDir::new().unwrap();
    let config = SqliteDirectoryConfig::new(dir.path().join("a".repeat(300)));
    assert!(matches!(SqliteDirectory::new(config), Err(SqliteDirectoryError::Invalid(_))));
}

#[test]
fn construction_leaves_filesystem_untouched() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("nested");
    SqliteDirectory::new(SqliteDirectoryConfig::new(nested.join("hongd.sqlite3"))).unwrap();
    assert!(!nested.exists());
}

#[test]
fn ensure_schema_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("hongd.sqlite3");
    let directory = SqliteDirectory::new(SqliteDirectoryConfig::new(&path)).unwrap();
    directory.ensure_schema().unwrap();
    assert!(path.exists());
}

#[test]
fn rejects_unknown_schema_version() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    let path = directory.config().path.clone();
    raw_connection(&path).execute("UPDATE store_meta SET version = ?1", params![99_i64]).unwrap();
    let reopened = SqliteDirectory::new(SqliteDirectoryConfig::new(&path)).unwrap();
    let err = reopened.ensure_schema().unwrap_err();
    assert!(matches!(err, SqliteDirectoryError::VersionMismatch(_)));
}

#[test]
fn admin_operations_do_not_create_missing_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hongd.sqlite3");
    let directory = SqliteDirectory::new(SqliteDirectoryConfig::new(&path)).unwrap();
    assert!(matches!(
        directory.insert("widget", &GdpName::from_bytes([7; 32])),
        Err(SqliteDirectoryError::Db(_))
    ));
    assert!(matches!(directory.delete("widget"), Err(SqliteDirectoryError::Db(_))));
    assert!(!path.exists());
}

#[test]
fn reopening_existing_database_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    directory.insert("widget", &GdpName::from_bytes([1; 32])).unwrap();
    let reopened = directory_in(&dir);
    assert_eq!(reopened.delete("widget").unwrap(), 1);
}

// ============================================================================
// SECTION: Admin Operations
// ============================================================================

#[test]
fn duplicate_insert_is_rejected() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    let name = GdpName::from_bytes([2; 32]);
    directory.insert("widget", &name).unwrap();
    assert!(matches!(directory.insert("widget", &name), Err(SqliteDirectoryError::Db(_))));
}

#[test]
fn insert_rejects_sentinel_and_empty_name() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    assert!(matches!(
        directory.insert("widget", &GdpName::INVALID),
        Err(SqliteDirectoryError::Invalid(_))
    ));
    assert!(matches!(
        directory.insert("", &GdpName::from_bytes([3; 32])),
        Err(SqliteDirectoryError::Invalid(_))
    ));
}

#[test]
fn delete_reports_matched_rows() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    directory.insert("widget", &GdpName::from_bytes([4; 32])).unwrap();
    assert_eq!(directory.delete("widget").unwrap(), 1);
    assert_eq!(directory.delete("widget").unwrap(), 0);
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

#[test]
fn resolver_finds_rooted_record() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    let name = GdpName::from_bytes([5; 32]);
    directory.insert("org.example.widget", &name).unwrap();
    let ctx = resolver_over(&directory, Some("org.example"), false);
    ctx.initialize().unwrap();

    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.name, name);
    assert_eq!(resolution.kind, ResolutionKind::Hongd);
    assert_eq!(ctx.resolve_reverse(&name).unwrap(), "org.example.widget");
    assert!(matches!(ctx.resolve("gadget"), Err(NameError::NameUnknown(_))));
}

#[test]
fn text_encoded_names_are_accepted() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    let path = directory.config().path.clone();
    let text = "a".repeat(32);
    raw_connection(&path)
        .execute("INSERT INTO human_to_gdp (hname, gname) VALUES (?1, ?2)", params!["textual", text])
        .unwrap();
    let ctx = resolver_over(&directory, None, false);
    assert_eq!(ctx.resolve("textual").unwrap().name, GdpName::from_bytes([b'a'; 32]));
}

#[test]
fn malformed_rows_resolve_as_unknown() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    let path = directory.config().path.clone();
    raw_connection(&path)
        .execute(
            "INSERT INTO human_to_gdp (hname, gname) VALUES (?1, ?2)",
            params!["short", vec![1_u8, 2, 3]],
        )
        .unwrap();
    let ctx = resolver_over(&directory, None, false);
    assert!(matches!(ctx.resolve("short"), Err(NameError::NameUnknown(_))));
}

#[test]
fn missing_table_is_a_backend_error() {
    let dir = TempDir::new().unwrap();
    let directory = directory_in(&dir);
    let path = directory.config().path.clone();
    raw_connection(&path).execute_batch("DROP TABLE human_to_gdp").unwrap();
    let ctx = resolver_over(&directory, None, false);
    assert!(matches!(ctx.resolve("widget"), Err(NameError::BackendError(_))));
    assert_eq!(ctx.pool_stats().idle, 1);
}

#[test]
fn custom_table_name_is_used() {
    let dir = TempDir::new().unwrap();
    let mut config = SqliteDirectoryConfig::new(dir.path().join("hongd.sqlite3"));
    config.table = "names_v2".to_string();
    let directory = SqliteDirectory::new(config).unwrap();
    directory.ensure_schema().unwrap();
    let name = GdpName::from_bytes([6; 32]);
    directory.insert("widget", &name).unwrap();
    let ctx = resolver_over(&directory, None, false);
    assert_eq!(ctx.resolve("widget").unwrap().name, name);
}

#[test]
fn missing_database_falls_back_to_legacy_without_creating_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent").join("hongd.sqlite3");
    let directory = SqliteDirectory::new(SqliteDirectoryConfig::new(&path)).unwrap();
    let ctx = resolver_over(&directory, Some("org.example"), true);
    assert!(matches!(ctx.initialize(), Err(NameError::PoolUnavailable(_))));

    let resolution = ctx.resolve("widget").unwrap();
    assert_eq!(resolution.kind, ResolutionKind::LegacySha256);
    assert_eq!(resolution.name, legacy_sha256("org.example.widget"));
    assert!(!path.exists());
    assert!(!dir.path().join("absent").exists());
}
