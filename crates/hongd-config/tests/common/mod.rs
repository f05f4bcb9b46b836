// crates/hongd-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for hongd-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::fs;
use std::path::PathBuf;

use hongd_config::ConfigError;
use hongd_config::HongdConfig;
use tempfile::TempDir;

/// Result type for tests that report failures as strings.
pub type TestResult = Result<(), String>;

/// Parses and validates a TOML string.
pub fn validated(toml_str: &str) -> Result<HongdConfig, ConfigError> {
    let mut config = HongdConfig::from_toml(toml_str)?;
    config.validate()?;
    Ok(config)
}

/// Writes `content` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> Result<PathBuf, String> {
    let path = dir.path().join(name);
    fs::write(&path, content).map_err(|err| err.to_string())?;
    Ok(path)
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
