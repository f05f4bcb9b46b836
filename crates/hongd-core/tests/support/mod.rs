// crates/hongd-core/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Scripted directory backend shared by runtime integration tests.
// ============================================================================
//! ## Overview
//! [`ScriptedDirectory`] records every lookup, reset, and open, and can be
//! scripted to fail opens or queries so retry, pool, and resolver behavior
//! can be asserted exactly.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]
#![allow(dead_code, reason = "Not every test binary uses every helper.")]

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use hongd_core::DirectoryBackend;
use hongd_core::DirectorySession;
use hongd_core::GdpName;
use hongd_core::PoolSettings;
use hongd_core::ResolverContext;
use hongd_core::ResolverSettings;
use hongd_core::RetryPolicy;
use hongd_core::SessionError;

// ========================================================================
// Scripted Directory
// ========================================================================

/// Mutable script and counters shared by a directory and its sessions.
#[derive(Default)]
struct Script {
    /// Human name to stored bytes.
    records: BTreeMap<String, Vec<u8>>,
    /// Errors returned by the next queries, in order.
    queued_failures: VecDeque<SessionError>,
    /// Error returned by every query once the queue is empty.
    persistent_failure: Option<SessionError>,
    /// Error returned by every open.
    open_failure: Option<SessionError>,
    /// Every forward lookup key, in call order.
    lookups: Vec<String>,
    /// Number of reverse lookups.
    reverse_lookups: usize,
    /// Number of session resets.
    resets: usize,
    /// Number of successful opens.
    opens: usize,
}

/// Directory backend whose behavior is scripted by the test.
#[derive(Clone, Default)]
pub struct ScriptedDirectory {
    /// Shared script.
    script: Arc<Mutex<Script>>,
}

impl ScriptedDirectory {
    /// Creates an empty directory that answers every lookup with absence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record.
    pub fn with_record(self, human_name: &str, name: GdpName) -> Self {
        self.script.lock().unwrap().records.insert(human_name.to_string(), name.as_bytes().to_vec());
        self
    }

    /// Registers a record whose stored value is arbitrary bytes.
    pub fn with_raw_record(self, human_name: &str, bytes: Vec<u8>) -> Self {
        self.script.lock().unwrap().records.insert(human_name.to_string(), bytes);
        self
    }

    /// Makes the next `count` queries fail with `err`.
    pub fn fail_next(self, count: usize, err: &SessionError) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            for _ in 0 .. count {
                script.queued_failures.push_back(err.clone());
            }
        }
        self
    }

    /// Makes every query fail with `err`.
    pub fn fail_always(self, err: SessionError) -> Self {
        self.script.lock().unwrap().persistent_failure = Some(err);
        self
    }

    /// Makes every open fail, or succeed again with `None`.
    pub fn set_open_failure(&self, err: Option<SessionError>) {
        self.script.lock().unwrap().open_failure = err;
    }

    /// Returns every forward lookup key in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.script.lock().unwrap().lookups.clone()
    }

    /// Returns the number of reverse lookups.
    pub fn reverse_lookups(&self) -> usize {
        self.script.lock().unwrap().reverse_lookups
    }

    /// Returns the number of session resets.
    pub fn resets(&self) -> usize {
        self.script.lock().unwrap().resets
    }

    /// Returns the number of successful opens.
    pub fn opens(&self) -> usize {
        self.script.lock().unwrap().opens
    }

    /// Pops the next scripted query failure, if any.
    fn next_failure(script: &mut Script) -> Option<SessionError> {
        script.queued_failures.pop_front().or_else(|| script.persistent_failure.clone())
    }
}

impl DirectoryBackend for ScriptedDirectory {
    fn open(&self) -> Result<Box<dyn DirectorySession>, SessionError> {
        let mut script = self.script.lock().unwrap();
        if let Some(err) = script.open_failure.clone() {
            return Err(err);
        }
        script.opens += 1;
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
        }))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Session over the shared script.
struct ScriptedSession {
    /// Shared script.
    script: Arc<Mutex<Script>>,
}

impl DirectorySession for ScriptedSession {
    fn lookup_name(&mut self, human_name: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let mut script = self.script.lock().unwrap();
        script.lookups.push(human_name.to_string());
        if let Some(err) = ScriptedDirectory::next_failure(&mut script) {
            return Err(err);
        }
        Ok(script.records.get(human_name).cloned())
    }

    fn lookup_hname(&mut self, name: &GdpName) -> Result<Option<String>, SessionError> {
        let mut script = self.script.lock().unwrap();
        script.reverse_lookups += 1;
        if let Some(err) = ScriptedDirectory::next_failure(&mut script) {
            return Err(err);
        }
        Ok(script
            .records
            .iter()
            .find(|(_, bytes)| bytes.as_slice() == name.as_bytes())
            .map(|(human_name, _)| human_name.clone()))
    }

    fn reset(&mut self) -> Result<(), SessionError> {
        self.script.lock().unwrap().resets += 1;
        Ok(())
    }
}

// ========================================================================
// Helpers
// ========================================================================

/// Returns a name whose every byte is `byte`.
pub fn filled_name(byte: u8) -> GdpName {
    GdpName::from_bytes([byte; 32])
}

/// Returns a fast retry policy for tests.
pub fn fast_retry(max_tries: u32) -> RetryPolicy {
    RetryPolicy::new(max_tries, Duration::from_millis(1))
}

/// Builds a resolver over `directory` with the given root and legacy switch.
pub fn resolver(directory: &ScriptedDirectory, root: Option<&str>, legacy: bool) -> ResolverContext {
    ResolverContext::new(
        Arc::new(directory.clone()),
        PoolSettings::new(2, Duration::from_millis(1)),
        fast_retry(3),
        ResolverSettings {
            name_root: root.map(str::to_string),
            legacy_sha256: legacy,
        },
    )
}
