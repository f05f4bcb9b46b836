// crates/hongd-core/src/runtime/memory.rs
// ============================================================================
// Module: HONGD In-Memory Directory
// Description: Simple in-memory directory backend for tests and local demos.
// Purpose: Provide a deterministic backend without external services.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryDirectory`] maps human names to stored name bytes. Clones share
//! one map, so records inserted through any clone are visible to every open
//! session. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::core::name::GdpName;
use crate::interfaces::DirectoryBackend;
use crate::interfaces::DirectorySession;
use crate::interfaces::SessionError;

// ============================================================================
// SECTION: In-Memory Directory
// ============================================================================

/// Record map shared by a directory and its sessions.
type RecordMap = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

/// In-memory directory backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    /// Human name to stored name bytes.
    records: RecordMap,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `human_name`; returns false if it already exists.
    pub fn insert(&self, human_name: impl Into<String>, name: &GdpName) -> bool {
        self.insert_raw(human_name, name.as_bytes().to_vec())
    }

    /// Registers raw stored bytes, which need not be a well-formed name.
    pub fn insert_raw(&self, human_name: impl Into<String>, bytes: Vec<u8>) -> bool {
        let mut records = lock(&self.records);
        let human_name = human_name.into();
        if records.contains_key(&human_name) {
            return false;
        }
        records.insert(human_name, bytes);
        true
    }

    /// Removes `human_name`; returns the number of records removed.
    pub fn delete(&self, human_name: &str) -> usize {
        usize::from(lock(&self.records).remove(human_name).is_some())
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    /// Returns true when the directory has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DirectoryBackend for InMemoryDirectory {
    fn open(&self) -> Result<Box<dyn DirectorySession>, SessionError> {
        Ok(Box::new(InMemorySession {
            records: Arc::clone(&self.records),
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Session over a shared in-memory record map.
struct InMemorySession {
    /// Shared record map.
    records: RecordMap,
}

impl DirectorySession for InMemorySession {
    fn lookup_name(&mut self, human_name: &str) -> Result<Option<Vec<u8>>, SessionError> {
        Ok(lock(&self.records).get(human_name).cloned())
    }

    fn lookup_hname(&mut self, name: &GdpName) -> Result<Option<String>, SessionError> {
        let records = lock(&self.records);
        Ok(records
            .iter()
            .find(|(_, bytes)| bytes.as_slice() == name.as_bytes())
            .map(|(human_name, _)| human_name.clone()))
    }

    fn reset(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Locks the record map, recovering from poisoning.
fn lock(records: &RecordMap) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
    records.lock().unwrap_or_else(PoisonError::into_inner)
}
