//! On-disk identity persistence.
//!
//! The record lives at `<storage.dir>/robot_id` as one JSON document. Writes
//! go to a temp file in the same directory followed by a rename, so a crash
//! mid-write can never leave a torn record behind.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::IdentError;
use crate::record::IdentityRecord;

/// Name of the record file inside the storage directory.
const RECORD_FILE: &str = "robot_id";

/// Reads and writes the persisted identity record.
///
/// Only the supervisor touches the store; there are no concurrent writers.
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Create a store rooted at `storage_dir`.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: storage_dir.into().join(RECORD_FILE),
        }
    }

    /// Path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record. Errors when the file is missing or does
    /// not decode, which callers treat as "first run".
    pub fn load(&self) -> Result<IdentityRecord, IdentError> {
        let raw = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Persist the record atomically (write temp file, then rename).
    pub fn save(&self, record: &IdentityRecord) -> Result<(), IdentError> {
        let data = serde_json::to_vec(record)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Rewrite the record with a new name, keeping every other field.
    pub fn set_name(&self, name: &str) -> Result<(), IdentError> {
        let mut record = self.load()?;
        record.name = name.to_owned();
        self.save(&record)
    }
}
