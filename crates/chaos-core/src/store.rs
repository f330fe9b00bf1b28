use crate::error::Result;
use crate::io;
use crate::paths::{self, Region};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Durable home for serialized snapshots, one record per region.
///
/// Stores deal in raw bytes; decoding and corruption handling belong to the
/// cache so every backend treats a damaged record the same way.
pub trait SnapshotStore: Send + Sync {
    /// `Ok(None)` when no record exists for `region`.
    fn read(&self, region: &Region) -> Result<Option<Vec<u8>>>;

    /// Replace the record for `region` in one step.
    fn write(&self, region: &Region, data: &str) -> Result<()>;

    /// Returns true if a record was removed.
    fn remove(&self, region: &Region) -> Result<bool>;

    /// Regions that currently have a record, sorted.
    fn regions(&self) -> Result<Vec<Region>>;
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One JSON file per region under a cache directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, region: &Region) -> PathBuf {
        paths::record_path(&self.dir, region)
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, region: &Region) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(region)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, region: &Region, data: &str) -> Result<()> {
        io::ensure_dir(&self.dir)?;
        io::atomic_write(&self.path_for(region), data.as_bytes())
    }

    fn remove(&self, region: &Region) -> Result<bool> {
        io::remove_if_exists(&self.path_for(region))
    }

    fn regions(&self) -> Result<Vec<Region>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut regions = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if let Some(region) = paths::region_from_record(&path) {
                regions.push(region);
            }
        }
        regions.sort();
        Ok(regions)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<Region, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<Region, String>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, region: &Region) -> Result<Option<Vec<u8>>> {
        Ok(self.records().get(region).map(|s| s.clone().into_bytes()))
    }

    fn write(&self, region: &Region, data: &str) -> Result<()> {
        self.records().insert(region.clone(), data.to_string());
        Ok(())
    }

    fn remove(&self, region: &Region) -> Result<bool> {
        Ok(self.records().remove(region).is_some())
    }

    fn regions(&self) -> Result<Vec<Region>> {
        Ok(self.records().keys().cloned().collect())
    }
}
