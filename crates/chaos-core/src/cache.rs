use crate::capability::{
    CacheLookup, CacheStatus, CapabilitySnapshot, FisAction, RefreshReport, ResourceType,
};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::paths::Region;
use crate::store::{FileStore, SnapshotStore};
use chrono::Duration;
use std::path::PathBuf;

pub const DEFAULT_TTL_HOURS: u32 = 24;

/// Per-region capability cache with a freshness window.
///
/// The cache never talks to AWS. Callers read with [`get`](Self::get), fetch
/// fresh data themselves when the status asks for it, and hand it back via
/// [`refresh`](Self::refresh).
pub struct CapabilityCache {
    store: Box<dyn SnapshotStore>,
    clock: Box<dyn Clock>,
    ttl_hours: u32,
}

impl CapabilityCache {
    pub fn new(
        store: impl SnapshotStore + 'static,
        clock: impl Clock + 'static,
        ttl_hours: u32,
    ) -> Self {
        Self {
            store: Box::new(store),
            clock: Box::new(clock),
            ttl_hours,
        }
    }

    /// File-backed cache under `dir` using the system clock.
    pub fn open(dir: impl Into<PathBuf>, ttl_hours: u32) -> Self {
        Self::new(FileStore::new(dir), SystemClock, ttl_hours)
    }

    pub fn ttl_hours(&self) -> u32 {
        self.ttl_hours
    }

    fn ttl(&self) -> Duration {
        Duration::hours(i64::from(self.ttl_hours))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current capabilities for `region`. Never fails: unreadable or damaged
    /// records read as `Empty` so the caller is told to refresh.
    pub fn get(&self, region: &Region) -> CacheLookup {
        match self.load(region) {
            Some(snapshot) => {
                let status = snapshot.status_at(self.clock.now(), self.ttl());
                tracing::debug!(
                    region = %region,
                    status = %status,
                    actions = snapshot.fis_actions.len(),
                    resource_types = snapshot.resource_types.len(),
                    "capability cache hit"
                );
                CacheLookup::from_snapshot(snapshot, status)
            }
            None => CacheLookup::empty(region.clone()),
        }
    }

    pub fn status(&self, region: &Region) -> CacheStatus {
        self.get(region).status
    }

    fn load(&self, region: &Region) -> Option<CapabilitySnapshot> {
        let data = match self.store.read(region) {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(region = %region, "no cached capabilities");
                return None;
            }
            Err(e) => {
                tracing::warn!(region = %region, error = %e, "failed to read capability cache");
                return None;
            }
        };

        let snapshot = match serde_json::from_slice::<CapabilitySnapshot>(&data) {
            Ok(s) if s.region == *region => s,
            Ok(s) => {
                tracing::warn!(
                    region = %region,
                    stored_region = %s.region,
                    "capability record belongs to another region; discarding"
                );
                self.discard(region);
                return None;
            }
            Err(e) => {
                tracing::warn!(region = %region, error = %e, "corrupted capability record; discarding");
                self.discard(region);
                return None;
            }
        };
        Some(snapshot)
    }

    fn discard(&self, region: &Region) {
        if let Err(e) = self.store.remove(region) {
            tracing::warn!(region = %region, error = %e, "failed to remove corrupted record");
        }
    }

    /// Regions with a stored record, fresh or not.
    pub fn regions(&self) -> Result<Vec<Region>> {
        self.store.regions()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Replace everything stored for `region` with the supplied lists.
    pub fn refresh(
        &self,
        region: &Region,
        fis_actions: Vec<FisAction>,
        resource_types: Vec<ResourceType>,
    ) -> Result<RefreshReport> {
        let timestamp = self.clock.now();
        let snapshot = CapabilitySnapshot::new(
            region.clone(),
            fis_actions,
            resource_types,
            timestamp,
            self.ttl_hours,
        );
        if snapshot.is_empty() {
            tracing::warn!(region = %region, "refreshing with no actions or resource types");
        }

        let data = serde_json::to_string_pretty(&snapshot)?;
        self.store.write(region, &data)?;

        tracing::info!(
            region = %region,
            actions = snapshot.fis_actions.len(),
            resource_types = snapshot.resource_types.len(),
            "capability cache refreshed"
        );

        Ok(RefreshReport {
            success: true,
            region: region.clone(),
            actions_count: snapshot.fis_actions.len(),
            resource_types_count: snapshot.resource_types.len(),
            timestamp,
        })
    }

    /// Drop the record for one region, or for every region when `None`.
    /// Returns the number of records removed.
    pub fn clear(&self, region: Option<&Region>) -> Result<usize> {
        let targets = match region {
            Some(r) => vec![r.clone()],
            None => self.store.regions()?,
        };
        let mut removed = 0;
        for r in &targets {
            if self.store.remove(r)? {
                removed += 1;
            }
        }
        tracing::info!(removed, "capability cache cleared");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
