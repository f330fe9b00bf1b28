use crate::paths::Region;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// FisAction / ResourceType
// ---------------------------------------------------------------------------

/// One operation the fault-injection service can perform, e.g.
/// `aws:ec2:stop-instances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CapabilityInput")]
pub struct FisAction {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// One category of resource an action can target, e.g. `aws:ec2:instance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CapabilityInput")]
pub struct ResourceType {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
}

impl FisAction {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

impl ResourceType {
    pub fn new(type_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            description: description.into(),
        }
    }
}

/// Accepted input forms: a bare identifier, or an object carrying the
/// identifier under `id`, `type` or `resourceType` (or the capitalised
/// spellings).
#[derive(Deserialize)]
#[serde(untagged)]
enum CapabilityInput {
    Bare(String),
    Described {
        #[serde(
            alias = "id",
            alias = "Id",
            alias = "type",
            alias = "Type",
            alias = "resourceType"
        )]
        ident: String,
        #[serde(default, alias = "Description")]
        description: Option<String>,
    },
}

impl CapabilityInput {
    fn into_parts(self) -> (String, String) {
        match self {
            CapabilityInput::Bare(ident) => (ident, String::new()),
            CapabilityInput::Described { ident, description } => {
                (ident, description.unwrap_or_default())
            }
        }
    }
}

impl From<CapabilityInput> for FisAction {
    fn from(input: CapabilityInput) -> Self {
        let (id, description) = input.into_parts();
        Self { id, description }
    }
}

impl From<CapabilityInput> for ResourceType {
    fn from(input: CapabilityInput) -> Self {
        let (type_name, description) = input.into_parts();
        Self {
            type_name,
            description,
        }
    }
}

/// Freshly fetched capabilities as handed over by the caller, e.g. the
/// combined output of the FIS `ListActions` and `ListTargetResourceTypes`
/// APIs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CapabilityData {
    #[serde(default, alias = "actions")]
    pub fis_actions: Vec<FisAction>,
    #[serde(default, alias = "targetResourceTypes")]
    pub resource_types: Vec<ResourceType>,
}

impl CapabilityData {
    /// True when no entry carries a non-blank identifier, i.e. a snapshot
    /// built from this data would hold nothing.
    pub fn is_empty(&self) -> bool {
        self.fis_actions.iter().all(|a| a.id.trim().is_empty())
            && self
                .resource_types
                .iter()
                .all(|r| r.type_name.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// CapabilitySnapshot
// ---------------------------------------------------------------------------

/// The valid action and resource-type identifiers for one region, as of
/// `last_updated`. This is also the on-disk record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub region: Region,
    pub fis_actions: Vec<FisAction>,
    pub resource_types: Vec<ResourceType>,
    pub last_updated: DateTime<Utc>,
    #[serde(default = "default_ttl_hours")]
    pub cache_ttl_hours: u32,
}

fn default_ttl_hours() -> u32 {
    24
}

impl CapabilitySnapshot {
    /// Build a snapshot, collapsing duplicate identifiers (first one wins) and
    /// dropping blank ones.
    pub fn new(
        region: Region,
        fis_actions: Vec<FisAction>,
        resource_types: Vec<ResourceType>,
        last_updated: DateTime<Utc>,
        cache_ttl_hours: u32,
    ) -> Self {
        let mut seen = HashSet::new();
        let fis_actions = fis_actions
            .into_iter()
            .filter(|a| !a.id.trim().is_empty() && seen.insert(a.id.clone()))
            .collect();
        let mut seen = HashSet::new();
        let resource_types = resource_types
            .into_iter()
            .filter(|r| !r.type_name.trim().is_empty() && seen.insert(r.type_name.clone()))
            .collect();
        Self {
            region,
            fis_actions,
            resource_types,
            last_updated,
            cache_ttl_hours,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fis_actions.is_empty() && self.resource_types.is_empty()
    }

    pub fn action_ids(&self) -> HashSet<&str> {
        self.fis_actions.iter().map(|a| a.id.as_str()).collect()
    }

    pub fn resource_type_names(&self) -> HashSet<&str> {
        self.resource_types
            .iter()
            .map(|r| r.type_name.as_str())
            .collect()
    }

    pub fn status_at(&self, now: DateTime<Utc>, ttl: Duration) -> CacheStatus {
        if now - self.last_updated < ttl {
            CacheStatus::Fresh
        } else {
            CacheStatus::Stale
        }
    }
}

// ---------------------------------------------------------------------------
// CacheStatus / CacheLookup / RefreshReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    Fresh,
    Stale,
    Empty,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Fresh => "fresh",
            CacheStatus::Stale => "stale",
            CacheStatus::Empty => "empty",
        }
    }

    pub fn needs_refresh(self) -> bool {
        !matches!(self, CacheStatus::Fresh)
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to "what is valid in region R right now?". Stale data is returned
/// as-is; only `Empty` carries no data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheLookup {
    pub region: Region,
    #[serde(rename = "cache_status")]
    pub status: CacheStatus,
    pub fis_actions: Vec<FisAction>,
    pub resource_types: Vec<ResourceType>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CacheLookup {
    pub fn empty(region: Region) -> Self {
        Self {
            region,
            status: CacheStatus::Empty,
            fis_actions: Vec::new(),
            resource_types: Vec::new(),
            last_updated: None,
        }
    }

    pub fn from_snapshot(snapshot: CapabilitySnapshot, status: CacheStatus) -> Self {
        Self {
            region: snapshot.region,
            status,
            fis_actions: snapshot.fis_actions,
            resource_types: snapshot.resource_types,
            last_updated: Some(snapshot.last_updated),
        }
    }

    /// The data as a snapshot, for validation. An empty lookup yields a
    /// snapshot with no identifiers.
    pub fn snapshot(&self) -> CapabilitySnapshot {
        CapabilitySnapshot {
            region: self.region.clone(),
            fis_actions: self.fis_actions.clone(),
            resource_types: self.resource_types.clone(),
            last_updated: self.last_updated.unwrap_or_default(),
            cache_ttl_hours: default_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub success: bool,
    pub region: Region,
    pub actions_count: usize,
    pub resource_types_count: usize,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
