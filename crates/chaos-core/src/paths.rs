use crate::error::{ChaosError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CACHE_DIR_NAME: &str = "aws-chaos-engineering";
pub const FALLBACK_CACHE_DIR: &str = ".aws-chaos-engineering";
pub const CONFIG_FILE: &str = "config.yaml";

pub const RECORD_PREFIX: &str = "fis_actions_";
pub const RECORD_EXT: &str = "json";

pub const DEFAULT_REGION: &str = "us-east-1";

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

static REGION_RE: OnceLock<Regex> = OnceLock::new();

fn region_re() -> &'static Regex {
    REGION_RE.get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-[0-9]+$").unwrap())
}

/// A validated region name. Doubles as the cache partition key and as part of
/// a file name, so anything that could escape the cache directory is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.len() > 32 || !region_re().is_match(name) {
            return Err(ChaosError::InvalidRegion(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(DEFAULT_REGION.to_string())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Region {
    type Error = ChaosError;

    fn try_from(value: String) -> Result<Self> {
        Region::parse(&value)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn record_path(cache_dir: &Path, region: &Region) -> PathBuf {
    cache_dir.join(format!("{RECORD_PREFIX}{region}.{RECORD_EXT}"))
}

/// Inverse of [`record_path`]: the region a cache file belongs to, if any.
pub fn region_from_record(path: &Path) -> Option<Region> {
    if path.extension()?.to_str()? != RECORD_EXT {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let name = stem.strip_prefix(RECORD_PREFIX)?;
    Region::parse(name).ok()
}

pub fn config_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CONFIG_FILE)
}

/// Default cache directory when none is configured.
///
/// Priority:
/// 1. `$XDG_CACHE_HOME/aws-chaos-engineering`
/// 2. `~/.cache/aws-chaos-engineering`
/// 3. `./.aws-chaos-engineering`
pub fn default_cache_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(CACHE_DIR_NAME);
    }
    match home::home_dir() {
        Some(home) => home.join(".cache").join(CACHE_DIR_NAME),
        None => PathBuf::from(FALLBACK_CACHE_DIR),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_regions() {
        for name in [
            "us-east-1",
            "eu-central-1",
            "ap-southeast-2",
            "us-gov-west-1",
            "cn-north-1",
        ] {
            Region::parse(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_regions() {
        for name in ["", "US-EAST-1", "us-east", "../etc/passwd", "us_east_1", "us-east-1/x"] {
            assert!(Region::parse(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn region_deserialize_rejects_bad_names() {
        let ok: Region = serde_json::from_str("\"eu-west-1\"").unwrap();
        assert_eq!(ok.as_str(), "eu-west-1");
        assert!(serde_json::from_str::<Region>("\"nowhere\"").is_err());
    }

    #[test]
    fn record_path_round_trips() {
        let dir = Path::new("/tmp/cache");
        let region = Region::parse("us-west-2").unwrap();
        let path = record_path(dir, &region);
        assert_eq!(path, PathBuf::from("/tmp/cache/fis_actions_us-west-2.json"));
        assert_eq!(region_from_record(&path), Some(region));
    }

    #[test]
    fn unrelated_files_are_not_records() {
        assert_eq!(region_from_record(Path::new("/tmp/cache/config.yaml")), None);
        assert_eq!(region_from_record(Path::new("/tmp/cache/fis_actions_x.json")), None);
        assert_eq!(region_from_record(Path::new("/tmp/cache/.tmpA1b2")), None);
    }
}
