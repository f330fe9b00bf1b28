use crate::cache::DEFAULT_TTL_HOURS;
use crate::error::{ChaosError, Result};
use crate::paths::{self, Region, DEFAULT_REGION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Region used when a tool call or command does not name one.
    #[serde(default = "default_region")]
    pub default_region: String,
    /// Hours a refreshed snapshot stays fresh.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_ttl_hours() -> u32 {
    DEFAULT_TTL_HOURS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            ttl_hours: default_ttl_hours(),
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChaosError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load `<cache_dir>/config.yaml` if it exists, defaults otherwise.
    pub fn load_or_default(cache_dir: &Path) -> Result<Self> {
        let path = paths::config_path(cache_dir);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn region(&self) -> Result<Region> {
        Region::parse(&self.default_region)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = self.region() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("default_region: {e}"),
            });
        }

        if self.ttl_hours == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "ttl_hours is 0: every cached snapshot would read as stale".to_string(),
            });
        } else if self.ttl_hours > 24 * 7 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "ttl_hours is {}: capabilities older than a week may miss new FIS actions",
                    self.ttl_hours
                ),
            });
        }

        if let Some(dir) = &self.cache_dir {
            if dir.is_file() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("cache_dir '{}' is a file, not a directory", dir.display()),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
