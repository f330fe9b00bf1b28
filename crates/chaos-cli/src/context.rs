use crate::tools::ToolContext;
use anyhow::Context;
use chaos_core::{cache::CapabilityCache, config::Config, paths, paths::Region};
use std::path::{Path, PathBuf};

/// Cache directory and config after applying flags, env and defaults.
pub struct Resolved {
    pub cache_dir: PathBuf,
    pub config: Config,
    /// Where the config came from, if a file was read.
    pub config_path: Option<PathBuf>,
}

/// Resolve the cache directory and config.
///
/// Priority for the cache directory:
/// 1. `--cache-dir` flag / `FIS_CHAOS_CACHE_DIR` env var
/// 2. `cache_dir` from the config file
/// 3. `paths::default_cache_dir()`
///
/// The config is read from `--config` if given, else from
/// `<cache_dir>/config.yaml` when that file exists.
pub fn resolve(cache_dir: Option<&Path>, config: Option<&Path>) -> anyhow::Result<Resolved> {
    let (cfg, config_path) = match config {
        Some(path) => {
            let cfg = Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            (cfg, Some(path.to_path_buf()))
        }
        None => {
            let probe_dir = cache_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(paths::default_cache_dir);
            let path = paths::config_path(&probe_dir);
            let found = path.exists().then_some(path);
            let cfg = Config::load_or_default(&probe_dir)
                .with_context(|| format!("failed to load config in {}", probe_dir.display()))?;
            (cfg, found)
        }
    };

    let cache_dir = cache_dir
        .map(Path::to_path_buf)
        .or_else(|| cfg.cache_dir.clone())
        .unwrap_or_else(paths::default_cache_dir);

    tracing::debug!(cache_dir = %cache_dir.display(), "resolved cache directory");
    Ok(Resolved {
        cache_dir,
        config: cfg,
        config_path,
    })
}

impl Resolved {
    /// `name` if given, else the configured default region.
    pub fn region(&self, name: Option<&str>) -> anyhow::Result<Region> {
        let region = match name {
            Some(name) => Region::parse(name)?,
            None => self
                .config
                .region()
                .context("invalid default_region in config")?,
        };
        Ok(region)
    }

    pub fn cache(&self) -> CapabilityCache {
        CapabilityCache::open(self.cache_dir.clone(), self.config.ttl_hours)
    }

    pub fn into_tool_context(self) -> ToolContext {
        let cache = self.cache();
        ToolContext::new(cache, self.config)
    }
}
