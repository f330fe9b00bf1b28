use crate::context::Resolved;
use crate::output::print_json;
use anyhow::Context;
use chaos_core::{
    config::{Config, WarnLevel},
    io, paths,
};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default config.yaml into the cache directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(ctx: &Resolved, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { force } => init(ctx, force, json),
        ConfigSubcommand::Show => show(ctx, json),
        ConfigSubcommand::Validate => validate(ctx, json),
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(ctx: &Resolved, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(&ctx.cache_dir);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    io::ensure_dir(&ctx.cache_dir)
        .with_context(|| format!("failed to create {}", ctx.cache_dir.display()))?;
    Config::default()
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({ "config_file": path }))?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &Resolved, json: bool) -> anyhow::Result<()> {
    let cfg = &ctx.config;

    if json {
        print_json(&serde_json::json!({
            "config_file": ctx.config_path,
            "cache_dir": ctx.cache_dir,
            "default_region": cfg.default_region,
            "ttl_hours": cfg.ttl_hours,
        }))?;
    } else {
        match &ctx.config_path {
            Some(p) => println!("Config file:    {}", p.display()),
            None => println!("Config file:    (defaults)"),
        }
        println!("Cache dir:      {}", ctx.cache_dir.display());
        println!("Default region: {}", cfg.default_region);
        println!("TTL (hours):    {}", cfg.ttl_hours);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(ctx: &Resolved, json: bool) -> anyhow::Result<()> {
    let warnings = ctx.config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
