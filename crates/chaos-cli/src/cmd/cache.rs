use crate::context::Resolved;
use crate::output::{print_json, print_table};
use anyhow::Context;
use chaos_core::{capability::CapabilityData, paths::Region};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum CacheSubcommand {
    /// Show cache status per region
    Status {
        /// Only this region (default: every cached region)
        #[arg(long)]
        region: Option<String>,
    },
    /// Print the cached actions and resource types for a region
    Show {
        /// Region (default: configured default region)
        #[arg(long)]
        region: Option<String>,
    },
    /// Replace a region's capabilities with data from a JSON file
    Refresh {
        /// JSON file with `fis_actions` and `resource_types`
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        /// Region (default: configured default region)
        #[arg(long)]
        region: Option<String>,
    },
    /// Remove cached records
    Clear {
        /// Region to clear (default: configured default region)
        #[arg(long, conflicts_with = "all")]
        region: Option<String>,
        /// Clear every region
        #[arg(long)]
        all: bool,
    },
}

pub fn run(ctx: &Resolved, subcmd: CacheSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CacheSubcommand::Status { region } => status(ctx, region.as_deref(), json),
        CacheSubcommand::Show { region } => show(ctx, region.as_deref(), json),
        CacheSubcommand::Refresh { file, region } => refresh(ctx, &file, region.as_deref(), json),
        CacheSubcommand::Clear { region, all } => clear(ctx, region.as_deref(), all, json),
    }
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

fn status(ctx: &Resolved, region: Option<&str>, json: bool) -> anyhow::Result<()> {
    let cache = ctx.cache();
    let regions = match region {
        Some(name) => vec![Region::parse(name)?],
        None => cache.regions().context("failed to list cached regions")?,
    };
    let lookups: Vec<_> = regions.iter().map(|r| cache.get(r)).collect();

    if json {
        let entries: Vec<_> = lookups
            .iter()
            .map(|l| {
                serde_json::json!({
                    "region": l.region,
                    "cache_status": l.status,
                    "needs_refresh": l.status.needs_refresh(),
                    "actions_count": l.fis_actions.len(),
                    "resource_types_count": l.resource_types.len(),
                    "last_updated": l.last_updated,
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "cache_dir": ctx.cache_dir,
            "ttl_hours": cache.ttl_hours(),
            "regions": entries,
        }));
    }

    if lookups.is_empty() {
        println!("No cached regions in {}.", ctx.cache_dir.display());
        return Ok(());
    }

    let rows = lookups
        .iter()
        .map(|l| {
            vec![
                l.region.to_string(),
                l.status.to_string(),
                l.fis_actions.len().to_string(),
                l.resource_types.len().to_string(),
                l.last_updated
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(
        &["REGION", "STATUS", "ACTIONS", "RESOURCE TYPES", "LAST UPDATED"],
        rows,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &Resolved, region: Option<&str>, json: bool) -> anyhow::Result<()> {
    let region = ctx.region(region)?;
    let lookup = ctx.cache().get(&region);

    if json {
        return print_json(&lookup);
    }

    println!("Region: {}", lookup.region);
    println!("Status: {}", lookup.status);
    if let Some(t) = lookup.last_updated {
        println!("Last updated: {}", t.to_rfc3339());
    }
    if lookup.fis_actions.is_empty() && lookup.resource_types.is_empty() {
        println!("\nNo cached capabilities. Run `fis-chaos cache refresh --file <json>`.");
        return Ok(());
    }

    println!();
    print_table(
        &["ACTION", "DESCRIPTION"],
        lookup
            .fis_actions
            .iter()
            .map(|a| vec![a.id.clone(), a.description.clone()])
            .collect(),
    );
    println!();
    print_table(
        &["RESOURCE TYPE", "DESCRIPTION"],
        lookup
            .resource_types
            .iter()
            .map(|r| vec![r.type_name.clone(), r.description.clone()])
            .collect(),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

fn refresh(ctx: &Resolved, file: &Path, region: Option<&str>, json: bool) -> anyhow::Result<()> {
    let region = ctx.region(region)?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let data: CapabilityData = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid capability data", file.display()))?;
    if data.is_empty() {
        anyhow::bail!(
            "{} contains no fis_actions or resource_types",
            file.display()
        );
    }

    let report = ctx
        .cache()
        .refresh(&region, data.fis_actions, data.resource_types)
        .with_context(|| format!("failed to update cache for {region}"))?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "Cached {} actions and {} resource types for {}.",
            report.actions_count, report.resource_types_count, report.region
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

fn clear(ctx: &Resolved, region: Option<&str>, all: bool, json: bool) -> anyhow::Result<()> {
    let cache = ctx.cache();
    let target = if all {
        None
    } else {
        Some(ctx.region(region)?)
    };
    let removed = cache
        .clear(target.as_ref())
        .context("failed to clear cache")?;

    if json {
        print_json(&serde_json::json!({ "removed": removed }))?;
    } else {
        println!("Removed {removed} cached record(s).");
    }
    Ok(())
}
