use crate::context::Resolved;
use crate::output::print_json;
use anyhow::Context;
use chaos_core::{capability::CacheStatus, prompt};
use std::path::Path;

pub fn run(
    ctx: &Resolved,
    arch: Option<&str>,
    arch_file: Option<&Path>,
    region: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let architecture = match (arch, arch_file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("one of --arch or --arch-file is required"),
    };
    if architecture.trim().is_empty() {
        anyhow::bail!("architecture description is empty");
    }

    let region = ctx.region(region)?;
    let lookup = ctx.cache().get(&region);
    if lookup.status == CacheStatus::Empty
        || lookup.fis_actions.is_empty()
        || lookup.resource_types.is_empty()
    {
        anyhow::bail!(
            "no usable cached capabilities for {region}; run `fis-chaos cache refresh --file <json>` first"
        );
    }
    if lookup.status == CacheStatus::Stale {
        tracing::warn!(region = %region, "rendering prompt from stale capabilities");
    }

    let system_prompt =
        prompt::render_system_prompt(&lookup.fis_actions, &lookup.resource_types, &architecture);

    if json {
        print_json(&serde_json::json!({
            "region": region,
            "cache_status": lookup.status,
            "system_prompt": system_prompt,
        }))?;
    } else {
        println!("{system_prompt}");
    }
    Ok(())
}
