use crate::context::Resolved;
use crate::output::print_json;
use anyhow::Context;
use chaos_core::validator;
use serde_json::Value;
use std::path::Path;

pub fn run(ctx: &Resolved, file: &Path, region: Option<&str>, json: bool) -> anyhow::Result<()> {
    let region = ctx.region(region)?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let lookup = ctx.cache().get(&region);
    // Parsed like tool input: bad JSON is a malformed template, not an error.
    let result = validator::validate_lookup(&lookup, &Value::String(text));

    if json {
        print_json(&serde_json::json!({
            "file": file,
            "region": region,
            "cache_status": lookup.status,
            "result": result,
        }))?;
    } else {
        for e in &result.errors {
            println!("[error] {e}");
        }
        for w in &result.warnings {
            println!("[warning] {w}");
        }
        if result.valid {
            println!(
                "{} is valid against {} capabilities ({}).",
                file.display(),
                region,
                lookup.status
            );
        }
    }

    if !result.valid {
        anyhow::bail!(
            "{} failed validation with {} error(s)",
            file.display(),
            result.errors.len()
        );
    }
    Ok(())
}
