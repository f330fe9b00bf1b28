use super::{region_schema, ChaosTool, ToolContext};
use chaos_core::capability::CacheStatus;
use serde_json::Value;

pub const REFRESH_HOWTO: &str = "fetch current data with the AWS FIS APIs \
     (list actions and list target resource types), then call \
     refresh_valid_fis_actions_cache with the results.";

pub struct GetValidFisActionsTool;

impl ChaosTool for GetValidFisActionsTool {
    fn name(&self) -> &str {
        "get_valid_fis_actions"
    }

    fn description(&self) -> &str {
        "Return the cached FIS actions and resource types for a region. If the cache is \
         stale (older than the TTL) the data is still returned, with an instruction to refresh."
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "region": region_schema()
            }
        })
    }

    fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, String> {
        let region = ctx.region_arg(&args)?;
        let lookup = ctx.cache.get(&region);

        let instruction = match lookup.status {
            CacheStatus::Fresh => None,
            CacheStatus::Stale => Some(format!(
                "Cache is stale (older than {} hours); the data below may be out of date. \
                 To refresh, {REFRESH_HOWTO}",
                ctx.cache.ttl_hours()
            )),
            CacheStatus::Empty => Some(format!("No cached data available. To populate it, {REFRESH_HOWTO}")),
        };

        let mut out = serde_json::to_value(&lookup).map_err(|e| e.to_string())?;
        out["instruction"] = serde_json::to_value(instruction).map_err(|e| e.to_string())?;
        Ok(out)
    }
}
