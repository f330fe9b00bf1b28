use super::{region_schema, ChaosTool, ToolContext};
use chaos_core::capability::CapabilityData;
use serde_json::Value;

pub struct RefreshCacheTool;

impl ChaosTool for RefreshCacheTool {
    fn name(&self) -> &str {
        "refresh_valid_fis_actions_cache"
    }

    fn description(&self) -> &str {
        "Replace the cached FIS actions and resource types for a region with fresh data \
         fetched from AWS by the caller"
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "region": region_schema(),
                "fis_data": {
                    "type": "object",
                    "description": "Fresh capability data",
                    "properties": {
                        "fis_actions": {
                            "type": "array",
                            "description": "Actions as {id, description} objects or bare ids"
                        },
                        "resource_types": {
                            "type": "array",
                            "description": "Resource types as {type, description} objects or bare names"
                        }
                    }
                }
            },
            "required": ["fis_data"]
        })
    }

    fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, String> {
        let region = ctx.region_arg(&args)?;
        let raw = match args.get("fis_data") {
            None | Some(Value::Null) => {
                return Err("missing required argument: fis_data".to_string())
            }
            Some(Value::String(text)) => {
                serde_json::from_str(text).map_err(|e| format!("fis_data is not valid JSON: {e}"))?
            }
            Some(v) => v.clone(),
        };
        let data: CapabilityData =
            serde_json::from_value(raw).map_err(|e| format!("invalid fis_data: {e}"))?;
        if data.is_empty() {
            return Err("fis_data contains no fis_actions or resource_types".to_string());
        }

        match ctx
            .cache
            .refresh(&region, data.fis_actions, data.resource_types)
        {
            Ok(report) => Ok(serde_json::json!({
                "success": report.success,
                "message": format!("Cache updated successfully for region {region}"),
                "actions_count": report.actions_count,
                "resource_types_count": report.resource_types_count,
                "last_updated": report.timestamp,
                "region": region,
            })),
            Err(e) => {
                tracing::error!(region = %region, error = %e, "cache refresh failed");
                Ok(serde_json::json!({
                    "success": false,
                    "message": format!("Failed to update cache: {e}"),
                    "actions_count": 0,
                    "resource_types_count": 0,
                    "last_updated": null,
                    "region": region,
                }))
            }
        }
    }
}
