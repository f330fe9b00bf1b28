use super::{region_schema, ChaosTool, ToolContext};
use chaos_core::{capability::CacheStatus, prompt};
use serde_json::Value;

pub struct GeneratePromptTool;

impl ChaosTool for GeneratePromptTool {
    fn name(&self) -> &str {
        "generate_fis_system_prompt"
    }

    fn description(&self) -> &str {
        "Build a system prompt for drafting FIS experiment templates, with the cached FIS \
         actions and resource types and the user's architecture description injected"
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_architecture": {
                    "type": "string",
                    "description": "Description of the user's AWS architecture"
                },
                "region": region_schema()
            },
            "required": ["user_architecture"]
        })
    }

    fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, String> {
        let architecture = args["user_architecture"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| "missing required argument: user_architecture".to_string())?;
        let region = ctx.region_arg(&args)?;
        let lookup = ctx.cache.get(&region);

        let failure = |message: String| {
            serde_json::json!({
                "success": false,
                "system_prompt": "",
                "message": message,
                "cache_status": lookup.status,
                "fis_actions_count": lookup.fis_actions.len(),
                "resource_types_count": lookup.resource_types.len(),
            })
        };

        if lookup.status == CacheStatus::Empty {
            return Ok(failure(format!(
                "Cannot generate system prompt: no cached capabilities for {region}. \
                 Refresh the cache first with refresh_valid_fis_actions_cache."
            )));
        }
        if lookup.fis_actions.is_empty() || lookup.resource_types.is_empty() {
            return Ok(failure(
                "Cannot generate system prompt: the cache has no FIS actions or no resource types."
                    .to_string(),
            ));
        }

        let system_prompt =
            prompt::render_system_prompt(&lookup.fis_actions, &lookup.resource_types, architecture);
        let message = if lookup.status == CacheStatus::Stale {
            "System prompt generated from stale capabilities; refresh the cache for current data."
        } else {
            "System prompt generated successfully with current FIS capabilities."
        };

        Ok(serde_json::json!({
            "success": true,
            "system_prompt": system_prompt,
            "message": message,
            "cache_status": lookup.status,
            "fis_actions_count": lookup.fis_actions.len(),
            "resource_types_count": lookup.resource_types.len(),
        }))
    }
}
