use super::{region_schema, ChaosTool, ToolContext};
use chaos_core::validator::{self, SCOPE_NOTE};
use serde_json::Value;

pub struct ValidateTemplateTool;

impl ChaosTool for ValidateTemplateTool {
    fn name(&self) -> &str {
        "validate_fis_template"
    }

    fn description(&self) -> &str {
        "Check that a generated FIS experiment template only uses action IDs and resource \
         types present in the cached capabilities. Does not check IAM permissions, ARNs, \
         or experiment design."
    }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "template": {
                    "type": ["object", "string"],
                    "description": "FIS experiment template (API or CloudFormation shape)"
                },
                "region": region_schema()
            },
            "required": ["template"]
        })
    }

    fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, String> {
        let region = ctx.region_arg(&args)?;
        let template = match args.get("template") {
            None | Some(Value::Null) => {
                return Err("missing required argument: template".to_string())
            }
            Some(t) => t,
        };

        let lookup = ctx.cache.get(&region);
        let result = validator::validate_lookup(&lookup, template);
        tracing::info!(
            region = %region,
            valid = result.valid,
            errors = result.errors.len(),
            "template validated"
        );

        let mut out = serde_json::to_value(&result).map_err(|e| e.to_string())?;
        out["region"] = Value::String(region.to_string());
        out["cache_status"] = Value::String(lookup.status.to_string());
        out["scope"] = Value::String(SCOPE_NOTE.to_string());
        out["validation_timestamp"] = Value::String(chrono::Utc::now().to_rfc3339());
        Ok(out)
    }
}
