use chaos_core::{cache::CapabilityCache, config::Config, paths::Region};
use serde_json::Value;

pub mod generate_prompt;
pub mod get_actions;
pub mod refresh_cache;
pub mod validate_template;

/// Everything a tool call may touch.
pub struct ToolContext {
    pub cache: CapabilityCache,
    pub config: Config,
}

impl ToolContext {
    pub fn new(cache: CapabilityCache, config: Config) -> Self {
        Self { cache, config }
    }

    /// The `region` argument if given, else the configured default.
    pub fn region_arg(&self, args: &Value) -> Result<Region, String> {
        match args.get("region") {
            None | Some(Value::Null) => self.config.region().map_err(|e| e.to_string()),
            Some(Value::String(name)) => Region::parse(name).map_err(|e| e.to_string()),
            Some(_) => Err("argument 'region' must be a string".to_string()),
        }
    }
}

pub trait ChaosTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> Value;
    fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value, String>;
}

pub fn all_tools() -> Vec<Box<dyn ChaosTool>> {
    vec![
        Box::new(get_actions::GetValidFisActionsTool),
        Box::new(refresh_cache::RefreshCacheTool),
        Box::new(validate_template::ValidateTemplateTool),
        Box::new(generate_prompt::GeneratePromptTool),
    ]
}

/// Shared `region` property for tool input schemas.
pub(crate) fn region_schema() -> Value {
    serde_json::json!({
        "type": "string",
        "description": "AWS region, e.g. us-east-1 (defaults to the configured region)"
    })
}
