use crate::capability::{CacheLookup, CacheStatus, CapabilitySnapshot};
use crate::template::ExperimentTemplate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCOPE_NOTE: &str = "Validation covers only action IDs and resource types. \
     IAM permissions, ARNs, and action/target compatibility are not validated.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub invalid_actions: Vec<String>,
    pub invalid_resource_types: Vec<String>,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            invalid_actions: Vec::new(),
            invalid_resource_types: Vec::new(),
        }
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
        self.valid = false;
    }
}

/// Check every action id and resource type the template references against
/// `snapshot`. Pure: the same inputs always produce the same result.
///
/// Only membership is checked. Anything that needs live account state, or
/// knowledge of which actions pair with which resource types, is left to FIS
/// itself when the template is created.
pub fn validate(snapshot: &CapabilitySnapshot, template: &ExperimentTemplate) -> ValidationResult {
    let mut result = ValidationResult::new();

    if snapshot.is_empty() {
        result.warnings.push(
            "No cached FIS capabilities available for validation. \
             Please refresh the cache with current AWS data."
                .to_string(),
        );
    } else {
        let known_actions = snapshot.action_ids();
        let known_types = snapshot.resource_type_names();

        for action in template.actions.values() {
            let id = action.action_id.as_str();
            if !known_actions.contains(id) && !result.invalid_actions.iter().any(|a| a == id) {
                result.invalid_actions.push(id.to_string());
                result.error(format!(
                    "Action '{id}' is not available in current capabilities"
                ));
            }
        }

        for target in template.targets.values() {
            let ty = target.resource_type.as_str();
            if !known_types.contains(ty) && !result.invalid_resource_types.iter().any(|t| t == ty)
            {
                result.invalid_resource_types.push(ty.to_string());
                result.error(format!(
                    "Resource type '{ty}' is not available in current capabilities"
                ));
            }
        }
    }

    advise(template, &mut result);
    result
}

/// Parse `value` and validate it. Malformed input becomes a failed result
/// rather than an error so callers always get something to show.
pub fn validate_value(snapshot: &CapabilitySnapshot, value: &Value) -> ValidationResult {
    match ExperimentTemplate::from_value(value) {
        Ok(template) => validate(snapshot, &template),
        Err(e) => {
            let mut result = ValidationResult::new();
            let reason = match e {
                crate::ChaosError::MalformedTemplate(reason) => reason,
                other => other.to_string(),
            };
            result.error(format!("Malformed template: {reason}"));
            result
        }
    }
}

/// Validate against whatever the cache returned for a region. Stale data is
/// still used, with a warning saying so.
pub fn validate_lookup(lookup: &CacheLookup, value: &Value) -> ValidationResult {
    let mut result = validate_value(&lookup.snapshot(), value);
    if lookup.status == CacheStatus::Stale {
        let since = lookup
            .last_updated
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string());
        result.warnings.insert(
            0,
            format!(
                "Cached capabilities for {} are stale (last updated {since}); \
                 refresh the cache to validate against current data",
                lookup.region
            ),
        );
    }
    result
}

/// Advisory findings. These never change `valid`.
fn advise(template: &ExperimentTemplate, result: &mut ValidationResult) {
    for (name, action) in &template.actions {
        for target_ref in &action.target_refs {
            if !template.targets.contains_key(target_ref) {
                result.warnings.push(format!(
                    "Action '{name}' references target '{target_ref}', which the template does not define"
                ));
            }
        }
    }

    for (name, target) in &template.targets {
        if target.selector.is_unbounded() {
            result.warnings.push(format!(
                "Target '{name}' selects all resources of type '{}' with no ARNs, tags, or filters to narrow it",
                target.resource_type
            ));
        }
    }

    if !template.actions.is_empty() && !template.has_stop_condition() {
        result.warnings.push(
            "No stop condition configured; the experiment has no safety bound".to_string(),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
