//! Experiment template model.
//!
//! Templates arrive as loose JSON drafted by an LLM, in either the FIS API
//! shape (`actions` / `targets`) or as a CloudFormation document containing
//! `AWS::FIS::ExperimentTemplate` resources. Both are normalised into
//! [`ExperimentTemplate`]. Wrong-shaped fields are reported as
//! [`ChaosError::MalformedTemplate`] with the JSON path of the offending
//! field; they are never skipped.

use crate::error::{ChaosError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const CFN_EXPERIMENT_TYPE: &str = "AWS::FIS::ExperimentTemplate";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperimentTemplate {
    pub description: Option<String>,
    pub actions: BTreeMap<String, TemplateAction>,
    pub targets: BTreeMap<String, TemplateTarget>,
    pub stop_conditions: Vec<StopCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateAction {
    pub action_id: String,
    /// Names of template targets this action is aimed at.
    pub target_refs: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateTarget {
    pub resource_type: String,
    pub selector: TargetSelector,
}

/// How a target picks its resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetSelector {
    pub selection_mode: Option<String>,
    pub resource_arns: Vec<String>,
    pub resource_tags: BTreeMap<String, String>,
    pub filter_count: usize,
}

impl TargetSelector {
    /// True when nothing narrows the selection below "every resource of
    /// this type in the account".
    pub fn is_unbounded(&self) -> bool {
        let selects_all = self
            .selection_mode
            .as_deref()
            .map(|m| m.trim().eq_ignore_ascii_case("ALL"))
            .unwrap_or(true);
        selects_all
            && self.resource_arns.is_empty()
            && self.resource_tags.is_empty()
            && self.filter_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopCondition {
    pub source: String,
    pub value: Option<String>,
}

impl StopCondition {
    pub fn is_bounding(&self) -> bool {
        !self.source.trim().eq_ignore_ascii_case("none")
    }
}

impl ExperimentTemplate {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| malformed("template", &format!("not valid JSON ({e})")))?;
        Self::from_value(&value)
    }

    /// Parse either template shape. A JSON string holding a template is
    /// unwrapped first, since agents often pass templates pre-serialized.
    pub fn from_value(value: &Value) -> Result<Self> {
        if let Value::String(text) = value {
            return Self::from_json_str(text);
        }
        let root = value
            .as_object()
            .ok_or_else(|| malformed("template", "expected a JSON object"))?;

        let mut template = ExperimentTemplate {
            description: opt_str(root, "template", &["description", "Description"])?,
            ..Default::default()
        };

        parse_body(root, "", Shape::Api, &mut template)?;

        if let Some(resources) = root.get("Resources") {
            let resources = resources
                .as_object()
                .ok_or_else(|| malformed("Resources", "expected an object"))?;
            for (logical_id, resource) in resources {
                let path = format!("Resources.{logical_id}");
                let resource = resource
                    .as_object()
                    .ok_or_else(|| malformed(&path, "expected an object"))?;
                if resource.get("Type").and_then(Value::as_str) != Some(CFN_EXPERIMENT_TYPE) {
                    continue;
                }
                let props_path = format!("{path}.Properties");
                let props = resource
                    .get("Properties")
                    .ok_or_else(|| malformed(&props_path, "missing"))?
                    .as_object()
                    .ok_or_else(|| malformed(&props_path, "expected an object"))?;
                parse_body(
                    props,
                    &props_path,
                    Shape::CloudFormation(logical_id.as_str()),
                    &mut template,
                )?;
            }
        }

        if template.actions.is_empty() && template.targets.is_empty() {
            return Err(malformed("template", "defines no actions or targets"));
        }
        Ok(template)
    }

    pub fn has_stop_condition(&self) -> bool {
        self.stop_conditions.iter().any(StopCondition::is_bounding)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Shape<'a> {
    Api,
    /// Names are scoped by the owning resource's logical id so two
    /// experiment resources can reuse action and target names.
    CloudFormation(&'a str),
}

impl Shape<'_> {
    fn key(self, camel: &'static str, pascal: &'static str) -> &'static str {
        match self {
            Shape::Api => camel,
            Shape::CloudFormation(_) => pascal,
        }
    }

    fn scoped(self, name: &str) -> String {
        match self {
            Shape::Api => name.to_string(),
            Shape::CloudFormation(logical_id) => format!("{logical_id}.{name}"),
        }
    }
}

fn parse_body(
    obj: &Map<String, Value>,
    base: &str,
    shape: Shape<'_>,
    template: &mut ExperimentTemplate,
) -> Result<()> {
    let join = |key: &str| {
        if base.is_empty() {
            key.to_string()
        } else {
            format!("{base}.{key}")
        }
    };

    let actions_key = shape.key("actions", "Actions");
    if let Some(actions) = obj.get(actions_key) {
        let path = join(actions_key);
        let actions = actions
            .as_object()
            .ok_or_else(|| malformed(&path, "expected an object"))?;
        for (name, entry) in actions {
            let action = parse_action(entry, &format!("{path}.{name}"), shape)?;
            template.actions.insert(shape.scoped(name), action);
        }
    }

    let targets_key = shape.key("targets", "Targets");
    if let Some(targets) = obj.get(targets_key) {
        let path = join(targets_key);
        let targets = targets
            .as_object()
            .ok_or_else(|| malformed(&path, "expected an object"))?;
        for (name, entry) in targets {
            let target = parse_target(entry, &format!("{path}.{name}"), shape)?;
            template.targets.insert(shape.scoped(name), target);
        }
    }

    let stop_key = shape.key("stopConditions", "StopConditions");
    if let Some(conditions) = obj.get(stop_key) {
        let path = join(stop_key);
        let conditions = conditions
            .as_array()
            .ok_or_else(|| malformed(&path, "expected an array"))?;
        for (i, entry) in conditions.iter().enumerate() {
            let entry_path = format!("{path}[{i}]");
            let entry = entry
                .as_object()
                .ok_or_else(|| malformed(&entry_path, "expected an object"))?;
            let source_key = shape.key("source", "Source");
            let source = req_str(entry, &entry_path, source_key)?;
            let value = opt_str(entry, &entry_path, &[shape.key("value", "Value")])?;
            template.stop_conditions.push(StopCondition { source, value });
        }
    }

    Ok(())
}

fn parse_action(entry: &Value, path: &str, shape: Shape<'_>) -> Result<TemplateAction> {
    let obj = entry
        .as_object()
        .ok_or_else(|| malformed(path, "expected an object"))?;
    let action_id = req_str(obj, path, shape.key("actionId", "ActionId"))?;
    let description = opt_str(obj, path, &[shape.key("description", "Description")])?;

    let mut target_refs = Vec::new();
    let targets_key = shape.key("targets", "Targets");
    if let Some(targets) = obj.get(targets_key) {
        let targets_path = format!("{path}.{targets_key}");
        let targets = targets
            .as_object()
            .ok_or_else(|| malformed(&targets_path, "expected an object"))?;
        for (slot, name) in targets {
            let name = name
                .as_str()
                .ok_or_else(|| malformed(&format!("{targets_path}.{slot}"), "expected a string"))?;
            target_refs.push(shape.scoped(name));
        }
    }
    if let Some(name) = opt_str(obj, path, &["targetRef"])? {
        target_refs.push(shape.scoped(&name));
    }

    Ok(TemplateAction {
        action_id,
        target_refs,
        description,
    })
}

fn parse_target(entry: &Value, path: &str, shape: Shape<'_>) -> Result<TemplateTarget> {
    let obj = entry
        .as_object()
        .ok_or_else(|| malformed(path, "expected an object"))?;
    let resource_type = req_str(obj, path, shape.key("resourceType", "ResourceType"))?;
    let selection_mode = opt_str(obj, path, &[shape.key("selectionMode", "SelectionMode")])?;

    let mut resource_arns = Vec::new();
    let arns_key = shape.key("resourceArns", "ResourceArns");
    if let Some(arns) = obj.get(arns_key) {
        let arns_path = format!("{path}.{arns_key}");
        let arns = arns
            .as_array()
            .ok_or_else(|| malformed(&arns_path, "expected an array"))?;
        for (i, arn) in arns.iter().enumerate() {
            let arn = arn
                .as_str()
                .ok_or_else(|| malformed(&format!("{arns_path}[{i}]"), "expected a string"))?;
            resource_arns.push(arn.to_string());
        }
    }

    let mut resource_tags = BTreeMap::new();
    let tags_key = shape.key("resourceTags", "ResourceTags");
    if let Some(tags) = obj.get(tags_key) {
        let tags = tags
            .as_object()
            .ok_or_else(|| malformed(&format!("{path}.{tags_key}"), "expected an object"))?;
        for (k, v) in tags {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            resource_tags.insert(k.clone(), v);
        }
    }

    let filters_key = shape.key("filters", "Filters");
    let filter_count = match obj.get(filters_key) {
        None => 0,
        Some(filters) => filters
            .as_array()
            .ok_or_else(|| malformed(&format!("{path}.{filters_key}"), "expected an array"))?
            .len(),
    };

    Ok(TemplateTarget {
        resource_type,
        selector: TargetSelector {
            selection_mode,
            resource_arns,
            resource_tags,
            filter_count,
        },
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn malformed(path: &str, reason: &str) -> ChaosError {
    ChaosError::MalformedTemplate(format!("{path}: {reason}"))
}

fn req_str(obj: &Map<String, Value>, path: &str, key: &str) -> Result<String> {
    let field_path = format!("{path}.{key}");
    let value = obj
        .get(key)
        .ok_or_else(|| malformed(&field_path, "missing"))?
        .as_str()
        .ok_or_else(|| malformed(&field_path, "expected a string"))?
        .trim();
    if value.is_empty() {
        return Err(malformed(&field_path, "must not be empty"));
    }
    Ok(value.to_string())
}

fn opt_str(obj: &Map<String, Value>, path: &str, keys: &[&str]) -> Result<Option<String>> {
    for key in keys {
        match obj.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => return Ok(Some(s.clone())),
            Some(_) => return Err(malformed(&format!("{path}.{key}"), "expected a string")),
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn malformed_msg(value: Value) -> String {
        match ExperimentTemplate::from_value(&value) {
            Err(ChaosError::MalformedTemplate(msg)) => msg,
            other => panic!("expected malformed template, got {other:?}"),
        }
    }

    #[test]
    fn parses_api_shape() {
        let template = ExperimentTemplate::from_value(&json!({
            "description": "Stop web servers",
            "actions": {
                "StopInstances": {
                    "actionId": "aws:ec2:stop-instances",
                    "parameters": {"startInstancesAfterDuration": "PT10M"},
                    "targets": {"Instances": "WebServers"}
                }
            },
            "targets": {
                "WebServers": {
                    "resourceType": "aws:ec2:instance",
                    "resourceTags": {"Env": "test"},
                    "selectionMode": "PERCENT(50)"
                }
            },
            "stopConditions": [{"source": "aws:cloudwatch:alarm", "value": "arn:alarm"}]
        }))
        .unwrap();

        let action = &template.actions["StopInstances"];
        assert_eq!(action.action_id, "aws:ec2:stop-instances");
        assert_eq!(action.target_refs, vec!["WebServers".to_string()]);
        let target = &template.targets["WebServers"];
        assert_eq!(target.resource_type, "aws:ec2:instance");
        assert!(!target.selector.is_unbounded());
        assert!(template.has_stop_condition());
        assert_eq!(template.description.as_deref(), Some("Stop web servers"));
    }

    #[test]
    fn accepts_target_ref_shorthand() {
        let template = ExperimentTemplate::from_value(&json!({
            "actions": {"A": {"actionId": "svc:stop-instance", "targetRef": "T"}},
            "targets": {"T": {"resourceType": "svc:instance"}}
        }))
        .unwrap();
        assert_eq!(template.actions["A"].target_refs, vec!["T".to_string()]);
        assert!(template.targets["T"].selector.is_unbounded());
        assert!(!template.has_stop_condition());
    }

    #[test]
    fn parses_cloudformation_shape() {
        let template = ExperimentTemplate::from_value(&json!({
            "Resources": {
                "Role": {"Type": "AWS::IAM::Role", "Properties": {"Targets": []}},
                "Experiment": {
                    "Type": "AWS::FIS::ExperimentTemplate",
                    "Properties": {
                        "Actions": {
                            "Failover": {
                                "ActionId": "aws:rds:failover-db-cluster",
                                "Targets": {"Clusters": "Db"}
                            }
                        },
                        "Targets": {
                            "Db": {
                                "ResourceType": "aws:rds:cluster",
                                "ResourceArns": ["arn:aws:rds:us-east-1:1:cluster:db"],
                                "SelectionMode": "ALL"
                            }
                        },
                        "StopConditions": [{"Source": "none"}]
                    }
                }
            }
        }))
        .unwrap();

        let action = &template.actions["Experiment.Failover"];
        assert_eq!(action.action_id, "aws:rds:failover-db-cluster");
        assert_eq!(action.target_refs, vec!["Experiment.Db".to_string()]);
        assert!(template.targets.contains_key("Experiment.Db"));
        assert!(!template.has_stop_condition());
    }

    #[test]
    fn unwraps_stringified_template() {
        let inner = json!({"targets": {"T": {"resourceType": "svc:instance"}}}).to_string();
        let template = ExperimentTemplate::from_value(&Value::String(inner)).unwrap();
        assert_eq!(template.targets.len(), 1);
    }

    #[test]
    fn malformed_inputs_name_the_offending_path() {
        assert_eq!(malformed_msg(json!([1, 2])), "template: expected a JSON object");
        assert_eq!(malformed_msg(json!({})), "template: defines no actions or targets");
        assert_eq!(
            malformed_msg(json!({"actions": ["aws:ec2:stop-instances"]})),
            "actions: expected an object"
        );
        assert_eq!(
            malformed_msg(json!({"actions": {"A": {"targetRef": "T"}}})),
            "actions.A.actionId: missing"
        );
        assert_eq!(
            malformed_msg(json!({"actions": {"A": {"actionId": 7}}})),
            "actions.A.actionId: expected a string"
        );
        assert_eq!(
            malformed_msg(json!({"targets": {"T": {"resourceType": "  "}}})),
            "targets.T.resourceType: must not be empty"
        );
        assert_eq!(
            malformed_msg(json!({"targets": {"T": {"resourceType": "x", "resourceArns": "arn"}}})),
            "targets.T.resourceArns: expected an array"
        );
        assert_eq!(
            malformed_msg(json!({
                "targets": {"T": {"resourceType": "x"}},
                "stopConditions": [{"value": "arn"}]
            })),
            "stopConditions[0].source: missing"
        );
    }

    #[test]
    fn invalid_json_text_is_malformed() {
        let err = ExperimentTemplate::from_json_str("{ nope").unwrap_err();
        assert!(err.to_string().starts_with("malformed template: template: not valid JSON"));
    }
}
