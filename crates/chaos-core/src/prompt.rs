use crate::capability::{FisAction, ResourceType};

const ACTIONS_SLOT: &str = "{{FIS_ACTIONS}}";
const RESOURCE_TYPES_SLOT: &str = "{{RESOURCE_TYPES}}";
const ARCHITECTURE_SLOT: &str = "{{ARCHITECTURE}}";

const SYSTEM_PROMPT: &str = r#"You are an expert in building large, complex systems on AWS with a focus on operational excellence and high availability. You understand how large distributed systems fail and how those failures are mitigated: databases, storage, web and application servers, language runtimes, caches, and load balancers. Experiments you design must be suitable for organisations with strict compliance requirements.

Study the application architecture between the <arch> </arch> tags and propose AWS Fault Injection Service (FIS) experiments that apply to it. Answer in two parts: first a concise description of the experiments that fit this architecture, then a runnable JSON experiment template for them. Close with an overview stating whether a stop condition exists, which instance, database, storage, or other names the user must fill in, and which IAM role permissions are needed to run the experiment.

CRITICAL: Only use these FIS actions, which are currently valid in this region:
<valid_fis_actions>
{{FIS_ACTIONS}}
</valid_fis_actions>

CRITICAL: Only use these resource types:
<valid_resource_types>
{{RESOURCE_TYPES}}
</valid_resource_types>

SAFETY GUIDELINES:
- Always include a stop condition so an experiment cannot run away
- Escalate gradually, starting with the least disruptive actions
- Scope every target to specific resources, never a whole environment
- Describe how to roll back and recover
- Respect business hours and maintenance windows
- Include monitoring and alarms that track the experiment

CONSTRAINTS:
- Use only action IDs from valid_fis_actions
- Use only resource types from valid_resource_types
- Parameterize every ARN (for example "arn:aws:ec2:REGION:ACCOUNT_ID:instance/INSTANCE_ID")
- State the IAM role requirements in the overview
- Emit valid, deployable JSON
- Give every action and target a description

EXAMPLE TEMPLATES:

Example 1 - stop EC2 instances:
```json
{
  "description": "Stop half of the web tier to exercise auto-recovery",
  "roleArn": "arn:aws:iam::ACCOUNT_ID:role/FISExperimentRole",
  "actions": {
    "StopInstances": {
      "actionId": "aws:ec2:stop-instances",
      "description": "Stop instances for ten minutes",
      "parameters": { "startInstancesAfterDuration": "PT10M" },
      "targets": { "Instances": "WebServers" }
    }
  },
  "targets": {
    "WebServers": {
      "resourceType": "aws:ec2:instance",
      "resourceTags": { "Tier": "web" },
      "selectionMode": "PERCENT(50)"
    }
  },
  "stopConditions": [
    { "source": "aws:cloudwatch:alarm", "value": "arn:aws:cloudwatch:REGION:ACCOUNT_ID:alarm:HighErrorRate" }
  ]
}
```

Example 2 - fail over an Aurora cluster:
```json
{
  "description": "Force a cluster failover to verify database reconnect handling",
  "roleArn": "arn:aws:iam::ACCOUNT_ID:role/FISExperimentRole",
  "actions": {
    "FailoverCluster": {
      "actionId": "aws:rds:failover-db-cluster",
      "description": "Fail over the primary writer",
      "targets": { "Clusters": "Database" }
    }
  },
  "targets": {
    "Database": {
      "resourceType": "aws:rds:cluster",
      "resourceArns": [ "arn:aws:rds:REGION:ACCOUNT_ID:cluster:CLUSTER_ID" ],
      "selectionMode": "ALL"
    }
  },
  "stopConditions": [
    { "source": "aws:cloudwatch:alarm", "value": "arn:aws:cloudwatch:REGION:ACCOUNT_ID:alarm:DatabaseConnectionFailures" }
  ]
}
```

Generate experiments for the following AWS architecture:
<arch>
{{ARCHITECTURE}}
</arch>"#;

/// Render the template-authoring system prompt with the current capability
/// lists and the user's architecture description injected.
pub fn render_system_prompt(
    fis_actions: &[FisAction],
    resource_types: &[ResourceType],
    architecture: &str,
) -> String {
    fill_slots(
        SYSTEM_PROMPT,
        &[
            (ACTIONS_SLOT, format_actions(fis_actions)),
            (RESOURCE_TYPES_SLOT, format_resource_types(resource_types)),
            (ARCHITECTURE_SLOT, architecture.trim().to_string()),
        ],
    )
}

/// Single left-to-right pass over `template`. Substituted text is copied
/// verbatim and never scanned for further slots.
fn fill_slots(template: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = slots
            .iter()
            .filter_map(|(slot, value)| rest.find(slot).map(|at| (at, *slot, value)))
            .min_by_key(|(at, _, _)| *at);
        match next {
            Some((at, slot, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + slot.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

pub fn format_actions(fis_actions: &[FisAction]) -> String {
    if fis_actions.is_empty() {
        return "No FIS actions available. Please refresh the cache.".to_string();
    }
    fis_actions
        .iter()
        .map(|a| bullet(&a.id, &a.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_resource_types(resource_types: &[ResourceType]) -> String {
    if resource_types.is_empty() {
        return "No resource types available. Please refresh the cache.".to_string();
    }
    resource_types
        .iter()
        .map(|r| bullet(&r.type_name, &r.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullet(ident: &str, description: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        format!("- {ident}: No description available")
    } else {
        format!("- {ident}: {description}")
    }
}
