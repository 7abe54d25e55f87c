//! Authoring-time validation for workflow definitions
//!
//! The match path tolerates malformed stored steps by skipping them, so
//! these checks run when a workflow is created or edited, keeping broken
//! definitions out of the store in the first place.

use std::collections::HashSet;

use crate::error::{ValidationBuilder, ValidationError};
use crate::workflows::{Action, ActionType, ConditionOperator, Trigger, Workflow};

/// Largest supported date offset for time triggers
pub const MAX_TIME_OFFSET_DAYS: u32 = 365;

/// Check a workflow definition before it is stored.
///
/// All problems are reported at once, keyed by a path-like field name
/// such as `steps[0].actions[1]`.
pub fn validate_workflow(workflow: &Workflow) -> Result<(), ValidationError> {
    let mut builder = ValidationBuilder::new();

    if workflow.name.trim().is_empty() {
        builder = builder.error("name", "Name is required");
    }
    if workflow.steps.is_empty() {
        builder = builder.error("steps", "Workflow must have at least one step");
    }

    let mut step_ids = HashSet::new();
    for (index, step) in workflow.steps.iter().enumerate() {
        let prefix = format!("steps[{}]", index);

        if step.id.trim().is_empty() {
            builder = builder.error(&prefix, "Step id is required");
        } else if !step_ids.insert(step.id.clone()) {
            builder = builder.error(&prefix, "Step id must be unique within the workflow");
        }

        builder = check_trigger(builder, &prefix, &step.trigger);

        if step.actions.is_empty() {
            builder = builder.error(
                &format!("{}.actions", prefix),
                "Step must have at least one action",
            );
        }
        let mut action_ids = HashSet::new();
        for (action_index, action) in step.actions.iter().enumerate() {
            let field = format!("{}.actions[{}]", prefix, action_index);
            if action.id.trim().is_empty() {
                builder = builder.error(&field, "Action id is required");
            } else if !action_ids.insert(action.id.clone()) {
                builder = builder.error(&field, "Action id must be unique within the step");
            }
            builder = check_action(builder, &field, action);
        }
    }

    match builder.build() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn check_trigger(
    mut builder: ValidationBuilder,
    prefix: &str,
    trigger: &Trigger,
) -> ValidationBuilder {
    if let Trigger::Time { time_offset, .. } = trigger {
        if *time_offset > MAX_TIME_OFFSET_DAYS {
            builder = builder.error(
                &format!("{}.trigger.timeOffset", prefix),
                &format!("Offset must be {} days or less", MAX_TIME_OFFSET_DAYS),
            );
        }
    }

    for (index, condition) in trigger.conditions().iter().enumerate() {
        let field = format!("{}.trigger.conditions[{}]", prefix, index);
        if condition.value.trim().is_empty() {
            builder = builder.error(&field, "Condition value is required");
        } else if matches!(
            condition.operator,
            ConditionOperator::GreaterThan | ConditionOperator::LessThan
        ) && condition.value.parse::<f64>().is_err()
        {
            builder = builder.error(&field, "Numeric comparison requires a numeric value");
        }
    }

    builder
}

fn check_action(mut builder: ValidationBuilder, field: &str, action: &Action) -> ValidationBuilder {
    let key = required_config_key(action.action_type);
    match action.config.get(key) {
        Some(value) if !value.trim().is_empty() => {}
        _ => {
            builder = builder.error(field, &format!("{} is required", key));
            return builder;
        }
    }

    if action.action_type == ActionType::TriggerWorkflow {
        let raw = action.config.get(key).map(String::as_str).unwrap_or("");
        if raw.parse::<i64>().is_err() {
            builder = builder.error(field, "workflowId must be a numeric workflow id");
        }
    }

    builder
}

/// The one config key every action of a given type must carry
pub fn required_config_key(action_type: ActionType) -> &'static str {
    match action_type {
        ActionType::SendEmail => "templateId",
        ActionType::SendQuestionnaire => "questionnaireId",
        ActionType::EmailCampaign => "campaignId",
        ActionType::SendContract => "contractTemplate",
        ActionType::SendInvoice => "invoiceType",
        ActionType::ChangeStatus | ActionType::ChangeLeadStatus => "status",
        ActionType::ChangeAssignee => "assignee",
        ActionType::UpdateTags => "tags",
        ActionType::CreateTask => "taskName",
        ActionType::TriggerWorkflow => "workflowId",
    }
}
