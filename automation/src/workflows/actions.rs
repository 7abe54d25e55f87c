// Workflow Actions - Work items executed when a step fires

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Types of actions a workflow step can run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    // Client communication
    SendEmail,
    SendQuestionnaire,
    EmailCampaign,

    // Documents and billing
    SendContract,
    SendInvoice,

    // Record updates
    ChangeStatus,
    ChangeLeadStatus,
    ChangeAssignee,
    UpdateTags,

    // Studio operations
    CreateTask,
    TriggerWorkflow,
}

/// An action authored on a workflow step
///
/// The id is part of the stored definition, not generated at load time;
/// deferred-job deduplication keys on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub config: HashMap<String, String>,
    /// Days to wait after the step fires before executing
    #[serde(rename = "delay", default)]
    pub delay_days: u32,
}

impl Action {
    pub fn new(id: &str, action_type: ActionType) -> Self {
        Self {
            id: id.to_string(),
            action_type,
            config: HashMap::new(),
            delay_days: 0,
        }
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_delay(mut self, days: u32) -> Self {
        self.delay_days = days;
        self
    }

    // ===== Action Builders =====

    pub fn send_email(id: &str, template_id: &str) -> Self {
        Self::new(id, ActionType::SendEmail).with_config("templateId", template_id)
    }

    pub fn send_questionnaire(id: &str, questionnaire_id: &str) -> Self {
        Self::new(id, ActionType::SendQuestionnaire).with_config("questionnaireId", questionnaire_id)
    }

    pub fn send_contract(id: &str, contract_template: &str) -> Self {
        Self::new(id, ActionType::SendContract).with_config("contractTemplate", contract_template)
    }

    pub fn send_invoice(id: &str, invoice_type: &str, amount: &str) -> Self {
        Self::new(id, ActionType::SendInvoice)
            .with_config("invoiceType", invoice_type)
            .with_config("amount", amount)
    }

    pub fn change_status(id: &str, status: &str) -> Self {
        Self::new(id, ActionType::ChangeStatus).with_config("status", status)
    }

    pub fn change_lead_status(id: &str, status: &str) -> Self {
        Self::new(id, ActionType::ChangeLeadStatus).with_config("status", status)
    }

    pub fn change_assignee(id: &str, assignee: &str) -> Self {
        Self::new(id, ActionType::ChangeAssignee).with_config("assignee", assignee)
    }

    pub fn update_tags(id: &str, tags: &str) -> Self {
        Self::new(id, ActionType::UpdateTags).with_config("tags", tags)
    }

    pub fn create_task(id: &str, task_name: &str, assignee: &str, due_in_days: u32) -> Self {
        Self::new(id, ActionType::CreateTask)
            .with_config("taskName", task_name)
            .with_config("assignee", assignee)
            .with_config("dueInDays", &due_in_days.to_string())
    }

    pub fn email_campaign(id: &str, campaign_id: &str) -> Self {
        Self::new(id, ActionType::EmailCampaign).with_config("campaignId", campaign_id)
    }

    pub fn trigger_workflow(id: &str, workflow_id: i64) -> Self {
        Self::new(id, ActionType::TriggerWorkflow).with_config("workflowId", &workflow_id.to_string())
    }
}
