// Workflow Triggers - Event and date-offset triggers for automation steps

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shutterflow_shared::{Client, Contract, Gallery, Invoice, Proposal, Shoot};

use super::conditions::Condition;

/// Business events that can trigger workflow steps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Lead and sales events
    NewLead,
    ProposalAccepted,
    ContractSigned,
    InvoicePaid,

    // Client communication events
    QuestionnaireSubmitted,
    EmailOpened,

    // Shoot and delivery events
    ShootCompleted,
    GalleryDelivered,
    GalleryViewed,
}

/// Date fields a time trigger can anchor to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeReference {
    ShootDate,
    InvoiceDueDate,
    ContractDate,
    GalleryDeliveryDate,
}

/// Whether the offset counts back from or forward from the reference date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeDirection {
    Before,
    After,
}

/// What causes a step to be considered for firing
///
/// Serialized with a `type` tag so stored definitions distinguish the two
/// variants explicitly; a trigger can never carry both an event type and a
/// time reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    #[serde(rename_all = "camelCase")]
    Event {
        event_type: EventType,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
    #[serde(rename_all = "camelCase")]
    Time {
        time_reference: TimeReference,
        time_offset: u32,
        time_direction: TimeDirection,
        #[serde(default)]
        conditions: Vec<Condition>,
    },
}

impl Trigger {
    /// Create an event trigger with no conditions
    pub fn on_event(event_type: EventType) -> Self {
        Trigger::Event {
            event_type,
            conditions: Vec::new(),
        }
    }

    /// Create a time trigger firing N days before the reference date
    pub fn days_before(reference: TimeReference, days: u32) -> Self {
        Trigger::Time {
            time_reference: reference,
            time_offset: days,
            time_direction: TimeDirection::Before,
            conditions: Vec::new(),
        }
    }

    /// Create a time trigger firing N days after the reference date
    pub fn days_after(reference: TimeReference, days: u32) -> Self {
        Trigger::Time {
            time_reference: reference,
            time_offset: days,
            time_direction: TimeDirection::After,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        match &mut self {
            Trigger::Event { conditions, .. } => conditions.push(condition),
            Trigger::Time { conditions, .. } => conditions.push(condition),
        }
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        match self {
            Trigger::Event { conditions, .. } => conditions,
            Trigger::Time { conditions, .. } => conditions,
        }
    }

    /// The target calendar day on which a time trigger fires for the given
    /// reference date. Event triggers have no target day.
    pub fn target_date(&self, reference_date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Trigger::Event { .. } => None,
            Trigger::Time {
                time_offset,
                time_direction,
                ..
            } => {
                let offset = chrono::Duration::days(*time_offset as i64);
                Some(match time_direction {
                    TimeDirection::Before => reference_date - offset,
                    TimeDirection::After => reference_date + offset,
                })
            }
        }
    }
}

/// Point-in-time view of the entity a trigger fired for
pub type EntitySnapshot = serde_json::Value;

/// A business event delivered to the automation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub event_type: EventType,
    pub entity_id: i64,
    pub entity_snapshot: EntitySnapshot,
    pub occurred_at: DateTime<Utc>,
}

/// A daily clock tick delivered by the scheduling layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockTick {
    pub now: NaiveDate,
}

impl DomainEvent {
    /// Create a new domain event
    pub fn new(event_type: EventType, entity_id: i64, entity_snapshot: EntitySnapshot) -> Self {
        Self {
            event_type,
            entity_id,
            entity_snapshot,
            occurred_at: Utc::now(),
        }
    }

    /// Create a new lead event from a freshly created client
    pub fn new_lead(client: &Client) -> Self {
        Self::new(
            EventType::NewLead,
            client.id,
            serde_json::json!({
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "client_email": client.email
            }),
        )
    }

    /// Create a proposal accepted event
    pub fn proposal_accepted(proposal: &Proposal, client: &Client) -> Self {
        Self::new(
            EventType::ProposalAccepted,
            proposal.id,
            serde_json::json!({
                "proposal_status": "accepted",
                "order_amount": proposal.total_amount.as_ref().map(|a| a.to_string()),
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "proposal_title": proposal.title
            }),
        )
    }

    /// Create a contract signed event
    pub fn contract_signed(contract: &Contract, client: &Client) -> Self {
        Self::new(
            EventType::ContractSigned,
            contract.id,
            serde_json::json!({
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "contract_title": contract.title
            }),
        )
    }

    /// Create an invoice paid event
    pub fn invoice_paid(invoice: &Invoice, client: &Client) -> Self {
        Self::new(
            EventType::InvoicePaid,
            invoice.id,
            serde_json::json!({
                "payment_status": "paid",
                "order_amount": invoice.total.to_string(),
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "invoice_number": invoice.invoice_number
            }),
        )
    }

    /// Create a questionnaire submitted event
    pub fn questionnaire_submitted(client: &Client, questionnaire: &str) -> Self {
        Self::new(
            EventType::QuestionnaireSubmitted,
            client.id,
            serde_json::json!({
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "questionnaire": questionnaire
            }),
        )
    }

    /// Create an email opened event
    pub fn email_opened(client: &Client, subject: &str) -> Self {
        Self::new(
            EventType::EmailOpened,
            client.id,
            serde_json::json!({
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "email_subject": subject
            }),
        )
    }

    /// Create a shoot completed event
    pub fn shoot_completed(shoot: &Shoot, client: &Client) -> Self {
        Self::new(
            EventType::ShootCompleted,
            shoot.id,
            serde_json::json!({
                "shoot_type": shoot.shoot_type,
                "shoot_status": "completed",
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "shoot_title": shoot.title,
                "shoot_location": shoot.location
            }),
        )
    }

    /// Create a gallery delivered event
    pub fn gallery_delivered(gallery: &Gallery, client: &Client) -> Self {
        Self::new(
            EventType::GalleryDelivered,
            gallery.id,
            serde_json::json!({
                "gallery_status": "delivered",
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "gallery_title": gallery.title
            }),
        )
    }

    /// Create a gallery viewed event
    pub fn gallery_viewed(gallery: &Gallery, client: &Client) -> Self {
        Self::new(
            EventType::GalleryViewed,
            gallery.id,
            serde_json::json!({
                "gallery_status": gallery.status,
                "client_type": client.client_type,
                "lead_source": client.lead_source,
                "client_city": client.city,
                "client_name": client.name,
                "gallery_title": gallery.title
            }),
        )
    }

    /// Override the event timestamp, for replays and tests
    pub fn with_occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }
}
