// Workflow Conditions - Field predicates narrowing when a trigger fires

use serde::{Deserialize, Serialize};

/// Entity attributes a condition can inspect
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    ShootType,
    ClientType,
    LeadSource,
    ShootStatus,
    PaymentStatus,
    ProposalStatus,
    GalleryStatus,
    OrderAmount,
    ClientCity,
}

impl ConditionField {
    /// The snapshot key this field resolves against
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionField::ShootType => "shoot_type",
            ConditionField::ClientType => "client_type",
            ConditionField::LeadSource => "lead_source",
            ConditionField::ShootStatus => "shoot_status",
            ConditionField::PaymentStatus => "payment_status",
            ConditionField::ProposalStatus => "proposal_status",
            ConditionField::GalleryStatus => "gallery_status",
            ConditionField::OrderAmount => "order_amount",
            ConditionField::ClientCity => "client_city",
        }
    }
}

/// Comparison operators for conditions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// A single condition to evaluate against an entity snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    /// Entity attribute to inspect
    pub field: ConditionField,
    /// Operator for comparison
    pub operator: ConditionOperator,
    /// Value to compare against, always authored as text
    pub value: String,
}

impl Condition {
    pub fn new(field: ConditionField, operator: ConditionOperator, value: &str) -> Self {
        Self {
            field,
            operator,
            value: value.to_string(),
        }
    }

    pub fn equals(field: ConditionField, value: &str) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    pub fn not_equals(field: ConditionField, value: &str) -> Self {
        Self::new(field, ConditionOperator::NotEquals, value)
    }

    pub fn contains(field: ConditionField, value: &str) -> Self {
        Self::new(field, ConditionOperator::Contains, value)
    }

    pub fn greater_than(field: ConditionField, value: f64) -> Self {
        Self::new(field, ConditionOperator::GreaterThan, &value.to_string())
    }

    pub fn less_than(field: ConditionField, value: f64) -> Self {
        Self::new(field, ConditionOperator::LessThan, &value.to_string())
    }
}

/// Evaluate a condition list against an entity snapshot.
///
/// Conditions combine with logical AND; an empty list is vacuously true.
/// A condition whose field is missing from the snapshot is false for every
/// operator, so steps never fire on incomplete data.
pub fn evaluate(conditions: &[Condition], entity: &serde_json::Value) -> bool {
    conditions.iter().all(|c| evaluate_condition(c, entity))
}

fn evaluate_condition(condition: &Condition, entity: &serde_json::Value) -> bool {
    let field_value = match entity.get(condition.field.as_str()).and_then(stringify) {
        Some(v) => v,
        None => return false,
    };

    match condition.operator {
        ConditionOperator::Equals => field_value == condition.value,
        ConditionOperator::NotEquals => field_value != condition.value,
        ConditionOperator::Contains => field_value.contains(&condition.value),
        ConditionOperator::GreaterThan => compare_numeric(&field_value, &condition.value, |a, b| a > b),
        ConditionOperator::LessThan => compare_numeric(&field_value, &condition.value, |a, b| a < b),
    }
}

/// Render a scalar snapshot value as text. Null and container values have
/// no textual form and make the condition fail closed.
fn stringify(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

fn compare_numeric<F>(field_value: &str, condition_value: &str, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (field_value.parse::<f64>(), condition_value.parse::<f64>()) {
        (Ok(a), Ok(b)) => cmp(a, b),
        _ => false,
    }
}
