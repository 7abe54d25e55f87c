// Workflow Storage - Persistence contracts consumed by the automation engine
//
// The engine depends on these traits only; concrete backends are injected.
// In-memory implementations live in `memory` and back the test suite and
// small single-process deployments.

mod memory;

pub use memory::{InMemoryEntityStore, InMemoryWorkflowStore};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflows::triggers::{EntitySnapshot, TimeReference};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("workflow store unavailable: {0}")]
    Unavailable(String),
    #[error("workflow {0} not found")]
    WorkflowNotFound(i64),
}

/// A stored workflow definition.
///
/// Steps are kept as the raw JSON the builder produced; evaluation passes
/// decode them step by step so one malformed step cannot take down its
/// siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub steps: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkflow {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub steps: serde_json::Value,
}

/// Partial update applied to a stored workflow
#[derive(Debug, Clone, Default)]
pub struct WorkflowUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub steps: Option<serde_json::Value>,
}

/// Definition persistence as the engine sees it
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<WorkflowRecord>, StoreError>;

    /// Only workflows with the active flag set; the match path never sees
    /// deactivated definitions.
    async fn active_workflows(&self) -> Result<Vec<WorkflowRecord>, StoreError>;

    async fn create(&self, workflow: NewWorkflow) -> Result<WorkflowRecord, StoreError>;

    async fn update(&self, id: i64, changes: WorkflowUpdate) -> Result<WorkflowRecord, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn set_active(&self, id: i64, active: bool) -> Result<WorkflowRecord, StoreError>;
}

/// One live entity resolved for a time trigger's reference date
#[derive(Debug, Clone)]
pub struct TimeCandidate {
    pub entity_id: i64,
    pub reference_date: NaiveDate,
    pub snapshot: EntitySnapshot,
}

/// Read access to the studio records that time triggers scan
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Every live entity carrying the given reference date, with the
    /// snapshot its conditions will be evaluated against. Entities whose
    /// reference date is unset are not candidates.
    async fn time_candidates(&self, reference: TimeReference)
        -> Result<Vec<TimeCandidate>, StoreError>;
}
