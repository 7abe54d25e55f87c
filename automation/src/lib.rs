//! Workflow automation engine for the Shutterflow studio platform
//!
//! Workflows pair triggers (business events or date offsets) with
//! actions. When a trigger matches and its conditions pass, the step's
//! actions become idempotent deferred jobs, executed later by a
//! pluggable action executor.

pub mod config;
pub mod error;
pub mod jobs;
pub mod store;
pub mod validation;
pub mod workflows;

pub use config::AutomationConfig;
pub use error::{EngineError, ValidationError};
pub use jobs::{AutomationScheduler, JobError, JobExecutionLog};
pub use store::{
    EntityStore, InMemoryEntityStore, InMemoryWorkflowStore, NewWorkflow, StoreError,
    TimeCandidate, WorkflowRecord, WorkflowStore, WorkflowUpdate,
};
pub use validation::validate_workflow;
pub use workflows::{
    Action, ActionExecutionRequest, ActionExecutor, ActionScheduler, ActionType, ClockTick,
    Condition, ConditionField, ConditionOperator, DomainEvent, EventType, InMemoryJobQueue,
    JobDispatcher, JobQueue, PassSummary, Step, TimeDirection, TimeReference, Trigger, Workflow,
    WorkflowEngine,
};

#[cfg(test)]
mod tests;
