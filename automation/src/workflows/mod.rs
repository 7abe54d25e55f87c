// Workflow Automation Engine
//
// Event-driven automation for the Shutterflow studio platform.
// Triggers match business events and date offsets, conditions filter
// entities, and actions are scheduled as idempotent deferred jobs.

pub mod engine;
pub mod triggers;
pub mod conditions;
pub mod actions;
pub mod scheduler;
pub mod executor;
pub mod templates;

pub use engine::{PassSummary, Step, Workflow, WorkflowEngine};
pub use triggers::{ClockTick, DomainEvent, EventType, TimeDirection, TimeReference, Trigger};
pub use conditions::{evaluate, Condition, ConditionField, ConditionOperator};
pub use actions::{Action, ActionType};
pub use scheduler::{ActionScheduler, EnqueueOutcome, InMemoryJobQueue, JobQueue, ScheduledJob};
pub use executor::{ActionExecutionRequest, ActionExecutor, JobDispatcher};
