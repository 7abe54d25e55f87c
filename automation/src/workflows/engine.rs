// Workflow Engine - Matches events and clock ticks against workflow steps

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::actions::Action;
use super::conditions::evaluate;
use super::scheduler::{ActionScheduler, FiringContext};
use super::triggers::{ClockTick, DomainEvent, TimeReference, Trigger};
use crate::error::EngineError;
use crate::store::{EntityStore, NewWorkflow, TimeCandidate, WorkflowRecord, WorkflowStore};

/// One (trigger, actions) pairing within a workflow.
///
/// Steps are logically independent; each is evaluated on its own against
/// incoming events and ticks, and their order matters only for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub id: String,
    pub trigger: Trigger,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Step {
    pub fn new(id: &str, trigger: Trigger) -> Self {
        Self {
            id: id.to_string(),
            trigger,
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// A workflow definition as authored, before it is stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            is_active: true,
            steps: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Serialize into the shape the workflow store persists
    pub fn to_new(&self) -> Result<NewWorkflow, serde_json::Error> {
        Ok(NewWorkflow {
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            steps: serde_json::to_value(&self.steps)?,
        })
    }
}

/// Typed steps decoded from one stored workflow. Malformed steps are
/// dropped and counted; their siblings still evaluate.
#[derive(Debug, Clone)]
pub struct DecodedSteps {
    pub steps: Vec<Step>,
    pub skipped: usize,
}

/// Decode a stored definition's raw step JSON, step by step
pub fn decode_steps(workflow: &WorkflowRecord) -> DecodedSteps {
    let raw_steps = match workflow.steps.as_array() {
        Some(raw) => raw,
        None => {
            warn!(
                workflow_id = workflow.id,
                "workflow steps are not an array, skipping definition"
            );
            return DecodedSteps {
                steps: Vec::new(),
                skipped: 1,
            };
        }
    };

    let mut steps = Vec::with_capacity(raw_steps.len());
    let mut skipped = 0;
    for raw in raw_steps {
        match serde_json::from_value::<Step>(raw.clone()) {
            Ok(step) => steps.push(step),
            Err(e) => {
                warn!(
                    workflow_id = workflow.id,
                    error = %e,
                    "skipping malformed workflow step"
                );
                skipped += 1;
            }
        }
    }
    DecodedSteps { steps, skipped }
}

/// Counts from one evaluation pass
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    pub workflows_checked: usize,
    pub steps_checked: usize,
    pub steps_fired: usize,
    pub jobs_enqueued: usize,
    pub duplicate_jobs: usize,
    pub malformed_steps: usize,
    pub errors: Vec<String>,
}

/// Decides which workflow steps fire for incoming events and clock ticks,
/// then hands their actions to the scheduler.
///
/// The engine holds no definition cache; every pass reads the workflow
/// store, so deactivating a workflow takes effect on the next event or
/// tick.
#[derive(Clone)]
pub struct WorkflowEngine {
    workflows: Arc<dyn WorkflowStore>,
    entities: Arc<dyn EntityStore>,
    scheduler: ActionScheduler,
}

impl WorkflowEngine {
    pub fn new(
        workflows: Arc<dyn WorkflowStore>,
        entities: Arc<dyn EntityStore>,
        scheduler: ActionScheduler,
    ) -> Self {
        Self {
            workflows,
            entities,
            scheduler,
        }
    }

    /// Evaluate a business event against every active workflow.
    ///
    /// Every step with a matching event trigger and passing conditions
    /// fires independently; nothing short-circuits across steps or
    /// workflows.
    pub async fn on_event(&self, event: &DomainEvent) -> Result<PassSummary, EngineError> {
        let records = self.workflows.active_workflows().await?;
        let mut summary = PassSummary {
            workflows_checked: records.len(),
            ..Default::default()
        };

        info!(
            event_type = ?event.event_type,
            entity_id = event.entity_id,
            workflows = records.len(),
            "processing domain event"
        );

        for record in &records {
            let decoded = decode_steps(record);
            summary.malformed_steps += decoded.skipped;

            for step in &decoded.steps {
                summary.steps_checked += 1;
                let Trigger::Event {
                    event_type,
                    conditions,
                } = &step.trigger
                else {
                    continue;
                };
                if *event_type != event.event_type {
                    continue;
                }
                if !evaluate(conditions, &event.entity_snapshot) {
                    continue;
                }

                info!(
                    workflow = %record.name,
                    step_id = %step.id,
                    "workflow step matched event"
                );
                let context = FiringContext {
                    workflow_id: record.id,
                    workflow_step_id: step.id.clone(),
                    entity_id: event.entity_id,
                    entity_snapshot: event.entity_snapshot.clone(),
                    fired_at: event.occurred_at,
                };
                self.fire_step(step, &context, &mut summary).await;
            }
        }

        Ok(summary)
    }

    /// Evaluate a daily clock tick against every active workflow.
    ///
    /// A time-triggered step fires for an entity when the tick lands on
    /// `reference date - offset` (before) or `reference date + offset`
    /// (after), at day granularity. The tick's UTC midnight becomes the
    /// firing moment, so a repeated tick on the same day deduplicates at
    /// the queue.
    pub async fn on_clock_tick(&self, tick: ClockTick) -> Result<PassSummary, EngineError> {
        let records = self.workflows.active_workflows().await?;
        let mut summary = PassSummary {
            workflows_checked: records.len(),
            ..Default::default()
        };

        info!(now = %tick.now, workflows = records.len(), "processing clock tick");

        // One entity scan per reference date, shared by all steps
        let mut candidates_by_reference: HashMap<TimeReference, Vec<TimeCandidate>> =
            HashMap::new();
        let fired_at = tick.now.and_time(NaiveTime::MIN).and_utc();

        for record in &records {
            let decoded = decode_steps(record);
            summary.malformed_steps += decoded.skipped;

            for step in &decoded.steps {
                summary.steps_checked += 1;
                let Trigger::Time {
                    time_reference,
                    conditions,
                    ..
                } = &step.trigger
                else {
                    continue;
                };

                if !candidates_by_reference.contains_key(time_reference) {
                    let fetched = self.entities.time_candidates(*time_reference).await?;
                    candidates_by_reference.insert(*time_reference, fetched);
                }
                let candidates = &candidates_by_reference[time_reference];

                for candidate in candidates {
                    let target = step.trigger.target_date(candidate.reference_date);
                    if target != Some(tick.now) {
                        continue;
                    }
                    if !evaluate(conditions, &candidate.snapshot) {
                        continue;
                    }

                    info!(
                        workflow = %record.name,
                        step_id = %step.id,
                        entity_id = candidate.entity_id,
                        "workflow step due for entity"
                    );
                    let context = FiringContext {
                        workflow_id: record.id,
                        workflow_step_id: step.id.clone(),
                        entity_id: candidate.entity_id,
                        entity_snapshot: candidate.snapshot.clone(),
                        fired_at,
                    };
                    self.fire_step(step, &context, &mut summary).await;
                }
            }
        }

        Ok(summary)
    }

    async fn fire_step(&self, step: &Step, context: &FiringContext, summary: &mut PassSummary) {
        summary.steps_fired += 1;
        match self.scheduler.schedule(&step.actions, context).await {
            Ok(outcome) => {
                summary.jobs_enqueued += outcome.enqueued;
                summary.duplicate_jobs += outcome.duplicates;
            }
            Err(e) => {
                error!(
                    workflow_id = context.workflow_id,
                    step_id = %step.id,
                    error = %e,
                    "failed to schedule step actions"
                );
                summary.errors.push(format!("step {}: {}", step.id, e));
            }
        }
    }
}
