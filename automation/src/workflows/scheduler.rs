// Action Scheduler - Deferred execution jobs for fired workflow steps

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::actions::{Action, ActionType};
use super::triggers::EntitySnapshot;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("job queue unavailable: {0}")]
    Unavailable(String),
    #[error("job {0} not found")]
    JobNotFound(Uuid),
}

/// Identity of one action scheduled for one firing of one step.
///
/// Re-scheduling the same firing reuses this key and becomes a no-op, which
/// is what makes tick redelivery and event replays safe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct JobKey {
    pub workflow_step_id: String,
    pub action_id: String,
    pub entity_id: i64,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A deferred action execution owned by the job queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: Uuid,
    pub key: JobKey,
    pub workflow_id: i64,
    pub action_type: ActionType,
    pub config: HashMap<String, String>,
    pub entity_snapshot: EntitySnapshot,
    pub execute_at: DateTime<Utc>,
    pub status: JobStatus,
    /// Monotonic enqueue order; ties on execute_at dispatch in this order,
    /// so actions run in authoring order
    pub sequence: u64,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

/// Fields for enqueueing a job
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub key: JobKey,
    pub workflow_id: i64,
    pub action_type: ActionType,
    pub config: HashMap<String, String>,
    pub entity_snapshot: EntitySnapshot,
    pub execute_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued(Uuid),
    /// The key was already present; the earlier job stands
    Duplicate,
}

/// Deferred-job persistence as the scheduler and dispatcher see it
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Atomic check-and-insert on the job key
    async fn enqueue(&self, request: JobRequest) -> Result<EnqueueOutcome, QueueError>;

    /// Claim every pending job due at `now`, marking it running so a
    /// concurrent dispatch cannot pick it up again. Returned ordered by
    /// execute_at, then enqueue sequence.
    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>, QueueError>;

    async fn mark_completed(&self, id: Uuid) -> Result<(), QueueError>;

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), QueueError>;

    /// Claim a failed job for one more attempt. Returns None when the job
    /// exists but is not in the failed state.
    async fn reclaim_failed(&self, id: Uuid) -> Result<Option<ScheduledJob>, QueueError>;

    /// Cancel pending jobs for a workflow step, for callers that tear down
    /// scheduled work when a step is deleted. Returns how many were
    /// cancelled.
    async fn cancel_step(&self, workflow_step_id: &str) -> Result<usize, QueueError>;
}

#[derive(Debug, Default)]
struct QueueInner {
    jobs: Vec<ScheduledJob>,
    keys: HashSet<JobKey>,
    next_sequence: u64,
}

/// Job queue held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobQueue {
    inner: Arc<RwLock<QueueInner>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every job in the queue, in enqueue order, for inspection
    pub async fn jobs(&self) -> Vec<ScheduledJob> {
        let inner = self.inner.read().await;
        inner.jobs.clone()
    }

    pub async fn pending_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner
            .jobs
            .iter()
            .filter(|j| j.status == JobStatus::Pending)
            .count()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, request: JobRequest) -> Result<EnqueueOutcome, QueueError> {
        let mut inner = self.inner.write().await;
        if !inner.keys.insert(request.key.clone()) {
            return Ok(EnqueueOutcome::Duplicate);
        }

        inner.next_sequence += 1;
        let job = ScheduledJob {
            id: Uuid::new_v4(),
            key: request.key,
            workflow_id: request.workflow_id,
            action_type: request.action_type,
            config: request.config,
            entity_snapshot: request.entity_snapshot,
            execute_at: request.execute_at,
            status: JobStatus::Pending,
            sequence: inner.next_sequence,
            attempts: 0,
            last_error: None,
            enqueued_at: Utc::now(),
        };
        let id = job.id;
        inner.jobs.push(job);
        Ok(EnqueueOutcome::Enqueued(id))
    }

    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>, QueueError> {
        let mut inner = self.inner.write().await;
        let mut due: Vec<&mut ScheduledJob> = inner
            .jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Pending && j.execute_at <= now)
            .collect();
        due.sort_by(|a, b| {
            a.execute_at
                .cmp(&b.execute_at)
                .then(a.sequence.cmp(&b.sequence))
        });

        let mut claimed = Vec::with_capacity(due.len());
        for job in due {
            job.status = JobStatus::Running;
            job.attempts += 1;
            claimed.push(job.clone());
        }
        Ok(claimed)
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), QueueError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(QueueError::JobNotFound(id))?;
        job.status = JobStatus::Completed;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), QueueError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(QueueError::JobNotFound(id))?;
        job.status = JobStatus::Failed;
        job.last_error = Some(error.to_string());
        Ok(())
    }

    async fn reclaim_failed(&self, id: Uuid) -> Result<Option<ScheduledJob>, QueueError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(QueueError::JobNotFound(id))?;
        if job.status != JobStatus::Failed {
            return Ok(None);
        }
        job.status = JobStatus::Running;
        job.attempts += 1;
        Ok(Some(job.clone()))
    }

    async fn cancel_step(&self, workflow_step_id: &str) -> Result<usize, QueueError> {
        let mut inner = self.inner.write().await;
        let mut cancelled = 0;
        for job in inner.jobs.iter_mut() {
            if job.key.workflow_step_id == workflow_step_id && job.status == JobStatus::Pending {
                job.status = JobStatus::Cancelled;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }
}

/// Context carried from a step firing into its scheduled jobs
#[derive(Debug, Clone)]
pub struct FiringContext {
    pub workflow_id: i64,
    pub workflow_step_id: String,
    pub entity_id: i64,
    pub entity_snapshot: EntitySnapshot,
    pub fired_at: DateTime<Utc>,
}

/// Counts from scheduling one step's actions
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleOutcome {
    pub enqueued: usize,
    pub duplicates: usize,
}

/// Turns a fired step into deferred jobs, one per action
#[derive(Clone)]
pub struct ActionScheduler {
    queue: Arc<dyn JobQueue>,
}

impl ActionScheduler {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    /// Enqueue every action of a fired step in authoring order. Each
    /// action's delay counts from the firing moment, not from the previous
    /// action.
    pub async fn schedule(
        &self,
        actions: &[Action],
        context: &FiringContext,
    ) -> Result<ScheduleOutcome, QueueError> {
        let mut outcome = ScheduleOutcome::default();

        for action in actions {
            let execute_at = context.fired_at + chrono::Duration::days(action.delay_days as i64);
            let request = JobRequest {
                key: JobKey {
                    workflow_step_id: context.workflow_step_id.clone(),
                    action_id: action.id.clone(),
                    entity_id: context.entity_id,
                    fired_at: context.fired_at,
                },
                workflow_id: context.workflow_id,
                action_type: action.action_type,
                config: action.config.clone(),
                entity_snapshot: context.entity_snapshot.clone(),
                execute_at,
            };

            match self.queue.enqueue(request).await? {
                EnqueueOutcome::Enqueued(job_id) => {
                    debug!(
                        job_id = %job_id,
                        action_id = %action.id,
                        execute_at = %execute_at,
                        "enqueued workflow action"
                    );
                    outcome.enqueued += 1;
                }
                EnqueueOutcome::Duplicate => {
                    debug!(
                        action_id = %action.id,
                        step_id = %context.workflow_step_id,
                        "duplicate firing suppressed"
                    );
                    outcome.duplicates += 1;
                }
            }
        }
        Ok(outcome)
    }
}
