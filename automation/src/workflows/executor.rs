// Action Dispatch - Hands due jobs to the executors that do the real work

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use super::scheduler::{JobQueue, JobStatus, QueueError, ScheduledJob};
use super::triggers::EntitySnapshot;
use crate::workflows::actions::ActionType;

/// Execution request handed to an action executor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecutionRequest {
    pub action_type: ActionType,
    pub config: HashMap<String, String>,
    pub entity_id: i64,
    pub entity_snapshot: EntitySnapshot,
    pub execute_at: DateTime<Utc>,
}

/// The outbound boundary: email senders, task creators, and the rest of the
/// application implement this.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &ActionExecutionRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Counts from one dispatch pass
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Drains due jobs from the queue and invokes the executor, isolating
/// failures per job. No automatic retries; `retry` re-runs a single failed
/// job when an outside policy decides to.
#[derive(Clone)]
pub struct JobDispatcher {
    queue: Arc<dyn JobQueue>,
    executor: Arc<dyn ActionExecutor>,
}

impl JobDispatcher {
    pub fn new(queue: Arc<dyn JobQueue>, executor: Arc<dyn ActionExecutor>) -> Self {
        Self { queue, executor }
    }

    /// Execute every job due at `now`. A failed job is marked failed and
    /// left in the queue; its siblings still run.
    pub async fn dispatch_due(&self, now: DateTime<Utc>) -> Result<DispatchSummary, QueueError> {
        let due = self.queue.claim_due(now).await?;
        let mut summary = DispatchSummary {
            claimed: due.len(),
            ..Default::default()
        };

        for job in due {
            match self.execute_job(&job).await {
                Ok(()) => {
                    self.queue.mark_completed(job.id).await?;
                    summary.completed += 1;
                }
                Err(e) => {
                    error!(
                        job_id = %job.id,
                        action_type = ?job.action_type,
                        entity_id = job.key.entity_id,
                        error = %e,
                        "workflow action failed"
                    );
                    self.queue.mark_failed(job.id, &e.to_string()).await?;
                    summary.failed += 1;
                    summary.errors.push(format!(
                        "{:?} for entity {}: {}",
                        job.action_type, job.key.entity_id, e
                    ));
                }
            }
        }
        Ok(summary)
    }

    /// Re-run one failed job. Returns None when the job is not in the
    /// failed state.
    pub async fn retry(&self, job_id: Uuid) -> Result<Option<JobStatus>, QueueError> {
        let Some(job) = self.queue.reclaim_failed(job_id).await? else {
            return Ok(None);
        };

        match self.execute_job(&job).await {
            Ok(()) => {
                self.queue.mark_completed(job.id).await?;
                Ok(Some(JobStatus::Completed))
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "workflow action failed on retry");
                self.queue.mark_failed(job.id, &e.to_string()).await?;
                Ok(Some(JobStatus::Failed))
            }
        }
    }

    async fn execute_job(
        &self,
        job: &ScheduledJob,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let request = build_request(job);
        info!(
            job_id = %job.id,
            action_type = ?request.action_type,
            entity_id = request.entity_id,
            "dispatching workflow action"
        );
        self.executor.execute(&request).await
    }
}

/// Build the outbound request, rendering template variables in the config
/// against the entity snapshot captured at firing time.
fn build_request(job: &ScheduledJob) -> ActionExecutionRequest {
    let config = job
        .config
        .iter()
        .map(|(k, v)| (k.clone(), replace_template_vars(v, &job.entity_snapshot)))
        .collect();

    ActionExecutionRequest {
        action_type: job.action_type,
        config,
        entity_id: job.key.entity_id,
        entity_snapshot: job.entity_snapshot.clone(),
        execute_at: job.execute_at,
    }
}

/// Replace {{field}} patterns with values from the snapshot. Unresolvable
/// placeholders are left in place.
fn replace_template_vars(template: &str, snapshot: &EntitySnapshot) -> String {
    let mut result = template.to_string();

    let re = regex::Regex::new(r"\{\{([^}]+)\}\}").unwrap();
    for cap in re.captures_iter(template) {
        let var_path = cap[1].trim();
        if let Some(val) = get_nested_value(snapshot, var_path) {
            let replacement = match val {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            result = result.replace(&cap[0], &replacement);
        }
    }

    result
}

fn get_nested_value(json: &serde_json::Value, path: &str) -> Option<serde_json::Value> {
    let mut current = json;
    for part in path.split('.') {
        match current.get(part) {
            Some(v) => current = v,
            None => return None,
        }
    }
    if current.is_null() {
        return None;
    }
    Some(current.clone())
}

/// Executor that records every request it receives. Backs tests and dry
/// runs of workflow definitions.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    requests: Arc<RwLock<Vec<ActionExecutionRequest>>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn requests(&self) -> Vec<ActionExecutionRequest> {
        let requests = self.requests.read().await;
        requests.clone()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(
        &self,
        request: &ActionExecutionRequest,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut requests = self.requests.write().await;
        requests.push(request.clone());
        Ok(())
    }
}
