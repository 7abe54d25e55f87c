// Automation Scheduler - Runs the clock tick and job dispatch on a schedule

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler as TokioScheduler, JobSchedulerError};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AutomationConfig;
use crate::workflows::engine::{PassSummary, WorkflowEngine};
use crate::workflows::executor::{DispatchSummary, JobDispatcher};
use crate::workflows::triggers::ClockTick;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    SchedulerError(#[from] JobSchedulerError),
    #[error("Job execution error: {0}")]
    ExecutionError(String),
}

pub type JobResult<T> = Result<T, JobError>;

/// One recorded run of a background job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecutionLog {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub items_processed: i32,
    pub errors: Vec<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum JobStatus {
    Completed,
    Failed,
    PartialFailure,
}

/// Drives the automation engine from the system clock.
///
/// The daily tick evaluates time triggers; the dispatch pass claims due
/// jobs and hands them to the action executor. A slow tick never
/// overlaps with the next one; the later tick is skipped instead.
pub struct AutomationScheduler {
    scheduler: TokioScheduler,
    engine: WorkflowEngine,
    dispatcher: JobDispatcher,
    config: AutomationConfig,
    tick_lock: Arc<Mutex<()>>,
    execution_logs: Arc<RwLock<Vec<JobExecutionLog>>>,
}

impl AutomationScheduler {
    pub async fn new(
        config: AutomationConfig,
        engine: WorkflowEngine,
        dispatcher: JobDispatcher,
    ) -> JobResult<Self> {
        let scheduler = TokioScheduler::new().await?;

        Ok(Self {
            scheduler,
            engine,
            dispatcher,
            config,
            tick_lock: Arc::new(Mutex::new(())),
            execution_logs: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub async fn start(&self) -> JobResult<()> {
        info!("Starting automation scheduler");

        self.schedule_clock_tick().await?;
        self.schedule_dispatch().await?;
        self.scheduler.start().await?;

        info!("Automation scheduler started successfully");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> JobResult<()> {
        info!("Shutting down automation scheduler");
        self.scheduler.shutdown().await?;
        Ok(())
    }

    async fn schedule_clock_tick(&self) -> JobResult<()> {
        let cron_expr = self.config.tick_cron.clone();
        let history_size = self.config.job_history_size;

        let engine = self.engine.clone();
        let tick_lock = self.tick_lock.clone();
        let logs = self.execution_logs.clone();

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let engine = engine.clone();
            let tick_lock = tick_lock.clone();
            let logs = logs.clone();

            Box::pin(async move {
                let _guard = match tick_lock.try_lock() {
                    Ok(guard) => guard,
                    Err(_) => {
                        warn!("Previous clock tick still running, skipping this one");
                        return;
                    }
                };

                let log_id = Uuid::new_v4();
                let started_at = Utc::now();

                info!("Running workflow clock tick");

                let tick = ClockTick {
                    now: started_at.date_naive(),
                };
                match engine.on_clock_tick(tick).await {
                    Ok(summary) => {
                        let completed_at = Utc::now();
                        let duration = (completed_at - started_at).num_milliseconds();

                        let log = JobExecutionLog {
                            id: log_id,
                            job_name: "Workflow Clock Tick".to_string(),
                            started_at,
                            completed_at: Some(completed_at),
                            status: if summary.errors.is_empty() {
                                JobStatus::Completed
                            } else {
                                JobStatus::PartialFailure
                            },
                            items_processed: summary.steps_checked as i32,
                            errors: summary.errors.clone(),
                            duration_ms: Some(duration),
                        };
                        push_log(&logs, history_size, log).await;

                        info!(
                            "Clock tick completed: {} steps checked, {} fired, {} jobs enqueued",
                            summary.steps_checked, summary.steps_fired, summary.jobs_enqueued
                        );
                    }
                    Err(e) => {
                        error!("Clock tick failed: {}", e);

                        let log = JobExecutionLog {
                            id: log_id,
                            job_name: "Workflow Clock Tick".to_string(),
                            started_at,
                            completed_at: Some(Utc::now()),
                            status: JobStatus::Failed,
                            items_processed: 0,
                            errors: vec![e.to_string()],
                            duration_ms: None,
                        };
                        push_log(&logs, history_size, log).await;
                    }
                }
            })
        })?;

        self.scheduler.add(job).await?;
        info!("Scheduled workflow clock tick with cron '{}'", self.config.tick_cron);

        Ok(())
    }

    async fn schedule_dispatch(&self) -> JobResult<()> {
        let interval = self.config.dispatch_interval_secs;
        let dispatcher = self.dispatcher.clone();

        let job = Job::new_repeated_async(Duration::from_secs(interval), move |_uuid, _lock| {
            let dispatcher = dispatcher.clone();

            Box::pin(async move {
                match dispatcher.dispatch_due(Utc::now()).await {
                    Ok(summary) if summary.claimed > 0 => {
                        info!(
                            "Dispatched {} due jobs, {} completed, {} failed",
                            summary.claimed, summary.completed, summary.failed
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Job dispatch pass failed: {}", e);
                    }
                }
            })
        })?;

        self.scheduler.add(job).await?;
        info!("Scheduled job dispatch every {} seconds", interval);

        Ok(())
    }

    /// Evaluate time triggers for the given day immediately
    pub async fn run_tick_now(&self, now: NaiveDate) -> JobResult<PassSummary> {
        self.engine
            .on_clock_tick(ClockTick { now })
            .await
            .map_err(|e| JobError::ExecutionError(e.to_string()))
    }

    /// Claim and execute everything due right now
    pub async fn run_dispatch_now(&self) -> JobResult<DispatchSummary> {
        self.dispatcher
            .dispatch_due(Utc::now())
            .await
            .map_err(|e| JobError::ExecutionError(e.to_string()))
    }

    pub async fn get_execution_logs(&self) -> Vec<JobExecutionLog> {
        self.execution_logs.read().await.clone()
    }
}

async fn push_log(
    logs: &Arc<RwLock<Vec<JobExecutionLog>>>,
    history_size: usize,
    log: JobExecutionLog,
) {
    let mut logs = logs.write().await;
    logs.push(log);
    if logs.len() > history_size {
        logs.remove(0);
    }
}
