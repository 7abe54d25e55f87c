// Background Jobs Service
//
// This module runs the automation engine on a schedule: a daily clock
// tick for date-offset triggers, and a frequent dispatch pass that
// executes due jobs. Jobs are scheduled using tokio-cron-scheduler.

pub mod scheduler;

pub use scheduler::{AutomationScheduler, JobError, JobExecutionLog, JobResult, JobStatus};
