use std::env;

/// Runtime settings for the background automation jobs
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    /// Cron expression for the daily clock tick
    pub tick_cron: String,
    /// How often due jobs are claimed and dispatched (seconds)
    pub dispatch_interval_secs: u64,
    /// How many job execution log entries to keep in memory
    pub job_history_size: usize,
}

impl AutomationConfig {
    pub fn from_env() -> Self {
        Self {
            tick_cron: env::var("SHUTTERFLOW_TICK_CRON")
                .unwrap_or_else(|_| "0 0 6 * * *".to_string()),
            dispatch_interval_secs: env::var("SHUTTERFLOW_DISPATCH_INTERVAL")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            job_history_size: env::var("SHUTTERFLOW_JOB_HISTORY")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            tick_cron: "0 0 6 * * *".to_string(),
            dispatch_interval_secs: 60,
            job_history_size: 100,
        }
    }
}
