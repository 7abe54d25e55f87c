pub mod integration;

// Common test utilities and shared test setup
use std::sync::{Arc, Once};

use crate::store::{InMemoryEntityStore, InMemoryWorkflowStore};
use crate::workflows::executor::{JobDispatcher, RecordingExecutor};
use crate::workflows::scheduler::{ActionScheduler, InMemoryJobQueue};
use crate::workflows::WorkflowEngine;

static INIT: Once = Once::new();

/// Log output from engine passes shows up with --nocapture
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Everything an end-to-end engine test needs, wired to in-memory stores
pub struct TestContext {
    pub workflows: Arc<InMemoryWorkflowStore>,
    pub entities: Arc<InMemoryEntityStore>,
    pub queue: Arc<InMemoryJobQueue>,
    pub executor: Arc<RecordingExecutor>,
    pub engine: WorkflowEngine,
    pub dispatcher: JobDispatcher,
}

impl TestContext {
    pub fn new() -> Self {
        init_tracing();

        let workflows = Arc::new(InMemoryWorkflowStore::new());
        let entities = Arc::new(InMemoryEntityStore::new());
        let queue = Arc::new(InMemoryJobQueue::new());
        let executor = Arc::new(RecordingExecutor::new());

        let engine = WorkflowEngine::new(
            workflows.clone(),
            entities.clone(),
            ActionScheduler::new(queue.clone()),
        );
        let dispatcher = JobDispatcher::new(queue.clone(), executor.clone());

        Self {
            workflows,
            entities,
            queue,
            executor,
            engine,
            dispatcher,
        }
    }
}
