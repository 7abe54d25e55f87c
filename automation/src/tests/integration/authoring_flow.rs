// Authoring flow: validating, storing, and evolving workflow definitions

use serde_json::json;

use crate::store::{WorkflowStore, WorkflowUpdate};
use crate::tests::TestContext;
use crate::validation::validate_workflow;
use crate::workflows::templates::starter_workflows;
use crate::workflows::{Action, DomainEvent, EventType, JobQueue, Step, Trigger, Workflow};

#[tokio::test]
async fn test_starter_workflows_install_cleanly() {
    let ctx = TestContext::new();
    for workflow in starter_workflows() {
        validate_workflow(&workflow).unwrap();
        ctx.workflows
            .create(workflow.to_new().unwrap())
            .await
            .unwrap();
    }

    let listed = ctx.workflows.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|w| w.is_active));
}

#[tokio::test]
async fn test_invalid_definition_is_rejected_before_storage() {
    let ctx = TestContext::new();
    let broken = Workflow::new("No actions")
        .with_step(Step::new("s1", Trigger::on_event(EventType::NewLead)));

    let error = validate_workflow(&broken).unwrap_err();
    assert!(!error.messages("steps[0].actions").is_empty());
    assert!(ctx.workflows.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_edited_steps_take_effect_on_the_next_event() {
    let ctx = TestContext::new();
    let workflow = Workflow::new("Lead intake").with_step(
        Step::new("s1", Trigger::on_event(EventType::NewLead))
            .with_action(Action::send_email("a1", "welcome_email")),
    );
    let record = ctx
        .workflows
        .create(workflow.to_new().unwrap())
        .await
        .unwrap();

    let event = DomainEvent::new(EventType::NewLead, 7, json!({}));
    ctx.engine.on_event(&event).await.unwrap();
    assert_eq!(ctx.queue.jobs().await.len(), 1);

    // The author adds a follow-up task to the same step
    let edited = Workflow::new("Lead intake").with_step(
        Step::new("s1", Trigger::on_event(EventType::NewLead))
            .with_action(Action::send_email("a1", "welcome_email"))
            .with_action(Action::create_task(
                "a2",
                "Call the lead",
                "studio_owner",
                1,
            )),
    );
    ctx.workflows
        .update(
            record.id,
            WorkflowUpdate {
                steps: Some(serde_json::to_value(&edited.steps).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let event = DomainEvent::new(EventType::NewLead, 8, json!({}));
    let summary = ctx.engine.on_event(&event).await.unwrap();
    assert_eq!(summary.jobs_enqueued, 2);
}

#[tokio::test]
async fn test_deleting_a_workflow_withdraws_it_and_its_pending_jobs() {
    let ctx = TestContext::new();
    let workflow = Workflow::new("Lead intake").with_step(
        Step::new("s1", Trigger::on_event(EventType::NewLead))
            .with_action(Action::send_email("a1", "welcome_email").with_delay(2)),
    );
    let record = ctx
        .workflows
        .create(workflow.to_new().unwrap())
        .await
        .unwrap();

    let event = DomainEvent::new(EventType::NewLead, 7, json!({}));
    ctx.engine.on_event(&event).await.unwrap();
    assert_eq!(ctx.queue.pending_count().await, 1);

    assert!(ctx.workflows.delete(record.id).await.unwrap());
    ctx.queue.cancel_step("s1").await.unwrap();

    assert_eq!(ctx.queue.pending_count().await, 0);
    let event = DomainEvent::new(EventType::NewLead, 8, json!({}));
    let summary = ctx.engine.on_event(&event).await.unwrap();
    assert_eq!(summary.workflows_checked, 0);
}
