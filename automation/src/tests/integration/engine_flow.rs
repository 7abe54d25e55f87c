// End-to-end runs of the automation engine against in-memory stores

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::store::WorkflowStore;
use crate::tests::{fixtures, TestContext};
use crate::workflows::templates::{portrait_session_workflow, wedding_client_workflow};
use crate::workflows::{
    Action, ActionType, ClockTick, Condition, ConditionField, DomainEvent, EventType, JobQueue,
    Step, TimeReference, Trigger, Workflow,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_wedding_inquiry_fires_welcome_and_call_task() {
    let ctx = TestContext::new();
    ctx.workflows
        .create(wedding_client_workflow().to_new().unwrap())
        .await
        .unwrap();

    let inquiry = DomainEvent::new(
        EventType::NewLead,
        7,
        json!({ "shoot_type": "Wedding", "lead_source": "instagram" }),
    );
    let summary = ctx.engine.on_event(&inquiry).await.unwrap();

    assert_eq!(summary.steps_fired, 1);
    assert_eq!(summary.jobs_enqueued, 2);

    let jobs = ctx.queue.jobs().await;
    assert_eq!(jobs[0].action_type, ActionType::SendEmail);
    assert_eq!(jobs[1].action_type, ActionType::CreateTask);

    // A non-wedding inquiry leaves the queue untouched
    let other = DomainEvent::new(EventType::NewLead, 8, json!({ "shoot_type": "Family" }));
    let summary = ctx.engine.on_event(&other).await.unwrap();
    assert_eq!(summary.steps_fired, 0);
    assert_eq!(ctx.queue.jobs().await.len(), 2);
}

#[tokio::test]
async fn test_booking_actions_execute_in_authoring_order() {
    let ctx = TestContext::new();
    ctx.workflows
        .create(wedding_client_workflow().to_new().unwrap())
        .await
        .unwrap();

    let accepted = DomainEvent::new(
        EventType::ProposalAccepted,
        12,
        json!({ "shoot_type": "Wedding", "order_amount": "4500.00" }),
    )
    .with_occurred_at(Utc.with_ymd_and_hms(2025, 5, 10, 15, 0, 0).unwrap());
    ctx.engine.on_event(&accepted).await.unwrap();

    let summary = ctx
        .dispatcher
        .dispatch_due(Utc.with_ymd_and_hms(2025, 5, 10, 15, 0, 0).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.claimed, 2);
    assert_eq!(summary.completed, 2);

    // Contract goes out before the deposit invoice, as authored
    let requests = ctx.executor.requests().await;
    assert_eq!(requests[0].action_type, ActionType::SendContract);
    assert_eq!(
        requests[0].config.get("contractTemplate").map(String::as_str),
        Some("wedding_contract")
    );
    assert_eq!(requests[1].action_type, ActionType::SendInvoice);
    assert_eq!(
        requests[1].config.get("invoiceType").map(String::as_str),
        Some("deposit")
    );
}

#[tokio::test]
async fn test_prep_steps_fire_on_their_target_days() {
    let ctx = TestContext::new();
    ctx.workflows
        .create(wedding_client_workflow().to_new().unwrap())
        .await
        .unwrap();
    ctx.entities.add_client(fixtures::client(7)).await;
    ctx.entities
        .add_shoot(fixtures::shoot(31, 7, "Wedding", day(2025, 6, 15)))
        .await;

    // 14 days out: the questionnaire step is due, nothing else
    let summary = ctx
        .engine
        .on_clock_tick(ClockTick { now: day(2025, 6, 1) })
        .await
        .unwrap();
    assert_eq!(summary.steps_fired, 1);

    // A rerun of the same day changes nothing
    let summary = ctx
        .engine
        .on_clock_tick(ClockTick { now: day(2025, 6, 1) })
        .await
        .unwrap();
    assert_eq!(summary.jobs_enqueued, 0);
    assert_eq!(summary.duplicate_jobs, 1);

    // 3 days out: the reminder step joins the queue
    let summary = ctx
        .engine
        .on_clock_tick(ClockTick { now: day(2025, 6, 12) })
        .await
        .unwrap();
    assert_eq!(summary.steps_fired, 1);

    let jobs = ctx.queue.jobs().await;
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].action_type, ActionType::SendQuestionnaire);
    assert_eq!(jobs[1].action_type, ActionType::SendEmail);
}

#[tokio::test]
async fn test_delayed_thank_you_waits_three_days() {
    let ctx = TestContext::new();
    ctx.workflows
        .create(wedding_client_workflow().to_new().unwrap())
        .await
        .unwrap();

    let delivered = DomainEvent::new(
        EventType::GalleryDelivered,
        55,
        json!({ "shoot_type": "Wedding", "gallery_status": "delivered" }),
    )
    .with_occurred_at(Utc.with_ymd_and_hms(2025, 6, 20, 10, 0, 0).unwrap());
    ctx.engine.on_event(&delivered).await.unwrap();

    // Too early: the job is enqueued but not yet due
    let summary = ctx
        .dispatcher
        .dispatch_due(Utc.with_ymd_and_hms(2025, 6, 21, 10, 0, 0).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.claimed, 0);

    let summary = ctx
        .dispatcher
        .dispatch_due(Utc.with_ymd_and_hms(2025, 6, 23, 10, 0, 0).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.claimed, 1);
    assert_eq!(summary.completed, 1);

    let requests = ctx.executor.requests().await;
    assert_eq!(
        requests[0].config.get("templateId").map(String::as_str),
        Some("wedding_thank_you")
    );
}

#[tokio::test]
async fn test_portrait_print_sale_follows_gallery_delivery() {
    let ctx = TestContext::new();
    ctx.workflows
        .create(portrait_session_workflow().to_new().unwrap())
        .await
        .unwrap();
    ctx.entities.add_client(fixtures::client(7)).await;
    ctx.entities
        .add_shoot(fixtures::shoot(31, 7, "Portrait", day(2025, 6, 15)))
        .await;
    let mut gallery = fixtures::delivered_gallery(4, 7, day(2025, 7, 1));
    gallery.shoot_id = Some(31);
    ctx.entities.add_gallery(gallery).await;

    // 30 days after delivery the campaign goes out, and only then
    let summary = ctx
        .engine
        .on_clock_tick(ClockTick { now: day(2025, 7, 30) })
        .await
        .unwrap();
    assert_eq!(summary.steps_fired, 0);

    let summary = ctx
        .engine
        .on_clock_tick(ClockTick { now: day(2025, 7, 31) })
        .await
        .unwrap();
    assert_eq!(summary.steps_fired, 1);

    let jobs = ctx.queue.jobs().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].action_type, ActionType::EmailCampaign);
    assert_eq!(jobs[0].key.entity_id, 4);
}

#[tokio::test]
async fn test_payment_reminder_three_days_before_due() {
    let ctx = TestContext::new();
    let reminders = Workflow::new("Payment reminders").with_step(
        Step::new(
            "payment-reminder",
            Trigger::days_before(TimeReference::InvoiceDueDate, 3)
                .with_condition(Condition::equals(ConditionField::PaymentStatus, "sent")),
        )
        .with_action(Action::send_email("reminder", "payment_reminder")),
    );
    ctx.workflows
        .create(reminders.to_new().unwrap())
        .await
        .unwrap();
    ctx.entities.add_client(fixtures::client(7)).await;
    ctx.entities
        .add_invoice(fixtures::invoice(
            12,
            7,
            Decimal::new(450000, 2),
            day(2025, 7, 1),
        ))
        .await;

    let summary = ctx
        .engine
        .on_clock_tick(ClockTick { now: day(2025, 6, 28) })
        .await
        .unwrap();
    assert_eq!(summary.steps_fired, 1);

    let jobs = ctx.queue.jobs().await;
    assert_eq!(jobs[0].key.entity_id, 12);
    assert_eq!(jobs[0].action_type, ActionType::SendEmail);
}

#[tokio::test]
async fn test_cancelling_a_step_clears_its_pending_jobs() {
    let ctx = TestContext::new();
    ctx.workflows
        .create(wedding_client_workflow().to_new().unwrap())
        .await
        .unwrap();
    ctx.entities.add_client(fixtures::client(7)).await;
    ctx.entities
        .add_shoot(fixtures::shoot(31, 7, "Wedding", day(2025, 6, 15)))
        .await;

    ctx.engine
        .on_clock_tick(ClockTick { now: day(2025, 6, 1) })
        .await
        .unwrap();
    assert_eq!(ctx.queue.pending_count().await, 1);

    // The shoot got rescheduled; the questionnaire send is withdrawn
    let cancelled = ctx.queue.cancel_step("prep-questionnaire").await.unwrap();
    assert_eq!(cancelled, 1);
    assert_eq!(ctx.queue.pending_count().await, 0);

    let summary = ctx
        .dispatcher
        .dispatch_due(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap())
        .await
        .unwrap();
    assert_eq!(summary.claimed, 0);
    assert!(ctx.executor.requests().await.is_empty());
}

#[tokio::test]
async fn test_deactivated_workflow_goes_quiet_immediately() {
    let ctx = TestContext::new();
    let record = ctx
        .workflows
        .create(wedding_client_workflow().to_new().unwrap())
        .await
        .unwrap();

    let inquiry = DomainEvent::new(EventType::NewLead, 7, json!({ "shoot_type": "Wedding" }));
    ctx.engine.on_event(&inquiry).await.unwrap();
    assert_eq!(ctx.queue.jobs().await.len(), 2);

    ctx.workflows.set_active(record.id, false).await.unwrap();

    let another = DomainEvent::new(EventType::NewLead, 8, json!({ "shoot_type": "Wedding" }));
    let summary = ctx.engine.on_event(&another).await.unwrap();
    assert_eq!(summary.workflows_checked, 0);
    assert_eq!(ctx.queue.jobs().await.len(), 2);
}
