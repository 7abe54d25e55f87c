// Workflow Templates - Ready-made workflows for common studio pipelines

use super::actions::Action;
use super::conditions::{Condition, ConditionField};
use super::engine::{Step, Workflow};
use super::triggers::{EventType, TimeReference, Trigger};

/// Full client journey for wedding bookings, from first inquiry through
/// gallery delivery.
pub fn wedding_client_workflow() -> Workflow {
    let wedding = || Condition::equals(ConditionField::ShootType, "Wedding");

    Workflow::new("Wedding Client Journey")
        .with_description("Automates the wedding pipeline from inquiry to thank-you")
        .with_step(
            Step::new(
                "lead-intake",
                Trigger::on_event(EventType::NewLead).with_condition(wedding()),
            )
            .with_action(Action::send_email("welcome-email", "wedding_welcome"))
            .with_action(Action::create_task(
                "call-lead",
                "Call the new lead",
                "studio_owner",
                1,
            )),
        )
        .with_step(
            Step::new(
                "booking",
                Trigger::on_event(EventType::ProposalAccepted).with_condition(wedding()),
            )
            .with_action(Action::send_contract("contract", "wedding_contract"))
            .with_action(Action::send_invoice("deposit-invoice", "deposit", "50%")),
        )
        .with_step(
            Step::new(
                "prep-questionnaire",
                Trigger::days_before(TimeReference::ShootDate, 14).with_condition(wedding()),
            )
            .with_action(Action::send_questionnaire("questionnaire", "wedding_details")),
        )
        .with_step(
            Step::new(
                "final-reminder",
                Trigger::days_before(TimeReference::ShootDate, 3).with_condition(wedding()),
            )
            .with_action(Action::send_email("reminder", "final_details")),
        )
        .with_step(
            Step::new(
                "thank-you",
                Trigger::on_event(EventType::GalleryDelivered).with_condition(wedding()),
            )
            .with_action(Action::send_email("thanks", "wedding_thank_you").with_delay(3)),
        )
}

/// Lighter pipeline for portrait sessions
pub fn portrait_session_workflow() -> Workflow {
    let portrait = || Condition::equals(ConditionField::ShootType, "Portrait");

    Workflow::new("Portrait Session Pipeline")
        .with_description("Covers prep and follow-up for portrait sessions")
        .with_step(
            Step::new(
                "lead-intake",
                Trigger::on_event(EventType::NewLead).with_condition(portrait()),
            )
            .with_action(Action::send_email("welcome-email", "portrait_welcome")),
        )
        .with_step(
            Step::new(
                "session-prep",
                Trigger::days_before(TimeReference::ShootDate, 3).with_condition(portrait()),
            )
            .with_action(Action::send_email("prep", "session_prep"))
            .with_action(Action::create_task(
                "equipment",
                "Prep equipment and props",
                "photographer",
                1,
            )),
        )
        .with_step(
            Step::new(
                "print-sale",
                Trigger::days_after(TimeReference::GalleryDeliveryDate, 30)
                    .with_condition(portrait()),
            )
            .with_action(Action::email_campaign("print-sale-campaign", "print_sale")),
        )
}

/// Every template shipped with the engine
pub fn starter_workflows() -> Vec<Workflow> {
    vec![wedding_client_workflow(), portrait_session_workflow()]
}
