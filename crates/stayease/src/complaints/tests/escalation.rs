use super::common::*;
use crate::complaints::domain::{actions, ChatSpeaker, ComplaintStatus};
use crate::complaints::service::ComplaintError;

#[test]
fn escalation_flags_the_complaint_without_changing_status() {
    let service = service();
    let complaint = in_progress(&service);

    let escalated = service
        .escalate(&staff(), &complaint.id, "Needs plumbing contractor approval")
        .expect("escalates");

    assert!(escalated.escalated);
    assert_eq!(escalated.status, ComplaintStatus::InProgress);
    assert_eq!(
        escalated.escalation_note.as_deref(),
        Some("Needs plumbing contractor approval")
    );
    assert!(escalated.escalated_at.is_some());

    let logs = service.timeline(&complaint.id).expect("timeline");
    assert!(logs.iter().any(|log| log.action == actions::ESCALATED_TO_ADMIN));
}

#[test]
fn escalation_requires_a_note_and_the_assignment() {
    let service = service();
    let complaint = in_progress(&service);

    match service.escalate(&staff(), &complaint.id, "  ") {
        Err(ComplaintError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }

    match service.escalate(&second_staff(), &complaint.id, "not mine") {
        Err(ComplaintError::Permission(_)) => {}
        other => panic!("expected permission error, got {other:?}"),
    }
}

#[test]
fn staff_reply_requires_an_escalated_complaint() {
    let service = service();
    let complaint = in_progress(&service);

    match service.staff_escalation_reply(&staff(), &complaint.id, "any update?") {
        Err(ComplaintError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn thread_reconstructs_the_conversation_in_order() {
    let service = service();
    let complaint = in_progress(&service);

    service
        .escalate(&staff(), &complaint.id, "Vendor quote needed")
        .expect("escalates");
    service
        .admin_reply(&admin(), &complaint.id, "Approved, proceed")
        .expect("admin replies");
    service
        .staff_escalation_reply(&staff(), &complaint.id, "Scheduling for Monday")
        .expect("staff follows up");

    let thread = service.escalation_thread(&complaint.id).expect("thread");
    assert_eq!(thread.len(), 3);

    assert_eq!(thread[0].speaker, ChatSpeaker::Staff);
    assert_eq!(thread[0].sender, "Ravi Kumar");
    assert_eq!(thread[0].message.as_deref(), Some("Vendor quote needed"));

    assert_eq!(thread[1].speaker, ChatSpeaker::Admin);
    assert_eq!(thread[1].sender, "Admin");
    assert_eq!(thread[1].message.as_deref(), Some("Approved, proceed"));

    assert_eq!(thread[2].speaker, ChatSpeaker::Staff);
    assert_eq!(thread[2].message.as_deref(), Some("Scheduling for Monday"));
}

#[test]
fn thread_excludes_lifecycle_entries() {
    let service = service();
    let complaint = in_progress(&service);
    service
        .escalate(&staff(), &complaint.id, "Stuck")
        .expect("escalates");

    // Filing and the in-progress transition are in the timeline but not the chat.
    let timeline = service.timeline(&complaint.id).expect("timeline");
    assert!(timeline.len() > 1);

    let thread = service.escalation_thread(&complaint.id).expect("thread");
    assert_eq!(thread.len(), 1);
}

#[test]
fn admin_reply_stores_the_latest_reply_on_the_record() {
    let service = service();
    let complaint = in_progress(&service);
    service
        .escalate(&staff(), &complaint.id, "Need budget sign-off")
        .expect("escalates");

    let replied = service
        .admin_reply(&admin(), &complaint.id, "Budget approved")
        .expect("reply stored");
    assert_eq!(replied.admin_reply.as_deref(), Some("Budget approved"));
    assert!(replied.admin_reply_at.is_some());

    match service.admin_reply(&staff(), &complaint.id, "not allowed") {
        Err(ComplaintError::Permission(_)) => {}
        other => panic!("expected permission error, got {other:?}"),
    }
}
