use super::common::*;
use crate::complaints::domain::{actions, ComplaintStatus, Priority};
use crate::complaints::repository::ComplaintRepository;
use crate::complaints::service::ComplaintError;

#[test]
fn filing_starts_in_submitted_with_an_audit_entry() {
    let service = service();
    let complaint = filed(&service);

    assert_eq!(complaint.status, ComplaintStatus::Submitted);
    assert_eq!(complaint.priority, Priority::Low);
    assert_eq!(complaint.snapshot.student_name, "Anita Sharma");
    assert_eq!(complaint.snapshot.hostel_id, "H1");

    let logs = service.timeline(&complaint.id).expect("timeline");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, actions::SUBMITTED);
}

#[test]
fn only_students_can_file() {
    let service = service();
    match service.file(&staff(), new_complaint(), &StubDirectory) {
        Err(ComplaintError::Permission(_)) => {}
        other => panic!("expected permission error, got {other:?}"),
    }
}

#[test]
fn blank_description_is_rejected() {
    let service = service();
    let mut input = new_complaint();
    input.description = "   ".to_string();
    match service.file(&student(), input, &StubDirectory) {
        Err(ComplaintError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn staff_cannot_update_an_unassigned_complaint() {
    let service = service();
    let complaint = filed(&service);
    match service.update_status(&staff(), &complaint.id, ComplaintStatus::InProgress, None, None) {
        Err(ComplaintError::Permission(_)) => {}
        other => panic!("expected permission error, got {other:?}"),
    }
}

#[test]
fn resolving_requires_notes() {
    let service = service();
    let complaint = in_progress(&service);
    match service.update_status(
        &staff(),
        &complaint.id,
        ComplaintStatus::Resolved,
        Some("   ".to_string()),
        None,
    ) {
        Err(ComplaintError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn resolving_records_the_resolver_and_notes() {
    let service = service();
    let complaint = resolved(&service);

    assert_eq!(complaint.status, ComplaintStatus::Resolved);
    assert_eq!(complaint.resolution_notes.as_deref(), Some("Replaced the washer"));
    assert!(complaint.is_resolved_by(staff().id()));
    assert!(complaint.resolved_at.is_some());

    let logs = service.timeline(&complaint.id).expect("timeline");
    assert!(logs.iter().any(|log| log.action == actions::RESOLVED));
}

#[test]
fn skipping_states_is_rejected() {
    let service = service();
    let complaint = filed(&service);
    service
        .assign(&admin(), &complaint.id, &staff())
        .expect("assignment succeeds");

    match service.update_status(&staff(), &complaint.id, ComplaintStatus::Resolved, None, None) {
        Err(ComplaintError::InvalidTransition { from, to }) => {
            assert_eq!(from, ComplaintStatus::Submitted);
            assert_eq!(to, ComplaintStatus::Resolved);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn rating_closes_the_complaint() {
    let service = service();
    let complaint = resolved(&service);

    let rating = service
        .rate(&student(), &complaint.id, 4, Some("Quick fix".to_string()))
        .expect("rating accepted");
    assert_eq!(rating.score, 4);

    let closed = service
        .repository()
        .fetch(&complaint.id)
        .expect("fetch")
        .expect("exists");
    assert_eq!(closed.status, ComplaintStatus::Closed);

    let logs = service.timeline(&complaint.id).expect("timeline");
    assert!(logs.iter().any(|log| log.action == actions::CLOSED));
}

#[test]
fn rating_is_rejected_before_resolution() {
    let service = service();
    let complaint = in_progress(&service);
    match service.rate(&student(), &complaint.id, 4, None) {
        Err(ComplaintError::NotEligible) => {}
        other => panic!("expected not eligible, got {other:?}"),
    }
}

#[test]
fn rating_score_must_be_between_one_and_five() {
    let service = service();
    let complaint = resolved(&service);
    for score in [0u8, 6] {
        match service.rate(&student(), &complaint.id, score, None) {
            Err(ComplaintError::Validation(_)) => {}
            other => panic!("expected validation error for score {score}, got {other:?}"),
        }
    }
}

#[test]
fn a_second_rating_is_rejected() {
    let service = service();
    let complaint = resolved(&service);
    service
        .rate(&student(), &complaint.id, 5, None)
        .expect("first rating accepted");
    match service.rate(&student(), &complaint.id, 3, None) {
        Err(ComplaintError::NotEligible) | Err(ComplaintError::AlreadyRated) => {}
        other => panic!("expected rating to be rejected, got {other:?}"),
    }
}

#[test]
fn admin_close_requires_student_feedback() {
    let service = service();
    let complaint = resolved(&service);
    match service.close_by_admin(&admin(), &complaint.id) {
        Err(ComplaintError::MissingFeedback) => {}
        other => panic!("expected missing feedback, got {other:?}"),
    }
}

#[test]
fn admin_close_after_rating_logs_the_closure() {
    let service = service();
    let complaint = in_progress(&service);
    let complaint = service
        .update_status(
            &staff(),
            &complaint.id,
            ComplaintStatus::Resolved,
            Some("Done".to_string()),
            None,
        )
        .expect("resolved");
    service
        .rate(&student(), &complaint.id, 5, None)
        .expect("rated");

    // The rating already closed it; a second close is an invalid transition.
    match service.close_by_admin(&admin(), &complaint.id) {
        Err(ComplaintError::InvalidTransition { .. }) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn priority_can_be_changed_exactly_once() {
    let service = service();
    let complaint = filed(&service);

    let updated = service
        .set_priority(&admin(), &complaint.id, Priority::High)
        .expect("first priority change");
    assert_eq!(updated.priority, Priority::High);
    assert!(updated.priority_locked);

    match service.set_priority(&admin(), &complaint.id, Priority::Medium) {
        Err(ComplaintError::PriorityLocked) => {}
        other => panic!("expected locked priority, got {other:?}"),
    }

    let logs = service.timeline(&complaint.id).expect("timeline");
    assert!(logs.iter().any(|log| log.action == "Priority changed to High"));
}

#[test]
fn busy_staff_cannot_take_a_second_complaint() {
    let service = service();
    let _first = in_progress(&service);
    let second = filed(&service);

    match service.assign(&admin(), &second.id, &staff()) {
        Err(ComplaintError::StaffBusy) => {}
        other => panic!("expected staff busy, got {other:?}"),
    }

    // A different staff member is still assignable.
    service
        .assign(&admin(), &second.id, &second_staff())
        .expect("other staff assigned");
}

#[test]
fn staff_frees_up_after_resolving() {
    let service = service();
    let _settled = resolved(&service);
    let next = filed(&service);

    service
        .assign(&admin(), &next.id, &staff())
        .expect("staff available again");
}

#[test]
fn clearing_resolved_hides_it_from_history_only() {
    let service = service();
    let complaint = resolved(&service);

    service
        .clear_resolved(&staff(), &complaint.id)
        .expect("cleared");

    let history = service
        .staff_resolution_history(&staff())
        .expect("history");
    assert!(history.is_empty());

    // The record itself survives.
    let stored = service
        .repository()
        .fetch(&complaint.id)
        .expect("fetch")
        .expect("still present");
    assert!(stored.cleared_by_staff);
}

#[test]
fn clearing_someone_elses_resolution_is_not_found() {
    let service = service();
    let complaint = resolved(&service);
    match service.clear_resolved(&second_staff(), &complaint.id) {
        Err(ComplaintError::Repository(crate::store::RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}
