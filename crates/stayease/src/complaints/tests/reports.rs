use super::common::*;
use crate::complaints::domain::{ComplaintCategory, ComplaintStatus, NewComplaint, Priority};
use crate::complaints::reports::{ComplaintFilter, UpdateKind};
use crate::complaints::service::ComplaintError;

fn file_category(
    service: &crate::complaints::service::ComplaintService<InMemoryComplaints>,
    category: ComplaintCategory,
) -> crate::complaints::domain::Complaint {
    service
        .file(
            &student(),
            NewComplaint {
                category,
                description: "Something is broken".to_string(),
                image_key: None,
                hostel_id: "H1".to_string(),
            },
            &StubDirectory,
        )
        .expect("complaint files")
}

#[test]
fn student_view_flags_resolved_complaints_awaiting_feedback() {
    let service = service();
    let complaint = resolved(&service);

    let own = service.student_complaints(&student()).expect("listing");
    assert_eq!(own.len(), 1);
    assert!(own[0].awaiting_feedback);
    assert!(own[0].rating.is_none());

    service
        .rate(&student(), &complaint.id, 5, None)
        .expect("rated");

    let own = service.student_complaints(&student()).expect("listing");
    assert!(!own[0].awaiting_feedback);
    assert_eq!(own[0].rating.as_ref().map(|r| r.score), Some(5));
}

#[test]
fn staff_dashboard_counts_workload_and_resolutions() {
    let service = service();
    let _settled = resolved(&service);
    let active = in_progress(&service);

    let dashboard = service.staff_dashboard(&staff()).expect("dashboard");
    assert_eq!(dashboard.welcome_message, "Welcome Ravi Kumar");
    assert_eq!(dashboard.total_assigned, 2);
    assert_eq!(dashboard.in_progress, 1);
    assert_eq!(dashboard.resolved, 1);

    let workload = service.staff_active(&staff()).expect("active");
    assert_eq!(workload.len(), 1);
    assert_eq!(workload[0].complaint.id, active.id);
}

#[test]
fn staff_ratings_average_is_rounded_to_one_decimal() {
    let service = service();

    let first = resolved(&service);
    service
        .rate(&student(), &first.id, 5, Some("Great".to_string()))
        .expect("rated");
    let second = resolved(&service);
    service
        .rate(&student(), &second.id, 4, None)
        .expect("rated");
    let third = resolved(&service);
    service
        .rate(&student(), &third.id, 4, None)
        .expect("rated");

    let summary = service.staff_ratings(&staff()).expect("summary");
    assert_eq!(summary.total_ratings, 3);
    // (5 + 4 + 4) / 3 = 4.333... -> 4.3
    assert_eq!(summary.average_rating, 4.3);
}

#[test]
fn admin_dashboard_aggregates_by_category() {
    let service = service();
    file_category(&service, ComplaintCategory::Food);
    file_category(&service, ComplaintCategory::Food);
    file_category(&service, ComplaintCategory::Internet);

    let dashboard = service.admin_dashboard(&admin()).expect("dashboard");
    assert_eq!(dashboard.welcome_message, "Welcome Admin Warden Rao");
    assert_eq!(dashboard.total_complaints, 3);
    assert_eq!(dashboard.pending_complaints, 3);
    assert_eq!(dashboard.resolved_complaints, 0);

    let food = dashboard
        .category_stats
        .iter()
        .find(|entry| entry.category == "Food / Mess")
        .expect("food bucket");
    assert_eq!(food.count, 2);
}

#[test]
fn admin_listing_applies_all_facets() {
    let service = service();
    let plumbing = filed(&service);
    file_category(&service, ComplaintCategory::Internet);
    service
        .set_priority(&admin(), &plumbing.id, Priority::High)
        .expect("priority set");

    let filter = ComplaintFilter {
        status: Some(ComplaintStatus::Submitted),
        priority: Some(Priority::High),
        category: Some(ComplaintCategory::Plumbing),
        hostel: Some("H1".to_string()),
    };
    let hits = service.admin_list(&admin(), &filter).expect("filtered");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, plumbing.id);

    let misses = service
        .admin_list(
            &admin(),
            &ComplaintFilter {
                hostel: Some("H2".to_string()),
                ..ComplaintFilter::default()
            },
        )
        .expect("filtered");
    assert!(misses.is_empty());
}

#[test]
fn admin_detail_includes_the_chat_history() {
    let service = service();
    let complaint = in_progress(&service);
    service
        .escalate(&staff(), &complaint.id, "Need approval")
        .expect("escalates");
    service
        .admin_reply(&admin(), &complaint.id, "Go ahead")
        .expect("replies");

    let detail = service.admin_detail(&admin(), &complaint.id).expect("detail");
    assert_eq!(detail.chat_history.len(), 2);
    assert!(detail.logs.len() >= 4);
}

#[test]
fn staff_updates_feed_lists_escalations_and_resolutions() {
    let service = service();
    let settled = resolved(&service);
    let escalated = in_progress(&service);
    service
        .escalate(&staff(), &escalated.id, "Stuck on parts")
        .expect("escalates");

    let updates = service.staff_updates(&admin()).expect("feed");
    assert_eq!(updates.len(), 2);

    let escalation = updates
        .iter()
        .find(|u| u.note_type == UpdateKind::Escalation)
        .expect("escalation row");
    assert_eq!(escalation.id, format!("esc_{}", escalated.id));
    assert_eq!(escalation.staff_name, "Ravi Kumar");

    let resolution = updates
        .iter()
        .find(|u| u.note_type == UpdateKind::Resolution)
        .expect("resolution row");
    assert_eq!(resolution.id, format!("res_{}", settled.id));
    assert_eq!(resolution.note_content.as_deref(), Some("Replaced the washer"));
}

#[test]
fn dashboards_are_role_gated() {
    let service = service();
    match service.admin_dashboard(&staff()) {
        Err(ComplaintError::Permission(_)) => {}
        other => panic!("expected permission error, got {other:?}"),
    }
    match service.staff_dashboard(&student()) {
        Err(ComplaintError::Permission(_)) => {}
        other => panic!("expected permission error, got {other:?}"),
    }
}
