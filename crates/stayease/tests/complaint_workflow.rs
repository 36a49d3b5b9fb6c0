//! Integration specifications for the complaint lifecycle.
//!
//! Scenarios exercise the public service facade and the HTTP router end to
//! end: filing through rating, the escalation side-channel, bulk operations,
//! and the staff availability projection.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use stayease::actor::{Actor, ActorResolver, MemberId, MemberRef, ResolveError};
    use stayease::complaints::{
        Complaint, ComplaintCategory, ComplaintId, ComplaintLog, ComplaintRating,
        ComplaintRepository, ComplaintService, ComplaintStatus, NewComplaint, SnapshotSource,
        StudentSnapshot,
    };
    use stayease::store::RepositoryError;

    #[derive(Default)]
    pub(super) struct MemoryComplaints {
        complaints: Mutex<HashMap<ComplaintId, Complaint>>,
        logs: Mutex<Vec<ComplaintLog>>,
        ratings: Mutex<HashMap<ComplaintId, ComplaintRating>>,
    }

    impl ComplaintRepository for MemoryComplaints {
        fn insert(&self, complaint: Complaint) -> Result<Complaint, RepositoryError> {
            let mut guard = self.complaints.lock().expect("lock");
            if guard.contains_key(&complaint.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(complaint.id.clone(), complaint.clone());
            Ok(complaint)
        }

        fn update(&self, complaint: Complaint) -> Result<(), RepositoryError> {
            let mut guard = self.complaints.lock().expect("lock");
            if guard.contains_key(&complaint.id) {
                guard.insert(complaint.id.clone(), complaint);
                Ok(())
            } else {
                Err(RepositoryError::NotFound)
            }
        }

        fn fetch(&self, id: &ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
            Ok(self.complaints.lock().expect("lock").get(id).cloned())
        }

        fn list(&self) -> Result<Vec<Complaint>, RepositoryError> {
            Ok(self
                .complaints
                .lock()
                .expect("lock")
                .values()
                .cloned()
                .collect())
        }

        fn append_log(&self, log: ComplaintLog) -> Result<(), RepositoryError> {
            self.logs.lock().expect("lock").push(log);
            Ok(())
        }

        fn logs_for(&self, id: &ComplaintId) -> Result<Vec<ComplaintLog>, RepositoryError> {
            Ok(self
                .logs
                .lock()
                .expect("lock")
                .iter()
                .filter(|log| &log.complaint == id)
                .cloned()
                .collect())
        }

        fn insert_rating(&self, rating: ComplaintRating) -> Result<(), RepositoryError> {
            let mut guard = self.ratings.lock().expect("lock");
            if guard.contains_key(&rating.complaint) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(rating.complaint.clone(), rating);
            Ok(())
        }

        fn rating_for(&self, id: &ComplaintId) -> Result<Option<ComplaintRating>, RepositoryError> {
            Ok(self.ratings.lock().expect("lock").get(id).cloned())
        }

        fn ratings(&self) -> Result<Vec<ComplaintRating>, RepositoryError> {
            Ok(self
                .ratings
                .lock()
                .expect("lock")
                .values()
                .cloned()
                .collect())
        }
    }

    pub(super) struct StubDirectory;

    impl ActorResolver for StubDirectory {
        fn resolve(&self, id: &MemberId) -> Result<Actor, ResolveError> {
            match id.0.as_str() {
                "stu-1" => Ok(student()),
                "stf-1" => Ok(staff()),
                "stf-2" => Ok(second_staff()),
                "adm-1" => Ok(admin()),
                _ => Err(ResolveError::Unknown(id.0.clone())),
            }
        }
    }

    impl SnapshotSource for StubDirectory {
        fn snapshot(&self, student: &MemberRef, hostel_id: &str) -> StudentSnapshot {
            StudentSnapshot {
                hostel_id: hostel_id.to_string(),
                student_name: student.full_name.clone(),
                department: "Computer Science".to_string(),
                year: "3rd Year".to_string(),
            }
        }
    }

    pub(super) fn student() -> Actor {
        Actor::Student(MemberRef {
            id: MemberId("stu-1".to_string()),
            full_name: "Anita Sharma".to_string(),
        })
    }

    pub(super) fn staff() -> Actor {
        Actor::Staff(MemberRef {
            id: MemberId("stf-1".to_string()),
            full_name: "Ravi Kumar".to_string(),
        })
    }

    pub(super) fn second_staff() -> Actor {
        Actor::Staff(MemberRef {
            id: MemberId("stf-2".to_string()),
            full_name: "Meena Iyer".to_string(),
        })
    }

    pub(super) fn admin() -> Actor {
        Actor::Admin(MemberRef {
            id: MemberId("adm-1".to_string()),
            full_name: "Warden Rao".to_string(),
        })
    }

    pub(super) fn build_service() -> Arc<ComplaintService<MemoryComplaints>> {
        Arc::new(ComplaintService::new(Arc::new(MemoryComplaints::default())))
    }

    pub(super) fn submission() -> NewComplaint {
        NewComplaint {
            category: ComplaintCategory::Plumbing,
            description: "Leaking tap in room 204".to_string(),
            image_key: None,
            hostel_id: "H1".to_string(),
        }
    }

    pub(super) fn file(service: &ComplaintService<MemoryComplaints>) -> Complaint {
        service
            .file(&student(), submission(), &StubDirectory)
            .expect("complaint filed")
    }

    pub(super) fn in_progress(service: &ComplaintService<MemoryComplaints>) -> Complaint {
        let complaint = file(service);
        service
            .assign(&admin(), &complaint.id, &staff())
            .expect("assigned");
        service
            .update_status(
                &staff(),
                &complaint.id,
                ComplaintStatus::InProgress,
                None,
                None,
            )
            .expect("in progress")
    }

    pub(super) fn resolved(service: &ComplaintService<MemoryComplaints>) -> Complaint {
        let complaint = in_progress(service);
        service
            .update_status(
                &staff(),
                &complaint.id,
                ComplaintStatus::Resolved,
                Some("Replaced the washer".to_string()),
                None,
            )
            .expect("resolved")
    }
}

mod lifecycle {
    use super::common::*;
    use stayease::complaints::{actions, ComplaintError, ComplaintStatus};

    #[test]
    fn full_lifecycle_leaves_a_complete_audit_trail() {
        let service = build_service();
        let complaint = resolved(&service);
        service
            .rate(&student(), &complaint.id, 5, Some("Quick fix".to_string()))
            .expect("rated");

        let timeline = service.timeline(&complaint.id).expect("timeline");
        let trail: Vec<&str> = timeline.iter().map(|log| log.action.as_str()).collect();
        assert_eq!(
            trail,
            vec![
                actions::SUBMITTED,
                "Assigned to Ravi Kumar",
                actions::MARKED_IN_PROGRESS,
                actions::RESOLVED,
                actions::CLOSED,
            ]
        );

        let listing = service
            .student_complaints(&student())
            .expect("student view");
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].complaint.status, ComplaintStatus::Closed);
    }

    #[test]
    fn staff_availability_tracks_open_assignments() {
        let service = build_service();
        let busy = in_progress(&service);
        let other = file(&service);

        match service.assign(&admin(), &other.id, &staff()) {
            Err(ComplaintError::StaffBusy) => {}
            other => panic!("expected busy rejection, got {other:?}"),
        }

        service
            .update_status(
                &staff(),
                &busy.id,
                ComplaintStatus::Resolved,
                Some("Done".to_string()),
                None,
            )
            .expect("resolved");

        let assigned = service
            .assign(&admin(), &other.id, &staff())
            .expect("assignable again");
        assert_eq!(
            assigned.assigned_to.map(|member| member.id.0),
            Some("stf-1".to_string())
        );
    }

    #[test]
    fn priority_is_locked_after_first_admin_edit() {
        let service = build_service();
        let complaint = file(&service);

        service
            .set_priority(
                &admin(),
                &complaint.id,
                stayease::complaints::Priority::High,
            )
            .expect("priority set");

        match service.set_priority(
            &admin(),
            &complaint.id,
            stayease::complaints::Priority::Low,
        ) {
            Err(ComplaintError::PriorityLocked) => {}
            other => panic!("expected locked priority, got {other:?}"),
        }
    }

    #[test]
    fn admin_cannot_close_without_student_feedback() {
        let service = build_service();
        let complaint = resolved(&service);

        match service.close_by_admin(&admin(), &complaint.id) {
            Err(ComplaintError::MissingFeedback) => {}
            other => panic!("expected missing feedback rejection, got {other:?}"),
        }
    }

    #[test]
    fn rating_is_a_one_shot_gate() {
        let service = build_service();
        let complaint = resolved(&service);
        service
            .rate(&student(), &complaint.id, 4, None)
            .expect("first rating accepted");

        match service.rate(&student(), &complaint.id, 5, None) {
            Err(ComplaintError::NotEligible | ComplaintError::AlreadyRated) => {}
            other => panic!("expected rating rejection, got {other:?}"),
        }
    }
}

mod escalation {
    use super::common::*;
    use stayease::complaints::ChatSpeaker;

    #[test]
    fn escalation_thread_reconstructs_the_conversation_in_order() {
        let service = build_service();
        let complaint = in_progress(&service);

        service
            .escalate(&staff(), &complaint.id, "Needs plumbing contractor approval")
            .expect("escalated");
        service
            .admin_reply(&admin(), &complaint.id, "Approved, go ahead")
            .expect("admin replied");
        service
            .staff_escalation_reply(&staff(), &complaint.id, "Contractor booked for Monday")
            .expect("staff replied");

        let thread = service
            .escalation_thread(&complaint.id)
            .expect("thread built");
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0].speaker, ChatSpeaker::Staff);
        assert_eq!(thread[0].sender, "Ravi Kumar");
        assert_eq!(thread[1].speaker, ChatSpeaker::Admin);
        assert_eq!(thread[2].speaker, ChatSpeaker::Staff);
        assert_eq!(
            thread[2].message.as_deref(),
            Some("Contractor booked for Monday")
        );
    }

    #[test]
    fn escalation_does_not_disturb_the_primary_status() {
        let service = build_service();
        let complaint = in_progress(&service);

        let escalated = service
            .escalate(&staff(), &complaint.id, "Recurring leak, needs rework")
            .expect("escalated");

        assert!(escalated.escalated);
        assert_eq!(escalated.status, complaint.status);
    }
}

mod bulk {
    use super::common::*;
    use stayease::complaints::ComplaintStatus;

    #[test]
    fn bulk_resolve_only_touches_eligible_records() {
        let service = build_service();
        let eligible = in_progress(&service);
        let untouched = file(&service);

        let updated = service
            .bulk_resolve(
                &staff(),
                &[eligible.id.clone(), untouched.id.clone()],
                "Fixed during maintenance round",
            )
            .expect("bulk resolve");

        assert_eq!(updated, 1);
        let listing = service
            .student_complaints(&student())
            .expect("student view");
        let statuses: Vec<ComplaintStatus> = listing
            .iter()
            .map(|detail| detail.complaint.status)
            .collect();
        assert!(statuses.contains(&ComplaintStatus::Resolved));
        assert!(statuses.contains(&ComplaintStatus::Submitted));
    }

    #[test]
    fn bulk_assign_spreads_a_batch_over_one_availability_check() {
        let service = build_service();
        let first = file(&service);
        let second = file(&service);

        let updated = service
            .bulk_assign(
                &admin(),
                &[first.id.clone(), second.id.clone()],
                &second_staff(),
            )
            .expect("bulk assign");

        assert_eq!(updated, 2);
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use stayease::actor::ACTOR_HEADER;
    use stayease::complaints::{complaint_router, ComplaintApi};
    use tower::ServiceExt;

    fn build_router() -> (Arc<stayease::complaints::ComplaintService<MemoryComplaints>>, axum::Router) {
        let service = build_service();
        let router = complaint_router(ComplaintApi {
            service: Arc::clone(&service),
            directory: Arc::new(StubDirectory),
        });
        (service, router)
    }

    async fn body_json(body: Body) -> Value {
        let bytes = to_bytes(body, usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn filing_a_complaint_returns_the_created_record() {
        let (_, router) = build_router();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/complaints")
            .header("content-type", "application/json")
            .header(ACTOR_HEADER, "stu-1")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "category": "Plumbing",
                    "description": "Leaking tap in room 204",
                    "hostel_id": "H1",
                }))
                .expect("serialize"),
            ))
            .expect("request");

        let response = router.oneshot(request).await.expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);

        let payload = body_json(response.into_body()).await;
        assert_eq!(payload.get("status"), Some(&json!("Submitted")));
        assert_eq!(
            payload
                .get("snapshot")
                .and_then(|snapshot| snapshot.get("student_name")),
            Some(&json!("Anita Sharma"))
        );
    }

    #[tokio::test]
    async fn requests_without_a_caller_are_unauthorized() {
        let (_, router) = build_router();
        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/complaints")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("dispatch");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rating_endpoint_closes_the_complaint() {
        let (service, router) = build_router();
        let complaint = resolved(&service);

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/v1/complaints/{}/rating", complaint.id))
                    .header("content-type", "application/json")
                    .header(ACTOR_HEADER, "stu-1")
                    .body(Body::from(
                        serde_json::to_vec(&json!({ "rating": 5, "feedback": "Quick fix" }))
                            .expect("serialize"),
                    ))
                    .expect("request"),
            )
            .await
            .expect("dispatch");

        assert_eq!(response.status(), StatusCode::CREATED);
        let payload = body_json(response.into_body()).await;
        assert_eq!(
            payload.get("message"),
            Some(&json!("Thank you for your feedback! Complaint closed."))
        );
    }
}
