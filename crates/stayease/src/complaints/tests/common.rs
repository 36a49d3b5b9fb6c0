use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::actor::{Actor, ActorResolver, MemberId, MemberRef, ResolveError};
use crate::complaints::domain::{
    Complaint, ComplaintCategory, ComplaintId, ComplaintLog, ComplaintRating, ComplaintStatus,
    NewComplaint, StudentSnapshot,
};
use crate::complaints::repository::ComplaintRepository;
use crate::complaints::service::{ComplaintService, SnapshotSource};
use crate::store::RepositoryError;

pub(super) struct InMemoryComplaints {
    complaints: Mutex<HashMap<ComplaintId, Complaint>>,
    logs: Mutex<Vec<ComplaintLog>>,
    ratings: Mutex<HashMap<ComplaintId, ComplaintRating>>,
}

impl InMemoryComplaints {
    pub(super) fn new() -> Self {
        Self {
            complaints: Mutex::new(HashMap::new()),
            logs: Mutex::new(Vec::new()),
            ratings: Mutex::new(HashMap::new()),
        }
    }
}

impl ComplaintRepository for InMemoryComplaints {
    fn insert(&self, complaint: Complaint) -> Result<Complaint, RepositoryError> {
        let mut complaints = self.complaints.lock().expect("complaints lock");
        if complaints.contains_key(&complaint.id) {
            return Err(RepositoryError::Conflict);
        }
        complaints.insert(complaint.id.clone(), complaint.clone());
        Ok(complaint)
    }

    fn update(&self, complaint: Complaint) -> Result<(), RepositoryError> {
        let mut complaints = self.complaints.lock().expect("complaints lock");
        if !complaints.contains_key(&complaint.id) {
            return Err(RepositoryError::NotFound);
        }
        complaints.insert(complaint.id.clone(), complaint);
        Ok(())
    }

    fn fetch(&self, id: &ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
        let complaints = self.complaints.lock().expect("complaints lock");
        Ok(complaints.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Complaint>, RepositoryError> {
        let complaints = self.complaints.lock().expect("complaints lock");
        Ok(complaints.values().cloned().collect())
    }

    fn append_log(&self, log: ComplaintLog) -> Result<(), RepositoryError> {
        self.logs.lock().expect("logs lock").push(log);
        Ok(())
    }

    fn logs_for(&self, id: &ComplaintId) -> Result<Vec<ComplaintLog>, RepositoryError> {
        let logs = self.logs.lock().expect("logs lock");
        Ok(logs
            .iter()
            .filter(|log| &log.complaint == id)
            .cloned()
            .collect())
    }

    fn insert_rating(&self, rating: ComplaintRating) -> Result<(), RepositoryError> {
        let mut ratings = self.ratings.lock().expect("ratings lock");
        if ratings.contains_key(&rating.complaint) {
            return Err(RepositoryError::Conflict);
        }
        ratings.insert(rating.complaint.clone(), rating);
        Ok(())
    }

    fn rating_for(&self, id: &ComplaintId) -> Result<Option<ComplaintRating>, RepositoryError> {
        let ratings = self.ratings.lock().expect("ratings lock");
        Ok(ratings.get(id).cloned())
    }

    fn ratings(&self) -> Result<Vec<ComplaintRating>, RepositoryError> {
        let ratings = self.ratings.lock().expect("ratings lock");
        Ok(ratings.values().cloned().collect())
    }
}

/// Directory stub wired to the four fixture members below.
pub(super) struct StubDirectory;

impl ActorResolver for StubDirectory {
    fn resolve(&self, id: &MemberId) -> Result<Actor, ResolveError> {
        match id.0.as_str() {
            "stu-1" => Ok(student()),
            "stf-1" => Ok(staff()),
            "stf-2" => Ok(second_staff()),
            "adm-1" => Ok(admin()),
            other => Err(ResolveError::Unknown(other.to_string())),
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

pub(super) fn service() -> ComplaintService<InMemoryComplaints> {
    ComplaintService::new(Arc::new(InMemoryComplaints::new()))
}

pub(super) fn new_complaint() -> NewComplaint {
    NewComplaint {
        category: ComplaintCategory::Plumbing,
        description: "Leaking tap in room 204".to_string(),
        image_key: None,
        hostel_id: "H1".to_string(),
    }
}

pub(super) fn filed(service: &ComplaintService<InMemoryComplaints>) -> Complaint {
    service
        .file(&student(), new_complaint(), &StubDirectory)
        .expect("complaint files")
}

/// File, assign to the fixture staff member, and mark in progress.
pub(super) fn in_progress(service: &ComplaintService<InMemoryComplaints>) -> Complaint {
    let complaint = filed(service);
    service
        .assign(&admin(), &complaint.id, &staff())
        .expect("assignment succeeds");
    service
        .update_status(&staff(), &complaint.id, ComplaintStatus::InProgress, None, None)
        .expect("transition to in progress")
}

/// Drive a fresh complaint all the way to `Resolved`.
pub(super) fn resolved(service: &ComplaintService<InMemoryComplaints>) -> Complaint {
    let complaint = in_progress(service);
    service
        .update_status(
            &staff(),
            &complaint.id,
            ComplaintStatus::Resolved,
            Some("Replaced the washer".to_string()),
            None,
        )
        .expect("transition to resolved")
}
