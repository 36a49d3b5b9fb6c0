use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    actions, ChatEntry, ChatSpeaker, Complaint, ComplaintId, ComplaintLog, ComplaintRating,
    ComplaintStatus, NewComplaint, Priority, StudentSnapshot,
};
use super::repository::ComplaintRepository;
use crate::actor::{Actor, MemberRef};
use crate::store::RepositoryError;

/// Directory-backed lookup supplying the filing-time snapshot fields.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self, student: &MemberRef, hostel_id: &str) -> StudentSnapshot;
}

/// Error raised by the complaint lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum ComplaintError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Permission(String),
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },
    #[error("complaint not eligible for rating")]
    NotEligible,
    #[error("rating already submitted")]
    AlreadyRated,
    #[error("cannot close complaint before student feedback")]
    MissingFeedback,
    #[error("staff is already assigned to another complaint")]
    StaffBusy,
    #[error("priority is locked and cannot be changed")]
    PriorityLocked,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

static COMPLAINT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_complaint_id() -> ComplaintId {
    let id = COMPLAINT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ComplaintId(format!("cmp-{id:06}"))
}

/// Service enforcing the complaint state machine, the rating gate, and the
/// escalation side-channel over the repository seam.
pub struct ComplaintService<R> {
    repository: Arc<R>,
}

impl<R> ComplaintService<R>
where
    R: ComplaintRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub(crate) fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn load(&self, id: &ComplaintId) -> Result<Complaint, ComplaintError> {
        self.repository
            .fetch(id)?
            .ok_or(ComplaintError::Repository(RepositoryError::NotFound))
    }

    fn log(
        &self,
        complaint: &ComplaintId,
        action: impl Into<String>,
        actor: &Actor,
        notes: Option<String>,
        proof: Option<String>,
    ) -> Result<(), ComplaintError> {
        self.repository.append_log(ComplaintLog {
            complaint: complaint.clone(),
            action: action.into(),
            performed_by: Some(actor.member().clone()),
            notes,
            proof,
            created_at: Utc::now(),
        })?;
        Ok(())
    }

    /// File a new complaint on behalf of the student actor. The record starts
    /// in `Submitted` with an initial audit entry.
    pub fn file(
        &self,
        actor: &Actor,
        input: NewComplaint,
        snapshots: &dyn SnapshotSource,
    ) -> Result<Complaint, ComplaintError> {
        let Some(student) = actor.as_student() else {
            return Err(ComplaintError::Permission(
                "only students can file complaints".to_string(),
            ));
        };

        if input.description.trim().is_empty() {
            return Err(ComplaintError::Validation(
                "description is required".to_string(),
            ));
        }

        let snapshot = snapshots.snapshot(student, &input.hostel_id);
        let complaint = Complaint {
            id: next_complaint_id(),
            student: student.id.clone(),
            snapshot,
            category: input.category,
            description: input.description,
            image_key: input.image_key,
            status: ComplaintStatus::Submitted,
            priority: Priority::default(),
            priority_locked: false,
            assigned_to: None,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
            resolution_proof: None,
            escalated: false,
            escalation_note: None,
            escalated_by: None,
            escalated_at: None,
            admin_reply: None,
            admin_replied_by: None,
            admin_reply_at: None,
            cleared_by_staff: false,
            cleared_by_admin: false,
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(complaint)?;
        self.log(
            &stored.id,
            actions::SUBMITTED,
            actor,
            Some("Complaint submitted successfully".to_string()),
            None,
        )?;
        Ok(stored)
    }

    /// Staff-driven status transition: `Submitted -> In Progress` and
    /// `In Progress -> Resolved`. Everything else is rejected.
    pub fn update_status(
        &self,
        actor: &Actor,
        id: &ComplaintId,
        requested: ComplaintStatus,
        notes: Option<String>,
        proof: Option<String>,
    ) -> Result<Complaint, ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff can update complaint status".to_string(),
            ));
        };

        let mut complaint = self.load(id)?;
        if !complaint.is_assigned_to(&staff.id) {
            return Err(ComplaintError::Permission(
                "complaint is not assigned to this staff member".to_string(),
            ));
        }

        match (complaint.status, requested) {
            (ComplaintStatus::Submitted, ComplaintStatus::InProgress) => {
                complaint.status = ComplaintStatus::InProgress;
                self.repository.update(complaint.clone())?;
                self.log(id, actions::MARKED_IN_PROGRESS, actor, None, None)?;
            }
            (ComplaintStatus::InProgress, ComplaintStatus::Resolved) => {
                let notes = notes
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| {
                        ComplaintError::Validation("resolution notes required".to_string())
                    })?;

                complaint.status = ComplaintStatus::Resolved;
                complaint.resolution_notes = Some(notes.clone());
                complaint.resolved_by = Some(staff.clone());
                complaint.resolved_at = Some(Utc::now());
                complaint.resolution_proof = proof.clone();
                self.repository.update(complaint.clone())?;
                self.log(id, actions::RESOLVED, actor, Some(notes), proof)?;
            }
            (from, to) => return Err(ComplaintError::InvalidTransition { from, to }),
        }

        Ok(complaint)
    }

    /// Rating gate: one feedback per complaint, only while `Resolved`, only by
    /// the owning student. A valid rating closes the complaint.
    pub fn rate(
        &self,
        actor: &Actor,
        id: &ComplaintId,
        score: u8,
        feedback: Option<String>,
    ) -> Result<ComplaintRating, ComplaintError> {
        let Some(student) = actor.as_student() else {
            return Err(ComplaintError::Permission(
                "only students can rate complaints".to_string(),
            ));
        };

        let mut complaint = self.load(id)?;
        if complaint.student != student.id || complaint.status != ComplaintStatus::Resolved {
            return Err(ComplaintError::NotEligible);
        }

        if self.repository.rating_for(id)?.is_some() {
            return Err(ComplaintError::AlreadyRated);
        }

        if !(1..=5).contains(&score) {
            return Err(ComplaintError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let rating = ComplaintRating {
            complaint: id.clone(),
            student: student.id.clone(),
            score,
            feedback,
            created_at: Utc::now(),
        };

        self.repository
            .insert_rating(rating.clone())
            .map_err(|err| match err {
                RepositoryError::Conflict => ComplaintError::AlreadyRated,
                other => ComplaintError::Repository(other),
            })?;

        complaint.status = ComplaintStatus::Closed;
        self.repository.update(complaint)?;
        self.log(
            id,
            actions::CLOSED,
            actor,
            Some("Complaint closed automatically after student rating.".to_string()),
            None,
        )?;

        Ok(rating)
    }

    /// Admin closure, allowed only after the student rated the resolution.
    pub fn close_by_admin(
        &self,
        actor: &Actor,
        id: &ComplaintId,
    ) -> Result<Complaint, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can close complaints".to_string(),
            ));
        }

        let mut complaint = self.load(id)?;
        if self.repository.rating_for(id)?.is_none() {
            return Err(ComplaintError::MissingFeedback);
        }
        if complaint.status == ComplaintStatus::Closed {
            return Err(ComplaintError::InvalidTransition {
                from: ComplaintStatus::Closed,
                to: ComplaintStatus::Closed,
            });
        }

        complaint.status = ComplaintStatus::Closed;
        self.repository.update(complaint.clone())?;
        self.log(
            id,
            actions::CLOSED_BY_ADMIN,
            actor,
            Some("Complaint closed after reviewing student feedback".to_string()),
            None,
        )?;
        Ok(complaint)
    }

    /// One-shot priority change; the first admin edit locks the field.
    pub fn set_priority(
        &self,
        actor: &Actor,
        id: &ComplaintId,
        priority: Priority,
    ) -> Result<Complaint, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can change priority".to_string(),
            ));
        }

        let mut complaint = self.load(id)?;
        if complaint.priority_locked {
            return Err(ComplaintError::PriorityLocked);
        }

        complaint.priority = priority;
        complaint.priority_locked = true;
        self.repository.update(complaint.clone())?;
        self.log(
            id,
            format!("Priority changed to {priority}"),
            actor,
            None,
            None,
        )?;
        Ok(complaint)
    }

    fn staff_is_busy(&self, staff: &MemberRef) -> Result<bool, ComplaintError> {
        let busy = self
            .repository
            .list()?
            .iter()
            .any(|complaint| complaint.status.is_active() && complaint.is_assigned_to(&staff.id));
        Ok(busy)
    }

    /// Assign or reassign a complaint. The availability projection is derived
    /// on every call; a staff member holding any non-terminal complaint is
    /// rejected with `StaffBusy`.
    pub fn assign(
        &self,
        actor: &Actor,
        id: &ComplaintId,
        staff: &Actor,
    ) -> Result<Complaint, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can assign staff".to_string(),
            ));
        }
        let Some(staff) = staff.as_staff() else {
            return Err(ComplaintError::Validation(
                "only staff users can be assigned".to_string(),
            ));
        };

        if self.staff_is_busy(staff)? {
            return Err(ComplaintError::StaffBusy);
        }

        let mut complaint = self.load(id)?;
        complaint.assigned_to = Some(staff.clone());
        self.repository.update(complaint.clone())?;
        self.log(
            id,
            format!("Assigned to {}", staff.full_name),
            actor,
            None,
            None,
        )?;
        Ok(complaint)
    }

    /// Escalation side-channel: flag the complaint for admin attention.
    pub fn escalate(
        &self,
        actor: &Actor,
        id: &ComplaintId,
        note: &str,
    ) -> Result<Complaint, ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff can escalate complaints".to_string(),
            ));
        };

        let note = note.trim();
        if note.is_empty() {
            return Err(ComplaintError::Validation(
                "escalation note is required".to_string(),
            ));
        }

        let mut complaint = self.load(id)?;
        if !complaint.is_assigned_to(&staff.id) {
            return Err(ComplaintError::Permission(
                "complaint is not assigned to this staff member".to_string(),
            ));
        }

        complaint.escalated = true;
        complaint.escalation_note = Some(note.to_string());
        complaint.escalated_by = Some(staff.clone());
        complaint.escalated_at = Some(Utc::now());
        self.repository.update(complaint.clone())?;
        self.log(
            id,
            actions::ESCALATED_TO_ADMIN,
            actor,
            Some(note.to_string()),
            None,
        )?;
        Ok(complaint)
    }

    /// Staff follow-up message on an already escalated complaint. Appends to
    /// the audit trail only; the primary state machine is untouched.
    pub fn staff_escalation_reply(
        &self,
        actor: &Actor,
        id: &ComplaintId,
        message: &str,
    ) -> Result<Complaint, ComplaintError> {
        if actor.as_staff().is_none() {
            return Err(ComplaintError::Permission(
                "only staff can reply to escalations".to_string(),
            ));
        }

        let message = message.trim();
        if message.is_empty() {
            return Err(ComplaintError::Validation("message is required".to_string()));
        }

        let complaint = self.load(id)?;
        if !complaint.escalated {
            return Err(ComplaintError::Validation(
                "complaint is not escalated".to_string(),
            ));
        }

        self.log(id, actions::ESCALATED, actor, Some(message.to_string()), None)?;
        Ok(complaint)
    }

    /// Admin reply on the escalation side-channel.
    pub fn admin_reply(
        &self,
        actor: &Actor,
        id: &ComplaintId,
        reply: &str,
    ) -> Result<Complaint, ComplaintError> {
        let Some(admin) = actor.as_admin() else {
            return Err(ComplaintError::Permission(
                "only admins can reply to escalations".to_string(),
            ));
        };

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ComplaintError::Validation(
                "reply text is required".to_string(),
            ));
        }

        let mut complaint = self.load(id)?;
        complaint.admin_reply = Some(reply.to_string());
        complaint.admin_replied_by = Some(admin.clone());
        complaint.admin_reply_at = Some(Utc::now());
        self.repository.update(complaint.clone())?;
        self.log(
            id,
            actions::ADMIN_REPLIED,
            actor,
            Some(reply.to_string()),
            None,
        )?;
        Ok(complaint)
    }

    /// Reconstruct the escalation conversation from the audit trail.
    pub fn escalation_thread(&self, id: &ComplaintId) -> Result<Vec<ChatEntry>, ComplaintError> {
        let mut logs = self.repository.logs_for(id)?;
        logs.sort_by_key(|log| log.created_at);

        let thread = logs
            .into_iter()
            .filter_map(|log| match log.action.as_str() {
                actions::ESCALATED_TO_ADMIN | actions::ESCALATED => Some(ChatEntry {
                    speaker: ChatSpeaker::Staff,
                    message: log.notes,
                    sender: log
                        .performed_by
                        .map(|member| member.full_name)
                        .unwrap_or_else(|| "Staff".to_string()),
                    timestamp: log.created_at,
                }),
                actions::ADMIN_REPLIED | actions::ADMIN_REPLY => Some(ChatEntry {
                    speaker: ChatSpeaker::Admin,
                    message: log.notes,
                    sender: "Admin".to_string(),
                    timestamp: log.created_at,
                }),
                _ => None,
            })
            .collect();
        Ok(thread)
    }

    /// Full audit trail, oldest first.
    pub fn timeline(&self, id: &ComplaintId) -> Result<Vec<ComplaintLog>, ComplaintError> {
        self.load(id)?;
        let mut logs = self.repository.logs_for(id)?;
        logs.sort_by_key(|log| log.created_at);
        Ok(logs)
    }

    /// Soft-hide a settled complaint from the resolving staff member's
    /// history view.
    pub fn clear_resolved(
        &self,
        actor: &Actor,
        id: &ComplaintId,
    ) -> Result<(), ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff can clear resolved complaints".to_string(),
            ));
        };

        let mut complaint = self.load(id)?;
        if !complaint.is_resolved_by(&staff.id) || !complaint.status.is_settled() {
            return Err(ComplaintError::Repository(RepositoryError::NotFound));
        }

        complaint.cleared_by_staff = true;
        self.repository.update(complaint)?;
        Ok(())
    }

    /// Bulk resolve: filtered update over the ids that are assigned to the
    /// actor and currently `In Progress`. Non-matching ids are skipped, not
    /// failed; the return value is the number of records updated.
    pub fn bulk_resolve(
        &self,
        actor: &Actor,
        ids: &[ComplaintId],
        notes: &str,
    ) -> Result<usize, ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff can resolve complaints".to_string(),
            ));
        };

        let notes = notes.trim();
        if ids.is_empty() || notes.is_empty() {
            return Err(ComplaintError::Validation(
                "ids and resolution_notes are required".to_string(),
            ));
        }

        let mut updated = 0;
        for id in ids {
            let Some(mut complaint) = self.repository.fetch(id)? else {
                continue;
            };
            if !complaint.is_assigned_to(&staff.id)
                || complaint.status != ComplaintStatus::InProgress
            {
                continue;
            }

            complaint.status = ComplaintStatus::Resolved;
            complaint.resolution_notes = Some(notes.to_string());
            complaint.resolved_by = Some(staff.clone());
            complaint.resolved_at = Some(Utc::now());
            self.repository.update(complaint)?;
            self.log(id, actions::RESOLVED_BULK, actor, Some(notes.to_string()), None)?;
            updated += 1;
        }

        Ok(updated)
    }

    /// Bulk assignment. The busy projection is evaluated once against the
    /// pre-batch state; within the batch the update is a plain filtered write
    /// over the non-terminal complaints.
    pub fn bulk_assign(
        &self,
        actor: &Actor,
        ids: &[ComplaintId],
        staff: &Actor,
    ) -> Result<usize, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can assign staff".to_string(),
            ));
        }
        let Some(staff) = staff.as_staff() else {
            return Err(ComplaintError::Validation(
                "only staff users can be assigned".to_string(),
            ));
        };
        if ids.is_empty() {
            return Err(ComplaintError::Validation(
                "ids and staff_id are required".to_string(),
            ));
        }

        if self.staff_is_busy(staff)? {
            return Err(ComplaintError::StaffBusy);
        }

        let mut updated = 0;
        for id in ids {
            let Some(mut complaint) = self.repository.fetch(id)? else {
                continue;
            };
            if !complaint.status.is_active() {
                continue;
            }

            complaint.assigned_to = Some(staff.clone());
            self.repository.update(complaint)?;
            self.log(
                id,
                format!("Assigned to {} (Bulk)", staff.full_name),
                actor,
                None,
                None,
            )?;
            updated += 1;
        }

        Ok(updated)
    }

    /// Bulk status update applying the single-record transition guards per
    /// id; ids that fail a precondition are silently excluded from the count.
    pub fn bulk_update_status(
        &self,
        actor: &Actor,
        ids: &[ComplaintId],
        requested: ComplaintStatus,
    ) -> Result<usize, ComplaintError> {
        let Some(admin) = actor.as_admin() else {
            return Err(ComplaintError::Permission(
                "only admins can bulk-update status".to_string(),
            ));
        };
        if ids.is_empty() {
            return Err(ComplaintError::Validation(
                "ids and status are required".to_string(),
            ));
        }

        let mut updated = 0;
        for id in ids {
            let Some(mut complaint) = self.repository.fetch(id)? else {
                continue;
            };

            match (complaint.status, requested) {
                (ComplaintStatus::Submitted, ComplaintStatus::InProgress) => {
                    complaint.status = ComplaintStatus::InProgress;
                }
                (ComplaintStatus::InProgress, ComplaintStatus::Resolved) => {
                    complaint.status = ComplaintStatus::Resolved;
                    complaint.resolved_by = Some(admin.clone());
                    complaint.resolved_at = Some(Utc::now());
                }
                (ComplaintStatus::Resolved, ComplaintStatus::Closed) => {
                    if self.repository.rating_for(id)?.is_none() {
                        continue;
                    }
                    complaint.status = ComplaintStatus::Closed;
                }
                _ => continue,
            }

            self.repository.update(complaint)?;
            self.log(
                id,
                format!("Status updated to {requested} (Bulk)"),
                actor,
                None,
                None,
            )?;
            updated += 1;
        }

        Ok(updated)
    }

    /// Soft-hide complaints from the admin views.
    pub fn clear_many(
        &self,
        actor: &Actor,
        ids: &[ComplaintId],
    ) -> Result<usize, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can clear complaints".to_string(),
            ));
        }

        let mut cleared = 0;
        for id in ids {
            let Some(mut complaint) = self.repository.fetch(id)? else {
                continue;
            };
            complaint.cleared_by_admin = true;
            self.repository.update(complaint)?;
            cleared += 1;
        }
        Ok(cleared)
    }

    /// Clear the admin staff-updates feed: specific `esc_`/`res_` entry ids,
    /// or everything currently pending when none are given.
    pub fn clear_updates(
        &self,
        actor: &Actor,
        entry_ids: &[String],
    ) -> Result<usize, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can clear staff updates".to_string(),
            ));
        }

        if entry_ids.is_empty() {
            let mut cleared = 0;
            for mut complaint in self.repository.list()? {
                let pending_escalation = complaint.escalated && !complaint.cleared_by_admin;
                let pending_resolution = complaint.status.is_settled()
                    && complaint.resolved_by.is_some()
                    && !complaint.cleared_by_admin;
                if pending_escalation || pending_resolution {
                    complaint.cleared_by_admin = true;
                    self.repository.update(complaint)?;
                    cleared += 1;
                }
            }
            return Ok(cleared);
        }

        let ids: Vec<ComplaintId> = entry_ids
            .iter()
            .filter_map(|entry| entry.split_once('_').map(|(_, id)| ComplaintId(id.to_string())))
            .collect();
        if ids.is_empty() {
            return Err(ComplaintError::Validation(
                "no valid update ids provided".to_string(),
            ));
        }

        self.clear_many(actor, &ids)
    }

    /// Staff busy projection exposed for assignment screens.
    pub fn is_staff_busy(&self, staff: &MemberRef) -> Result<bool, ComplaintError> {
        self.staff_is_busy(staff)
    }
}

