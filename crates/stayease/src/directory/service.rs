use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    Member, NewStaff, NewStudent, StaffCreated, StaffOverview, StaffPerformance, StudentOverview,
    StudentProfile, StudentStats,
};
use super::repository::DirectoryRepository;
use crate::actor::{Actor, ActorResolver, MemberId, MemberRef, ResolveError, Role};
use crate::complaints::domain::{ComplaintStatus, StudentSnapshot};
use crate::complaints::reports::ComplaintDetail;
use crate::complaints::repository::ComplaintRepository;
use crate::complaints::service::SnapshotSource;
use crate::notify::{Notification, NotificationQueue};
use crate::store::RepositoryError;

/// Error raised by directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Permission(String),
    #[error("email already exists")]
    EmailTaken,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

static MEMBER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_member_id() -> MemberId {
    let id = MEMBER_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed);
    MemberId(format!("mem-{id:06}"))
}

/// Roster management over the directory store, with the complaint store
/// consulted for availability and statistics and the notification queue used
/// for staff credential handoff.
pub struct DirectoryService<D, C, N> {
    directory: Arc<D>,
    complaints: Arc<C>,
    notifications: Arc<N>,
}

impl<D, C, N> DirectoryService<D, C, N>
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    pub fn new(directory: Arc<D>, complaints: Arc<C>, notifications: Arc<N>) -> Self {
        Self {
            directory,
            complaints,
            notifications,
        }
    }

    fn require_admin(actor: &Actor, action: &str) -> Result<(), DirectoryError> {
        if actor.as_admin().is_none() {
            return Err(DirectoryError::Permission(format!(
                "only admins can {action}"
            )));
        }
        Ok(())
    }

    fn load(&self, id: &MemberId) -> Result<Member, DirectoryError> {
        self.directory
            .fetch(id)?
            .ok_or(DirectoryError::Repository(RepositoryError::NotFound))
    }

    fn load_role(&self, id: &MemberId, role: Role) -> Result<Member, DirectoryError> {
        let member = self.load(id)?;
        if member.role != role {
            return Err(DirectoryError::Repository(RepositoryError::NotFound));
        }
        Ok(member)
    }

    fn busy_staff_ids(&self) -> Result<Vec<MemberId>, DirectoryError> {
        let busy = self
            .complaints
            .list()?
            .into_iter()
            .filter(|complaint| complaint.status.is_active())
            .filter_map(|complaint| complaint.assigned_to.map(|member| member.id))
            .collect();
        Ok(busy)
    }

    /// Open student registration. Session issuance is handled elsewhere; this
    /// only creates the directory record.
    pub fn signup_student(&self, input: NewStudent) -> Result<Member, DirectoryError> {
        for (field, value) in [
            ("full_name", &input.full_name),
            ("email", &input.email),
            ("mobile_number", &input.mobile_number),
        ] {
            if value.trim().is_empty() {
                return Err(DirectoryError::Validation(format!("{field} is required")));
            }
        }
        if self.directory.fetch_by_email(&input.email)?.is_some() {
            return Err(DirectoryError::EmailTaken);
        }

        let member = Member {
            id: next_member_id(),
            full_name: input.full_name,
            email: input.email,
            mobile_number: input.mobile_number,
            role: Role::Student,
            active: true,
            profile: Some(input.profile),
            created_at: Utc::now(),
        };
        let stored = self.directory.insert(member).map_err(|err| match err {
            RepositoryError::Conflict => DirectoryError::EmailTaken,
            other => DirectoryError::Repository(other),
        })?;
        Ok(stored)
    }

    /// Registration helper: does an account already use this email?
    pub fn email_exists(&self, email: &str) -> Result<bool, DirectoryError> {
        Ok(self.directory.fetch_by_email(email.trim())?.is_some())
    }

    /// Create a staff account and queue its credentials notification. A queue
    /// failure is logged and surfaces only through `notified: false`.
    pub fn create_staff(
        &self,
        actor: &Actor,
        input: NewStaff,
    ) -> Result<StaffCreated, DirectoryError> {
        Self::require_admin(actor, "create staff accounts")?;

        for (field, value) in [
            ("full_name", &input.full_name),
            ("email", &input.email),
            ("password", &input.password),
            ("mobile_number", &input.mobile_number),
        ] {
            if value.trim().is_empty() {
                return Err(DirectoryError::Validation(format!("{field} is required")));
            }
        }
        if self.directory.fetch_by_email(&input.email)?.is_some() {
            return Err(DirectoryError::EmailTaken);
        }

        let member = Member {
            id: next_member_id(),
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            mobile_number: input.mobile_number,
            role: Role::Staff,
            active: true,
            profile: None,
            created_at: Utc::now(),
        };
        let stored = self.directory.insert(member).map_err(|err| match err {
            RepositoryError::Conflict => DirectoryError::EmailTaken,
            other => DirectoryError::Repository(other),
        })?;

        let notification =
            Notification::staff_credentials(&input.full_name, &input.email, &input.password);
        let notified = match self.notifications.enqueue(notification) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    staff = %stored.id,
                    error = %err,
                    "staff credentials notification was not queued"
                );
                false
            }
        };

        Ok(StaffCreated {
            member: stored,
            notified,
        })
    }

    /// Active staff roster with the derived availability flag.
    pub fn staff_roster(&self, actor: &Actor) -> Result<Vec<StaffOverview>, DirectoryError> {
        Self::require_admin(actor, "list staff")?;
        let busy = self.busy_staff_ids()?;

        let roster = self
            .directory
            .list()?
            .into_iter()
            .filter(|member| member.role == Role::Staff && member.active)
            .map(|member| StaffOverview {
                available: !busy.contains(&member.id),
                id: member.id,
                full_name: member.full_name,
                email: member.email,
                mobile_number: member.mobile_number,
            })
            .collect();
        Ok(roster)
    }

    /// Staff currently holding no Submitted or In Progress complaint.
    pub fn available_staff(&self, actor: &Actor) -> Result<Vec<StaffOverview>, DirectoryError> {
        let roster = self.staff_roster(actor)?;
        Ok(roster.into_iter().filter(|staff| staff.available).collect())
    }

    /// Soft-delete: the account stays for audit references but drops out of
    /// rosters and can no longer resolve as an actor.
    pub fn deactivate_staff(&self, actor: &Actor, id: &MemberId) -> Result<(), DirectoryError> {
        Self::require_admin(actor, "deactivate staff")?;
        let mut member = self.load_role(id, Role::Staff)?;
        member.active = false;
        self.directory.update(member)?;
        Ok(())
    }

    /// Student roster with per-student complaint counts.
    pub fn students(&self, actor: &Actor) -> Result<Vec<StudentOverview>, DirectoryError> {
        Self::require_admin(actor, "list students")?;
        let complaints = self.complaints.list()?;

        let students = self
            .directory
            .list()?
            .into_iter()
            .filter(|member| member.role == Role::Student)
            .map(|member| {
                let own: Vec<_> = complaints
                    .iter()
                    .filter(|complaint| complaint.student == member.id)
                    .collect();
                StudentOverview {
                    total_complaints: own.len(),
                    resolved_complaints: own
                        .iter()
                        .filter(|complaint| complaint.status.is_settled())
                        .count(),
                    active_complaints: own
                        .iter()
                        .filter(|complaint| complaint.status.is_active())
                        .count(),
                    is_active: member.active,
                    profile: member.profile.unwrap_or_else(empty_profile),
                    id: member.id,
                    full_name: member.full_name,
                    email: member.email,
                    mobile_number: member.mobile_number,
                }
            })
            .collect();
        Ok(students)
    }

    /// Full per-student view: record, statistics, and every complaint with
    /// its rating and trail, newest first.
    pub fn student_detail(
        &self,
        actor: &Actor,
        id: &MemberId,
    ) -> Result<(Member, StudentStats, Vec<ComplaintDetail>), DirectoryError> {
        Self::require_admin(actor, "view student details")?;
        let student = self.load_role(id, Role::Student)?;

        let mut own: Vec<_> = self
            .complaints
            .list()?
            .into_iter()
            .filter(|complaint| complaint.student == student.id)
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let stats = StudentStats {
            total: own.len(),
            active: own.iter().filter(|c| c.status.is_active()).count(),
            resolved: own
                .iter()
                .filter(|c| c.status == ComplaintStatus::Resolved)
                .count(),
            closed: own
                .iter()
                .filter(|c| c.status == ComplaintStatus::Closed)
                .count(),
        };

        let mut details = Vec::with_capacity(own.len());
        for complaint in own {
            let rating = self.complaints.rating_for(&complaint.id)?;
            let mut logs = self.complaints.logs_for(&complaint.id)?;
            logs.sort_by_key(|log| log.created_at);
            let awaiting_feedback =
                complaint.status == ComplaintStatus::Resolved && rating.is_none();
            details.push(ComplaintDetail {
                complaint,
                rating,
                logs,
                awaiting_feedback,
            });
        }

        Ok((student, stats, details))
    }

    /// Flip a student account between active and disabled.
    pub fn toggle_student(&self, actor: &Actor, id: &MemberId) -> Result<Member, DirectoryError> {
        Self::require_admin(actor, "toggle student accounts")?;
        let mut student = self.load_role(id, Role::Student)?;
        student.active = !student.active;
        self.directory.update(student.clone())?;
        Ok(student)
    }

    /// Permanent removal, allowed only once the account is disabled.
    pub fn remove_student(&self, actor: &Actor, id: &MemberId) -> Result<(), DirectoryError> {
        Self::require_admin(actor, "remove student accounts")?;
        let student = self.load_role(id, Role::Student)?;
        if student.active {
            return Err(DirectoryError::Validation(
                "Cannot remove an active student. Please disable the account first.".to_string(),
            ));
        }
        self.directory.remove(&student.id)?;
        Ok(())
    }

    /// Workload and quality aggregate per active staff member, best score
    /// first.
    pub fn staff_performance(
        &self,
        actor: &Actor,
    ) -> Result<Vec<StaffPerformance>, DirectoryError> {
        Self::require_admin(actor, "view staff performance")?;
        let complaints = self.complaints.list()?;
        let ratings = self.complaints.ratings()?;

        let mut report: Vec<StaffPerformance> = self
            .directory
            .list()?
            .into_iter()
            .filter(|member| member.role == Role::Staff && member.active)
            .map(|member| {
                let involved: Vec<_> = complaints
                    .iter()
                    .filter(|c| c.is_assigned_to(&member.id) || c.is_resolved_by(&member.id))
                    .collect();
                let resolved: Vec<_> = involved
                    .iter()
                    .filter(|c| c.status.is_settled() && c.is_resolved_by(&member.id))
                    .collect();
                let active = involved
                    .iter()
                    .filter(|c| c.is_assigned_to(&member.id) && c.status.is_active())
                    .count();

                let turnarounds: Vec<f64> = resolved
                    .iter()
                    .filter_map(|c| {
                        c.resolved_at
                            .map(|at| (at - c.created_at).num_seconds() as f64 / 3600.0)
                    })
                    .collect();
                let avg_resolution_hours = if turnarounds.is_empty() {
                    None
                } else {
                    let avg = turnarounds.iter().sum::<f64>() / turnarounds.len() as f64;
                    Some(round2(avg))
                };

                let scores: Vec<u8> = ratings
                    .iter()
                    .filter(|rating| {
                        resolved.iter().any(|c| c.id == rating.complaint)
                    })
                    .map(|rating| rating.score)
                    .collect();
                let avg_rating = if scores.is_empty() {
                    None
                } else {
                    let avg =
                        scores.iter().map(|s| *s as f64).sum::<f64>() / scores.len() as f64;
                    Some(round2(avg))
                };

                let performance_score = round2(
                    resolved.len() as f64 * 2.0 + avg_rating.unwrap_or(0.0) * 5.0
                        - avg_resolution_hours.unwrap_or(0.0) * 0.5,
                );

                StaffPerformance {
                    staff_id: member.id,
                    full_name: member.full_name,
                    email: member.email,
                    total_assigned: involved.len(),
                    resolved: resolved.len(),
                    active,
                    avg_resolution_hours,
                    avg_rating,
                    performance_score,
                }
            })
            .collect();

        report.sort_by(|a, b| {
            b.performance_score
                .partial_cmp(&a.performance_score)
                .unwrap_or(Ordering::Equal)
        });
        Ok(report)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn empty_profile() -> StudentProfile {
    StudentProfile {
        department: String::new(),
        year: String::new(),
        hostel_name: String::new(),
        block: String::new(),
        room_number: String::new(),
    }
}

impl<D, C, N> ActorResolver for DirectoryService<D, C, N>
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    fn resolve(&self, id: &MemberId) -> Result<Actor, ResolveError> {
        let member = self
            .directory
            .fetch(id)
            .map_err(|err| ResolveError::Unavailable(err.to_string()))?
            .ok_or_else(|| ResolveError::Unknown(id.0.clone()))?;
        if !member.active {
            return Err(ResolveError::Inactive(id.0.clone()));
        }

        let member_ref = member.member_ref();
        Ok(match member.role {
            Role::Student => Actor::Student(member_ref),
            Role::Staff => Actor::Staff(member_ref),
            Role::Admin => Actor::Admin(member_ref),
        })
    }
}

impl<D, C, N> SnapshotSource for DirectoryService<D, C, N>
where
    D: DirectoryRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationQueue + 'static,
{
    fn snapshot(&self, student: &MemberRef, hostel_id: &str) -> StudentSnapshot {
        let profile = self
            .directory
            .fetch(&student.id)
            .ok()
            .flatten()
            .and_then(|member| member.profile)
            .unwrap_or_else(empty_profile);
        StudentSnapshot {
            hostel_id: hostel_id.to_string(),
            student_name: student.full_name.clone(),
            department: profile.department,
            year: profile.year,
        }
    }
}
