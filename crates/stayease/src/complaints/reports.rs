//! Read-only projections over the complaint store: dashboards, histories,
//! and the admin updates feed. No invariants of their own; everything here is
//! recomputed per query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ChatEntry, Complaint, ComplaintCategory, ComplaintId, ComplaintLog, ComplaintRating,
    ComplaintStatus, Priority,
};
use super::repository::ComplaintRepository;
use super::service::{ComplaintError, ComplaintService};
use crate::actor::Actor;

/// A complaint together with its trail and the derived feedback flag.
#[derive(Debug, Clone, Serialize)]
pub struct ComplaintDetail {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub rating: Option<ComplaintRating>,
    pub logs: Vec<ComplaintLog>,
    pub awaiting_feedback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffDashboard {
    pub welcome_message: String,
    pub total_assigned: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingEntry {
    pub complaint_id: ComplaintId,
    pub category: &'static str,
    pub score: u8,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffRatingsSummary {
    pub average_rating: f64,
    pub total_ratings: usize,
    pub ratings: Vec<RatingEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub welcome_message: String,
    pub total_complaints: usize,
    pub pending_complaints: usize,
    pub resolved_complaints: usize,
    pub category_stats: Vec<CategoryCount>,
}

/// Optional facets for the admin complaint listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    pub category: Option<ComplaintCategory>,
    pub hostel: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminComplaintDetail {
    #[serde(flatten)]
    pub complaint: Complaint,
    pub rating: Option<ComplaintRating>,
    pub logs: Vec<ComplaintLog>,
    pub chat_history: Vec<ChatEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateKind {
    Escalation,
    Resolution,
}

/// One row of the admin staff-updates feed.
#[derive(Debug, Clone, Serialize)]
pub struct StaffUpdate {
    pub id: String,
    pub note_type: UpdateKind,
    pub complaint_id: ComplaintId,
    pub category: &'static str,
    pub staff_name: String,
    pub timestamp: DateTime<Utc>,
    pub note_content: Option<String>,
}

impl<R> ComplaintService<R>
where
    R: ComplaintRepository + 'static,
{
    fn detail(&self, complaint: Complaint) -> Result<ComplaintDetail, ComplaintError> {
        let rating = self.repository().rating_for(&complaint.id)?;
        let mut logs = self.repository().logs_for(&complaint.id)?;
        logs.sort_by_key(|log| log.created_at);
        let awaiting_feedback =
            complaint.status == ComplaintStatus::Resolved && rating.is_none();
        Ok(ComplaintDetail {
            complaint,
            rating,
            logs,
            awaiting_feedback,
        })
    }

    /// The student's own complaints, newest first.
    pub fn student_complaints(
        &self,
        actor: &Actor,
    ) -> Result<Vec<ComplaintDetail>, ComplaintError> {
        let Some(student) = actor.as_student() else {
            return Err(ComplaintError::Permission(
                "only students can list their complaints".to_string(),
            ));
        };

        let mut own: Vec<Complaint> = self
            .repository()
            .list()?
            .into_iter()
            .filter(|complaint| complaint.student == student.id)
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        own.into_iter().map(|complaint| self.detail(complaint)).collect()
    }

    /// Active workload for the staff member: assigned and still open.
    pub fn staff_active(&self, actor: &Actor) -> Result<Vec<ComplaintDetail>, ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff can list assigned complaints".to_string(),
            ));
        };

        let mut assigned: Vec<Complaint> = self
            .repository()
            .list()?
            .into_iter()
            .filter(|complaint| {
                complaint.is_assigned_to(&staff.id) && complaint.status.is_active()
            })
            .collect();
        assigned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        assigned
            .into_iter()
            .map(|complaint| self.detail(complaint))
            .collect()
    }

    pub fn staff_dashboard(&self, actor: &Actor) -> Result<StaffDashboard, ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff have a staff dashboard".to_string(),
            ));
        };

        let complaints = self.repository().list()?;
        let total_assigned = complaints
            .iter()
            .filter(|c| c.is_assigned_to(&staff.id) || c.is_resolved_by(&staff.id))
            .count();
        let in_progress = complaints
            .iter()
            .filter(|c| c.is_assigned_to(&staff.id) && c.status.is_active())
            .count();
        let resolved = complaints
            .iter()
            .filter(|c| c.is_resolved_by(&staff.id) && c.status.is_settled())
            .count();

        Ok(StaffDashboard {
            welcome_message: format!("Welcome {}", staff.full_name),
            total_assigned,
            in_progress,
            resolved,
        })
    }

    /// Settled complaints the staff member resolved and has not cleared.
    pub fn staff_resolution_history(
        &self,
        actor: &Actor,
    ) -> Result<Vec<Complaint>, ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff have a resolution history".to_string(),
            ));
        };

        let mut history: Vec<Complaint> = self
            .repository()
            .list()?
            .into_iter()
            .filter(|c| {
                c.is_resolved_by(&staff.id) && c.status.is_settled() && !c.cleared_by_staff
            })
            .collect();
        history.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));
        Ok(history)
    }

    /// Ratings earned on complaints this staff member resolved.
    pub fn staff_ratings(&self, actor: &Actor) -> Result<StaffRatingsSummary, ComplaintError> {
        let Some(staff) = actor.as_staff() else {
            return Err(ComplaintError::Permission(
                "only staff have a ratings dashboard".to_string(),
            ));
        };

        let complaints = self.repository().list()?;
        let mut entries: Vec<(ComplaintRating, &Complaint)> = Vec::new();
        for rating in self.repository().ratings()? {
            if let Some(complaint) = complaints
                .iter()
                .find(|c| c.id == rating.complaint && c.is_resolved_by(&staff.id))
            {
                entries.push((rating, complaint));
            }
        }
        entries.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));

        let total_ratings = entries.len();
        let average_rating = if total_ratings == 0 {
            0.0
        } else {
            let sum: u32 = entries.iter().map(|(r, _)| r.score as u32).sum();
            (sum as f64 / total_ratings as f64 * 10.0).round() / 10.0
        };

        let ratings = entries
            .into_iter()
            .map(|(rating, complaint)| RatingEntry {
                complaint_id: rating.complaint,
                category: complaint.category.label(),
                score: rating.score,
                feedback: rating.feedback,
                created_at: rating.created_at,
            })
            .collect();

        Ok(StaffRatingsSummary {
            average_rating,
            total_ratings,
            ratings,
        })
    }

    /// All escalated complaints, most recent escalation first.
    pub fn escalated_complaints(&self) -> Result<Vec<Complaint>, ComplaintError> {
        let mut escalated: Vec<Complaint> = self
            .repository()
            .list()?
            .into_iter()
            .filter(|c| c.escalated)
            .collect();
        escalated.sort_by(|a, b| b.escalated_at.cmp(&a.escalated_at));
        Ok(escalated)
    }

    pub fn admin_dashboard(&self, actor: &Actor) -> Result<AdminDashboard, ComplaintError> {
        let Some(admin) = actor.as_admin() else {
            return Err(ComplaintError::Permission(
                "only admins have an admin dashboard".to_string(),
            ));
        };

        let complaints = self.repository().list()?;
        let total_complaints = complaints.len();
        let pending_complaints = complaints
            .iter()
            .filter(|c| c.status == ComplaintStatus::Submitted)
            .count();
        let resolved_complaints = complaints.iter().filter(|c| c.status.is_settled()).count();

        let mut category_stats: Vec<CategoryCount> = Vec::new();
        for complaint in &complaints {
            let label = complaint.category.label();
            match category_stats.iter_mut().find(|entry| entry.category == label) {
                Some(entry) => entry.count += 1,
                None => category_stats.push(CategoryCount {
                    category: label,
                    count: 1,
                }),
            }
        }
        category_stats.sort_by(|a, b| a.category.cmp(b.category));

        Ok(AdminDashboard {
            welcome_message: format!("Welcome Admin {}", admin.full_name),
            total_complaints,
            pending_complaints,
            resolved_complaints,
            category_stats,
        })
    }

    /// Faceted admin listing, newest first.
    pub fn admin_list(
        &self,
        actor: &Actor,
        filter: &ComplaintFilter,
    ) -> Result<Vec<Complaint>, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can list all complaints".to_string(),
            ));
        }

        let mut complaints: Vec<Complaint> = self
            .repository()
            .list()?
            .into_iter()
            .filter(|c| filter.status.map_or(true, |status| c.status == status))
            .filter(|c| filter.priority.map_or(true, |priority| c.priority == priority))
            .filter(|c| filter.category.map_or(true, |category| c.category == category))
            .filter(|c| {
                filter
                    .hostel
                    .as_ref()
                    .map_or(true, |hostel| &c.snapshot.hostel_id == hostel)
            })
            .collect();
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(complaints)
    }

    /// Single-complaint admin view with the reconstructed escalation thread.
    pub fn admin_detail(
        &self,
        actor: &Actor,
        id: &ComplaintId,
    ) -> Result<AdminComplaintDetail, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can view complaint details".to_string(),
            ));
        }

        let complaint = self
            .repository()
            .fetch(id)?
            .ok_or(ComplaintError::Repository(crate::store::RepositoryError::NotFound))?;
        let rating = self.repository().rating_for(id)?;
        let mut logs = self.repository().logs_for(id)?;
        logs.sort_by_key(|log| log.created_at);
        let chat_history = self.escalation_thread(id)?;

        Ok(AdminComplaintDetail {
            complaint,
            rating,
            logs,
            chat_history,
        })
    }

    /// Escalations and resolutions not yet cleared from the admin feed,
    /// newest first.
    pub fn staff_updates(&self, actor: &Actor) -> Result<Vec<StaffUpdate>, ComplaintError> {
        if actor.as_admin().is_none() {
            return Err(ComplaintError::Permission(
                "only admins can view staff updates".to_string(),
            ));
        }

        let mut updates = Vec::new();
        for complaint in self.repository().list()? {
            if complaint.cleared_by_admin {
                continue;
            }

            if complaint.escalated {
                updates.push(StaffUpdate {
                    id: format!("esc_{}", complaint.id),
                    note_type: UpdateKind::Escalation,
                    complaint_id: complaint.id.clone(),
                    category: complaint.category.label(),
                    staff_name: complaint
                        .escalated_by
                        .as_ref()
                        .map(|member| member.full_name.clone())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    timestamp: complaint.escalated_at.unwrap_or(complaint.created_at),
                    note_content: complaint.escalation_note.clone(),
                });
            }

            if complaint.status.is_settled() && complaint.resolved_by.is_some() {
                updates.push(StaffUpdate {
                    id: format!("res_{}", complaint.id),
                    note_type: UpdateKind::Resolution,
                    complaint_id: complaint.id.clone(),
                    category: complaint.category.label(),
                    staff_name: complaint
                        .resolved_by
                        .as_ref()
                        .map(|member| member.full_name.clone())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    timestamp: complaint.resolved_at.unwrap_or(complaint.created_at),
                    note_content: complaint.resolution_notes.clone(),
                });
            }
        }

        updates.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(updates)
    }
}
