use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::{MemberId, MemberRef};

/// Identifier wrapper for filed complaints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComplaintId(pub String);

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle states. The wire representation uses the literal labels the
/// frontend expects, including the embedded space in "In Progress".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Submitted,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl ComplaintStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "Submitted",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Closed => "Closed",
        }
    }

    /// Non-terminal states that keep the assigned staff member busy.
    pub const fn is_active(self) -> bool {
        matches!(
            self,
            ComplaintStatus::Submitted | ComplaintStatus::InProgress
        )
    }

    pub const fn is_settled(self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Closed)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Admin-controlled priority. One-shot: locked after the first change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintCategory {
    Electricity,
    Plumbing,
    Furniture,
    Cleaning,
    Water,
    Internet,
    Food,
    Security,
    Noise,
    Staff,
    Medical,
    Other,
}

impl ComplaintCategory {
    pub const fn label(self) -> &'static str {
        match self {
            ComplaintCategory::Electricity => "Electricity",
            ComplaintCategory::Plumbing => "Plumbing",
            ComplaintCategory::Furniture => "Furniture",
            ComplaintCategory::Cleaning => "Cleaning",
            ComplaintCategory::Water => "Water",
            ComplaintCategory::Internet => "Internet",
            ComplaintCategory::Food => "Food / Mess",
            ComplaintCategory::Security => "Security",
            ComplaintCategory::Noise => "Noise / Discipline",
            ComplaintCategory::Staff => "Staff / Management",
            ComplaintCategory::Medical => "Medical",
            ComplaintCategory::Other => "Other",
        }
    }
}

/// Student info captured at filing time so later roster edits do not rewrite
/// complaint history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSnapshot {
    pub hostel_id: String,
    pub student_name: String,
    pub department: String,
    pub year: String,
}

/// A single reported issue tracked through its lifecycle. Never hard-deleted;
/// the `cleared_by_*` flags soft-hide it from the respective views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: ComplaintId,
    pub student: MemberId,
    pub snapshot: StudentSnapshot,
    pub category: ComplaintCategory,
    pub description: String,
    pub image_key: Option<String>,
    pub status: ComplaintStatus,
    pub priority: Priority,
    pub priority_locked: bool,
    pub assigned_to: Option<MemberRef>,
    pub resolved_by: Option<MemberRef>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub resolution_proof: Option<String>,
    pub escalated: bool,
    pub escalation_note: Option<String>,
    pub escalated_by: Option<MemberRef>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub admin_reply: Option<String>,
    pub admin_replied_by: Option<MemberRef>,
    pub admin_reply_at: Option<DateTime<Utc>>,
    pub cleared_by_staff: bool,
    pub cleared_by_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Complaint {
    pub fn is_assigned_to(&self, id: &MemberId) -> bool {
        self.assigned_to
            .as_ref()
            .map(|member| &member.id == id)
            .unwrap_or(false)
    }

    pub fn is_resolved_by(&self, id: &MemberId) -> bool {
        self.resolved_by
            .as_ref()
            .map(|member| &member.id == id)
            .unwrap_or(false)
    }
}

/// Inbound payload for filing a complaint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
    pub category: ComplaintCategory,
    pub description: String,
    #[serde(default)]
    pub image_key: Option<String>,
    pub hostel_id: String,
}

/// Fixed audit action labels. Priority and bulk-assignment entries carry
/// formatted labels built in the service.
pub mod actions {
    pub const SUBMITTED: &str = "Submitted";
    pub const MARKED_IN_PROGRESS: &str = "Marked In Progress";
    pub const RESOLVED: &str = "Complaint Resolved";
    pub const RESOLVED_BULK: &str = "Complaint Resolved (Bulk)";
    pub const CLOSED: &str = "Closed";
    pub const CLOSED_BY_ADMIN: &str = "Closed by Admin";
    pub const ESCALATED_TO_ADMIN: &str = "Escalated to Admin";
    pub const ESCALATED: &str = "Escalated";
    pub const ADMIN_REPLIED: &str = "Admin replied to escalation";
    pub const ADMIN_REPLY: &str = "Admin Reply";
}

/// Append-only audit entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintLog {
    pub complaint: ComplaintId,
    pub action: String,
    pub performed_by: Option<MemberRef>,
    pub notes: Option<String>,
    pub proof: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One-to-one student feedback; its creation closes the complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRating {
    pub complaint: ComplaintId,
    pub student: MemberId,
    pub score: u8,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSpeaker {
    Staff,
    Admin,
}

/// One entry of the reconstructed escalation conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(rename = "type")]
    pub speaker: ChatSpeaker,
    pub message: Option<String>,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
}
