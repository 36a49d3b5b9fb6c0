use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::MemberId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketCategory {
    Account,
    Hostel,
    Complaint,
    Technical,
    General,
    Other,
}

impl TicketCategory {
    pub const fn label(self) -> &'static str {
        match self {
            TicketCategory::Account => "Account Issue",
            TicketCategory::Hostel => "Hostel Related",
            TicketCategory::Complaint => "Complaint Follow-up",
            TicketCategory::Technical => "Technical Issue",
            TicketCategory::General => "General Query",
            TicketCategory::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketSender {
    Student,
    Admin,
}

/// One message in a ticket thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportMessage {
    pub ticket: TicketId,
    pub sender: TicketSender,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A help request outside the complaint lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: TicketId,
    pub student: MemberId,
    pub student_name: String,
    pub category: TicketCategory,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub category: TicketCategory,
    pub subject: String,
    pub description: String,
}

/// Ticket plus its thread, oldest message first.
#[derive(Debug, Clone, Serialize)]
pub struct TicketThread {
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub messages: Vec<SupportMessage>,
}
