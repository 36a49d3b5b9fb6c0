use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::MemberRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaintenanceLogId(pub String);

impl fmt::Display for MaintenanceLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How often a task recurs. One-time tasks are never rescheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    #[default]
    #[serde(rename = "One-time")]
    OneTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Pending,
    Approved,
    Rejected,
}

/// A recurring or one-off upkeep duty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub assigned_to: Option<MemberRef>,
    pub next_due_date: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A completion report awaiting admin review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub id: MaintenanceLogId,
    pub task: TaskId,
    pub completed_by: Option<MemberRef>,
    pub completion_date: DateTime<Utc>,
    pub status: CompletionStatus,
    pub notes: Option<String>,
    pub proof_key: Option<String>,
    pub admin_comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub next_due_date: NaiveDate,
}
