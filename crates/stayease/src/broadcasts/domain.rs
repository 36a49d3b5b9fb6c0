use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::MemberRef;
use crate::complaints::domain::ComplaintCategory;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BroadcastId(pub String);

impl fmt::Display for BroadcastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A hostel-wide announcement about a known, ongoing issue. Shares the
/// complaint categories so frontends can match announcements to complaints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: BroadcastId,
    pub title: String,
    pub message: String,
    pub category: ComplaintCategory,
    pub expected_resolution_time: Option<String>,
    pub active: bool,
    pub created_by: Option<MemberRef>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBroadcast {
    pub title: String,
    pub message: String,
    pub category: ComplaintCategory,
    #[serde(default)]
    pub expected_resolution_time: Option<String>,
}
