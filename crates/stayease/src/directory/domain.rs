use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::{MemberId, MemberRef, Role};

/// Hostel placement and academic details kept for student members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub department: String,
    pub year: String,
    pub hostel_name: String,
    pub block: String,
    pub room_number: String,
}

/// A directory member. Staff and admins carry no profile. Credentials are not
/// stored here; session handling sits in front of this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub role: Role,
    pub active: bool,
    pub profile: Option<StudentProfile>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn member_ref(&self) -> MemberRef {
        MemberRef {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

/// Student self-registration payload.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub profile: StudentProfile,
}

/// Admin payload for creating a staff account. The password travels only into
/// the credentials notification and is never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaff {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub mobile_number: String,
}

/// Outcome of staff creation. `notified` reports whether the credentials
/// notification was accepted by the queue; a delivery failure is not an error.
#[derive(Debug, Clone, Serialize)]
pub struct StaffCreated {
    pub member: Member,
    pub notified: bool,
}

/// One row of the admin staff roster with the derived availability flag.
#[derive(Debug, Clone, Serialize)]
pub struct StaffOverview {
    pub id: MemberId,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub available: bool,
}

/// Student roster row with complaint statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StudentOverview {
    pub id: MemberId,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub is_active: bool,
    pub total_complaints: usize,
    pub resolved_complaints: usize,
    pub active_complaints: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StudentStats {
    pub total: usize,
    pub active: usize,
    pub resolved: usize,
    pub closed: usize,
}

/// Per-staff workload and quality aggregate. `score` weighs resolutions up,
/// slow turnaround down.
#[derive(Debug, Clone, Serialize)]
pub struct StaffPerformance {
    pub staff_id: MemberId,
    pub full_name: String,
    pub email: String,
    pub total_assigned: usize,
    pub resolved: usize,
    pub active: usize,
    pub avg_resolution_hours: Option<f64>,
    pub avg_rating: Option<f64>,
    pub performance_score: f64,
}
