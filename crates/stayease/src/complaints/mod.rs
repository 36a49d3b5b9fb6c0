//! Complaint lifecycle: filing, the four-state machine, the rating gate, the
//! escalation side-channel, and the projections built on top of them.
//!
//! The service owns all state-machine and permission invariants; routers and
//! storage backends stay thin. Complaints are never hard-deleted: staff and
//! admin "clear" operations only flip soft-hide flags.

pub mod domain;
pub mod reports;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    actions, ChatEntry, ChatSpeaker, Complaint, ComplaintCategory, ComplaintId, ComplaintLog,
    ComplaintRating, ComplaintStatus, NewComplaint, Priority, StudentSnapshot,
};
pub use reports::{
    AdminComplaintDetail, AdminDashboard, CategoryCount, ComplaintDetail, ComplaintFilter,
    RatingEntry, StaffDashboard, StaffRatingsSummary, StaffUpdate, UpdateKind,
};
pub use repository::ComplaintRepository;
pub use router::{complaint_router, ComplaintApi};
pub use service::{ComplaintError, ComplaintService, SnapshotSource};
