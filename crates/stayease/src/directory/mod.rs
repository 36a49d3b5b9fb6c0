//! Member directory: student registration, staff accounts, and the admin
//! roster views. Implements the caller-resolution and filing-snapshot seams
//! the other modules depend on.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{
    Member, NewStaff, NewStudent, StaffCreated, StaffOverview, StaffPerformance, StudentOverview,
    StudentProfile, StudentStats,
};
pub use repository::DirectoryRepository;
pub use router::directory_router;
pub use service::{DirectoryError, DirectoryService};
