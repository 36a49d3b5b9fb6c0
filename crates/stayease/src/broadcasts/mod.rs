//! Hostel-wide announcements for issues that affect many residents at once.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Broadcast, BroadcastId, NewBroadcast};
pub use repository::BroadcastRepository;
pub use router::{broadcast_router, BroadcastApi};
pub use service::{BroadcastError, BroadcastService};
