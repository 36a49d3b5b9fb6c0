//! StayEase hostel-complaint management backend.
//!
//! The crate is organized as one module per functional area, each following
//! the same `domain` / `repository` / `service` / `router` split. Storage and
//! outbound notification delivery sit behind traits so every service can be
//! exercised in isolation.

pub mod actor;
pub mod broadcasts;
pub mod complaints;
pub mod config;
pub mod directory;
pub mod error;
pub mod inventory;
pub mod maintenance;
pub mod notify;
pub mod store;
pub mod support;
pub mod telemetry;
