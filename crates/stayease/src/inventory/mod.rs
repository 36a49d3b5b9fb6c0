//! Hostel store stock with an append-only movement trail.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{InventoryItem, InventoryLog, ItemCategory, ItemId, NewItem, StockAction};
pub use repository::InventoryRepository;
pub use router::{inventory_router, InventoryApi};
pub use service::{InventoryError, InventoryService};
