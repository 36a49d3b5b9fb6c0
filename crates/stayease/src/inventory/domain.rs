use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::MemberRef;
use crate::complaints::domain::ComplaintId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ItemCategory {
    Electricity,
    Plumbing,
    Furniture,
    Cleaning,
    Water,
    Internet,
    Food,
    #[default]
    Other,
}

/// A consumable or spare tracked by the hostel store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub category: ItemCategory,
    pub total_quantity: u32,
    pub available_quantity: u32,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StockAction {
    Added,
    Used,
    Removed,
}

/// Append-only stock movement. Usage and removal carry negative quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLog {
    pub item: ItemId,
    pub user: Option<MemberRef>,
    pub quantity_changed: i64,
    pub action: StockAction,
    pub related_complaint: Option<ComplaintId>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub category: ItemCategory,
    #[serde(default)]
    pub total_quantity: u32,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "pcs".to_string()
}
