use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{InventoryItem, InventoryLog, ItemId, NewItem, StockAction};
use super::repository::InventoryRepository;
use crate::actor::Actor;
use crate::complaints::domain::ComplaintId;
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Permission(String),
    #[error("Insufficient stock")]
    InsufficientStock,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

static ITEM_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_item_id() -> ItemId {
    let id = ITEM_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ItemId(format!("inv-{id:06}"))
}

/// Stock tracking with an append-only movement trail. Available quantity can
/// never go negative; every mutation writes a log entry.
pub struct InventoryService<R> {
    repository: Arc<R>,
}

impl<R> InventoryService<R>
where
    R: InventoryRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    fn require_keeper(actor: &Actor) -> Result<(), InventoryError> {
        if actor.as_staff().is_none() && actor.as_admin().is_none() {
            return Err(InventoryError::Permission(
                "students cannot manage inventory".to_string(),
            ));
        }
        Ok(())
    }

    fn load(&self, id: &ItemId) -> Result<InventoryItem, InventoryError> {
        self.repository
            .fetch(id)?
            .ok_or(InventoryError::Repository(RepositoryError::NotFound))
    }

    pub fn create_item(
        &self,
        actor: &Actor,
        input: NewItem,
    ) -> Result<InventoryItem, InventoryError> {
        if actor.as_admin().is_none() {
            return Err(InventoryError::Permission(
                "only admins can create inventory items".to_string(),
            ));
        }
        if input.name.trim().is_empty() {
            return Err(InventoryError::Validation("name is required".to_string()));
        }

        let item = InventoryItem {
            id: next_item_id(),
            name: input.name,
            category: input.category,
            total_quantity: input.total_quantity,
            available_quantity: input.total_quantity,
            unit: input.unit,
            created_at: Utc::now(),
        };
        let stored = self.repository.insert(item)?;
        if stored.total_quantity > 0 {
            self.repository.append_log(InventoryLog {
                item: stored.id.clone(),
                user: Some(actor.member().clone()),
                quantity_changed: i64::from(stored.total_quantity),
                action: StockAction::Added,
                related_complaint: None,
                timestamp: Utc::now(),
            })?;
        }
        Ok(stored)
    }

    pub fn items(&self, actor: &Actor) -> Result<Vec<InventoryItem>, InventoryError> {
        Self::require_keeper(actor)?;
        let mut items = self.repository.list()?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    /// Consume stock, optionally tied to the complaint being worked on.
    pub fn use_stock(
        &self,
        actor: &Actor,
        id: &ItemId,
        quantity: u32,
        complaint: Option<ComplaintId>,
    ) -> Result<InventoryItem, InventoryError> {
        Self::require_keeper(actor)?;
        if quantity == 0 {
            return Err(InventoryError::Validation(
                "Quantity must be positive".to_string(),
            ));
        }

        let mut item = self.load(id)?;
        if item.available_quantity < quantity {
            return Err(InventoryError::InsufficientStock);
        }

        item.available_quantity -= quantity;
        self.repository.update(item.clone())?;
        self.repository.append_log(InventoryLog {
            item: item.id.clone(),
            user: Some(actor.member().clone()),
            quantity_changed: -i64::from(quantity),
            action: StockAction::Used,
            related_complaint: complaint,
            timestamp: Utc::now(),
        })?;
        Ok(item)
    }

    /// Raise both totals by a restock delivery.
    pub fn add_stock(
        &self,
        actor: &Actor,
        id: &ItemId,
        quantity: u32,
    ) -> Result<InventoryItem, InventoryError> {
        Self::require_keeper(actor)?;
        if quantity == 0 {
            return Err(InventoryError::Validation(
                "Quantity must be positive".to_string(),
            ));
        }

        let mut item = self.load(id)?;
        item.total_quantity += quantity;
        item.available_quantity += quantity;
        self.repository.update(item.clone())?;
        self.repository.append_log(InventoryLog {
            item: item.id.clone(),
            user: Some(actor.member().clone()),
            quantity_changed: i64::from(quantity),
            action: StockAction::Added,
            related_complaint: None,
            timestamp: Utc::now(),
        })?;
        Ok(item)
    }

    /// Write off damaged or lost stock; reduces both totals.
    pub fn remove_stock(
        &self,
        actor: &Actor,
        id: &ItemId,
        quantity: u32,
    ) -> Result<InventoryItem, InventoryError> {
        Self::require_keeper(actor)?;
        if quantity == 0 {
            return Err(InventoryError::Validation(
                "Quantity must be positive".to_string(),
            ));
        }

        let mut item = self.load(id)?;
        if item.available_quantity < quantity {
            return Err(InventoryError::InsufficientStock);
        }

        item.available_quantity -= quantity;
        item.total_quantity = item.total_quantity.saturating_sub(quantity);
        self.repository.update(item.clone())?;
        self.repository.append_log(InventoryLog {
            item: item.id.clone(),
            user: Some(actor.member().clone()),
            quantity_changed: -i64::from(quantity),
            action: StockAction::Removed,
            related_complaint: None,
            timestamp: Utc::now(),
        })?;
        Ok(item)
    }

    /// Movement trail for one item, newest first.
    pub fn movements(&self, actor: &Actor, id: &ItemId) -> Result<Vec<InventoryLog>, InventoryError> {
        Self::require_keeper(actor)?;
        self.load(id)?;
        let mut logs = self.repository.logs_for(id)?;
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::actor::{MemberId, MemberRef};
    use crate::inventory::domain::ItemCategory;

    struct InMemoryInventory {
        items: Mutex<HashMap<ItemId, InventoryItem>>,
        logs: Mutex<Vec<InventoryLog>>,
    }

    impl InMemoryInventory {
        fn new() -> Self {
            Self {
                items: Mutex::new(HashMap::new()),
                logs: Mutex::new(Vec::new()),
            }
        }
    }

    impl InventoryRepository for InMemoryInventory {
        fn insert(&self, item: InventoryItem) -> Result<InventoryItem, RepositoryError> {
            self.items
                .lock()
                .expect("items lock")
                .insert(item.id.clone(), item.clone());
            Ok(item)
        }

        fn update(&self, item: InventoryItem) -> Result<(), RepositoryError> {
            let mut items = self.items.lock().expect("items lock");
            if !items.contains_key(&item.id) {
                return Err(RepositoryError::NotFound);
            }
            items.insert(item.id.clone(), item);
            Ok(())
        }

        fn fetch(&self, id: &ItemId) -> Result<Option<InventoryItem>, RepositoryError> {
            Ok(self.items.lock().expect("items lock").get(id).cloned())
        }

        fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
            Ok(self
                .items
                .lock()
                .expect("items lock")
                .values()
                .cloned()
                .collect())
        }

        fn append_log(&self, log: InventoryLog) -> Result<(), RepositoryError> {
            self.logs.lock().expect("logs lock").push(log);
            Ok(())
        }

        fn logs_for(&self, id: &ItemId) -> Result<Vec<InventoryLog>, RepositoryError> {
            let logs = self.logs.lock().expect("logs lock");
            Ok(logs.iter().filter(|log| &log.item == id).cloned().collect())
        }
    }

    fn staff() -> Actor {
        Actor::Staff(MemberRef {
            id: MemberId("stf-1".to_string()),
            full_name: "Ravi Kumar".to_string(),
        })
    }

    fn admin() -> Actor {
        Actor::Admin(MemberRef {
            id: MemberId("adm-1".to_string()),
            full_name: "Warden Rao".to_string(),
        })
    }

    fn service() -> InventoryService<InMemoryInventory> {
        InventoryService::new(Arc::new(InMemoryInventory::new()))
    }

    fn seeded(service: &InventoryService<InMemoryInventory>, quantity: u32) -> InventoryItem {
        service
            .create_item(
                &admin(),
                NewItem {
                    name: "PVC pipe".to_string(),
                    category: ItemCategory::Plumbing,
                    total_quantity: quantity,
                    unit: "meters".to_string(),
                },
            )
            .expect("item created")
    }

    #[test]
    fn usage_reduces_available_but_not_total() {
        let service = service();
        let item = seeded(&service, 10);

        let updated = service
            .use_stock(
                &staff(),
                &item.id,
                4,
                Some(ComplaintId("cmp-000001".to_string())),
            )
            .expect("stock used");
        assert_eq!(updated.available_quantity, 6);
        assert_eq!(updated.total_quantity, 10);

        let logs = service.movements(&staff(), &item.id).expect("trail");
        assert_eq!(logs[0].action, StockAction::Used);
        assert_eq!(logs[0].quantity_changed, -4);
        assert_eq!(
            logs[0].related_complaint,
            Some(ComplaintId("cmp-000001".to_string()))
        );
    }

    #[test]
    fn usage_never_overdraws() {
        let service = service();
        let item = seeded(&service, 3);

        match service.use_stock(&staff(), &item.id, 5, None) {
            Err(InventoryError::InsufficientStock) => {}
            other => panic!("expected insufficient stock, got {other:?}"),
        }
        match service.use_stock(&staff(), &item.id, 0, None) {
            Err(InventoryError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }

        let stored = service.load(&item.id).expect("exists");
        assert_eq!(stored.available_quantity, 3);
    }

    #[test]
    fn restock_raises_both_totals_and_logs() {
        let service = service();
        let item = seeded(&service, 3);

        let updated = service
            .add_stock(&admin(), &item.id, 7)
            .expect("stock added");
        assert_eq!(updated.total_quantity, 10);
        assert_eq!(updated.available_quantity, 10);

        let logs = service.movements(&admin(), &item.id).expect("trail");
        // Seed entry plus the restock.
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|log| log.action == StockAction::Added));
    }

    #[test]
    fn write_off_reduces_both_totals() {
        let service = service();
        let item = seeded(&service, 10);

        let updated = service
            .remove_stock(&admin(), &item.id, 2)
            .expect("stock removed");
        assert_eq!(updated.total_quantity, 8);
        assert_eq!(updated.available_quantity, 8);

        let logs = service.movements(&admin(), &item.id).expect("trail");
        assert_eq!(logs[0].action, StockAction::Removed);
        assert_eq!(logs[0].quantity_changed, -2);
    }

    #[test]
    fn students_cannot_touch_inventory() {
        let service = service();
        let item = seeded(&service, 5);
        let student = Actor::Student(MemberRef {
            id: MemberId("stu-1".to_string()),
            full_name: "Anita Sharma".to_string(),
        });

        match service.use_stock(&student, &item.id, 1, None) {
            Err(InventoryError::Permission(_)) => {}
            other => panic!("expected permission error, got {other:?}"),
        }
    }
}
