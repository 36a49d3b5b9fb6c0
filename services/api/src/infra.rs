use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use stayease::actor::MemberId;
use stayease::broadcasts::{Broadcast, BroadcastId, BroadcastRepository};
use stayease::complaints::{
    Complaint, ComplaintId, ComplaintLog, ComplaintRating, ComplaintRepository,
};
use stayease::directory::{DirectoryRepository, Member};
use stayease::inventory::{InventoryItem, InventoryLog, InventoryRepository, ItemId};
use stayease::maintenance::{
    MaintenanceLog, MaintenanceLogId, MaintenanceRepository, MaintenanceTask, TaskId,
};
use stayease::notify::{Notification, NotificationQueue, NotifyError};
use stayease::store::RepositoryError;
use stayease::support::{SupportMessage, SupportRepository, SupportTicket, TicketId};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryComplaintRepository {
    complaints: Mutex<HashMap<ComplaintId, Complaint>>,
    logs: Mutex<Vec<ComplaintLog>>,
    ratings: Mutex<HashMap<ComplaintId, ComplaintRating>>,
}

impl ComplaintRepository for InMemoryComplaintRepository {
    fn insert(&self, complaint: Complaint) -> Result<Complaint, RepositoryError> {
        let mut guard = self.complaints.lock().expect("complaint mutex poisoned");
        if guard.contains_key(&complaint.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(complaint.id.clone(), complaint.clone());
        Ok(complaint)
    }

    fn update(&self, complaint: Complaint) -> Result<(), RepositoryError> {
        let mut guard = self.complaints.lock().expect("complaint mutex poisoned");
        if guard.contains_key(&complaint.id) {
            guard.insert(complaint.id.clone(), complaint);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ComplaintId) -> Result<Option<Complaint>, RepositoryError> {
        let guard = self.complaints.lock().expect("complaint mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Complaint>, RepositoryError> {
        let guard = self.complaints.lock().expect("complaint mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn append_log(&self, log: ComplaintLog) -> Result<(), RepositoryError> {
        self.logs.lock().expect("log mutex poisoned").push(log);
        Ok(())
    }

    fn logs_for(&self, id: &ComplaintId) -> Result<Vec<ComplaintLog>, RepositoryError> {
        let guard = self.logs.lock().expect("log mutex poisoned");
        Ok(guard
            .iter()
            .filter(|log| &log.complaint == id)
            .cloned()
            .collect())
    }

    fn insert_rating(&self, rating: ComplaintRating) -> Result<(), RepositoryError> {
        let mut guard = self.ratings.lock().expect("rating mutex poisoned");
        if guard.contains_key(&rating.complaint) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(rating.complaint.clone(), rating);
        Ok(())
    }

    fn rating_for(&self, id: &ComplaintId) -> Result<Option<ComplaintRating>, RepositoryError> {
        let guard = self.ratings.lock().expect("rating mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn ratings(&self) -> Result<Vec<ComplaintRating>, RepositoryError> {
        let guard = self.ratings.lock().expect("rating mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryDirectoryRepository {
    members: Mutex<HashMap<MemberId, Member>>,
}

impl DirectoryRepository for InMemoryDirectoryRepository {
    fn insert(&self, member: Member) -> Result<Member, RepositoryError> {
        let mut guard = self.members.lock().expect("member mutex poisoned");
        let duplicate = guard
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&member.email));
        if duplicate || guard.contains_key(&member.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(member.id.clone(), member.clone());
        Ok(member)
    }

    fn update(&self, member: Member) -> Result<(), RepositoryError> {
        let mut guard = self.members.lock().expect("member mutex poisoned");
        if guard.contains_key(&member.id) {
            guard.insert(member.id.clone(), member);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &MemberId) -> Result<Option<Member>, RepositoryError> {
        let guard = self.members.lock().expect("member mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_email(&self, email: &str) -> Result<Option<Member>, RepositoryError> {
        let guard = self.members.lock().expect("member mutex poisoned");
        Ok(guard
            .values()
            .find(|member| member.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn list(&self) -> Result<Vec<Member>, RepositoryError> {
        let guard = self.members.lock().expect("member mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn remove(&self, id: &MemberId) -> Result<(), RepositoryError> {
        let mut guard = self.members.lock().expect("member mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub(crate) struct InMemorySupportRepository {
    tickets: Mutex<HashMap<TicketId, SupportTicket>>,
    messages: Mutex<Vec<SupportMessage>>,
}

impl SupportRepository for InMemorySupportRepository {
    fn insert(&self, ticket: SupportTicket) -> Result<SupportTicket, RepositoryError> {
        let mut guard = self.tickets.lock().expect("ticket mutex poisoned");
        if guard.contains_key(&ticket.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(ticket.id.clone(), ticket.clone());
        Ok(ticket)
    }

    fn update(&self, ticket: SupportTicket) -> Result<(), RepositoryError> {
        let mut guard = self.tickets.lock().expect("ticket mutex poisoned");
        if guard.contains_key(&ticket.id) {
            guard.insert(ticket.id.clone(), ticket);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &TicketId) -> Result<Option<SupportTicket>, RepositoryError> {
        let guard = self.tickets.lock().expect("ticket mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<SupportTicket>, RepositoryError> {
        let guard = self.tickets.lock().expect("ticket mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn append_message(&self, message: SupportMessage) -> Result<(), RepositoryError> {
        self.messages
            .lock()
            .expect("message mutex poisoned")
            .push(message);
        Ok(())
    }

    fn messages_for(&self, id: &TicketId) -> Result<Vec<SupportMessage>, RepositoryError> {
        let guard = self.messages.lock().expect("message mutex poisoned");
        Ok(guard
            .iter()
            .filter(|message| &message.ticket == id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryMaintenanceRepository {
    tasks: Mutex<HashMap<TaskId, MaintenanceTask>>,
    logs: Mutex<HashMap<MaintenanceLogId, MaintenanceLog>>,
}

impl MaintenanceRepository for InMemoryMaintenanceRepository {
    fn insert_task(&self, task: MaintenanceTask) -> Result<MaintenanceTask, RepositoryError> {
        let mut guard = self.tasks.lock().expect("task mutex poisoned");
        if guard.contains_key(&task.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn update_task(&self, task: MaintenanceTask) -> Result<(), RepositoryError> {
        let mut guard = self.tasks.lock().expect("task mutex poisoned");
        if guard.contains_key(&task.id) {
            guard.insert(task.id.clone(), task);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_task(&self, id: &TaskId) -> Result<Option<MaintenanceTask>, RepositoryError> {
        let guard = self.tasks.lock().expect("task mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn tasks(&self) -> Result<Vec<MaintenanceTask>, RepositoryError> {
        let guard = self.tasks.lock().expect("task mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn insert_log(&self, log: MaintenanceLog) -> Result<MaintenanceLog, RepositoryError> {
        let mut guard = self.logs.lock().expect("log mutex poisoned");
        if guard.contains_key(&log.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(log.id.clone(), log.clone());
        Ok(log)
    }

    fn update_log(&self, log: MaintenanceLog) -> Result<(), RepositoryError> {
        let mut guard = self.logs.lock().expect("log mutex poisoned");
        if guard.contains_key(&log.id) {
            guard.insert(log.id.clone(), log);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_log(&self, id: &MaintenanceLogId) -> Result<Option<MaintenanceLog>, RepositoryError> {
        let guard = self.logs.lock().expect("log mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn logs(&self) -> Result<Vec<MaintenanceLog>, RepositoryError> {
        let guard = self.logs.lock().expect("log mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryInventoryRepository {
    items: Mutex<HashMap<ItemId, InventoryItem>>,
    logs: Mutex<Vec<InventoryLog>>,
}

impl InventoryRepository for InMemoryInventoryRepository {
    fn insert(&self, item: InventoryItem) -> Result<InventoryItem, RepositoryError> {
        let mut guard = self.items.lock().expect("item mutex poisoned");
        if guard.contains_key(&item.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    fn update(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let mut guard = self.items.lock().expect("item mutex poisoned");
        if guard.contains_key(&item.id) {
            guard.insert(item.id.clone(), item);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ItemId) -> Result<Option<InventoryItem>, RepositoryError> {
        let guard = self.items.lock().expect("item mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        let guard = self.items.lock().expect("item mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn append_log(&self, log: InventoryLog) -> Result<(), RepositoryError> {
        self.logs.lock().expect("log mutex poisoned").push(log);
        Ok(())
    }

    fn logs_for(&self, id: &ItemId) -> Result<Vec<InventoryLog>, RepositoryError> {
        let guard = self.logs.lock().expect("log mutex poisoned");
        Ok(guard
            .iter()
            .filter(|log| &log.item == id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryBroadcastRepository {
    broadcasts: Mutex<HashMap<BroadcastId, Broadcast>>,
}

impl BroadcastRepository for InMemoryBroadcastRepository {
    fn insert(&self, broadcast: Broadcast) -> Result<Broadcast, RepositoryError> {
        let mut guard = self.broadcasts.lock().expect("broadcast mutex poisoned");
        if guard.contains_key(&broadcast.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(broadcast.id.clone(), broadcast.clone());
        Ok(broadcast)
    }

    fn update(&self, broadcast: Broadcast) -> Result<(), RepositoryError> {
        let mut guard = self.broadcasts.lock().expect("broadcast mutex poisoned");
        if guard.contains_key(&broadcast.id) {
            guard.insert(broadcast.id.clone(), broadcast);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &BroadcastId) -> Result<Option<Broadcast>, RepositoryError> {
        let guard = self.broadcasts.lock().expect("broadcast mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<Broadcast>, RepositoryError> {
        let guard = self.broadcasts.lock().expect("broadcast mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

/// Stand-in delivery adapter: records the handoff in the service log instead
/// of talking to a mail relay.
#[derive(Default)]
pub(crate) struct LoggingNotificationQueue;

impl NotificationQueue for LoggingNotificationQueue {
    fn enqueue(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            template = %notification.template,
            recipient = %notification.recipient,
            subject = %notification.subject,
            "notification queued"
        );
        Ok(())
    }
}
