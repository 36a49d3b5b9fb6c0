use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{Broadcast, BroadcastId, NewBroadcast};
use super::repository::BroadcastRepository;
use crate::actor::Actor;
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Permission(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

static BROADCAST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_broadcast_id() -> BroadcastId {
    let id = BROADCAST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BroadcastId(format!("brd-{id:06}"))
}

/// Hostel-wide announcements. Deactivation hides an entry from the active
/// feed without deleting its history.
pub struct BroadcastService<R> {
    repository: Arc<R>,
}

impl<R> BroadcastService<R>
where
    R: BroadcastRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(&self, actor: &Actor, input: NewBroadcast) -> Result<Broadcast, BroadcastError> {
        if actor.as_staff().is_none() && actor.as_admin().is_none() {
            return Err(BroadcastError::Permission(
                "only staff and admins can publish broadcasts".to_string(),
            ));
        }
        if input.title.trim().is_empty() || input.message.trim().is_empty() {
            return Err(BroadcastError::Validation(
                "title and message are required".to_string(),
            ));
        }

        let broadcast = Broadcast {
            id: next_broadcast_id(),
            title: input.title,
            message: input.message,
            category: input.category,
            expected_resolution_time: input.expected_resolution_time,
            active: true,
            created_by: Some(actor.member().clone()),
            created_at: Utc::now(),
        };
        Ok(self.repository.insert(broadcast)?)
    }

    /// Every announcement, newest first.
    pub fn all(&self) -> Result<Vec<Broadcast>, BroadcastError> {
        let mut broadcasts = self.repository.list()?;
        broadcasts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(broadcasts)
    }

    /// Only the currently active announcements, newest first.
    pub fn active(&self) -> Result<Vec<Broadcast>, BroadcastError> {
        let mut broadcasts: Vec<Broadcast> = self
            .repository
            .list()?
            .into_iter()
            .filter(|broadcast| broadcast.active)
            .collect();
        broadcasts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(broadcasts)
    }

    pub fn deactivate(&self, actor: &Actor, id: &BroadcastId) -> Result<Broadcast, BroadcastError> {
        if actor.as_staff().is_none() && actor.as_admin().is_none() {
            return Err(BroadcastError::Permission(
                "only staff and admins can retire broadcasts".to_string(),
            ));
        }

        let mut broadcast = self
            .repository
            .fetch(id)?
            .ok_or(BroadcastError::Repository(RepositoryError::NotFound))?;
        broadcast.active = false;
        self.repository.update(broadcast.clone())?;
        Ok(broadcast)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::actor::{MemberId, MemberRef};
    use crate::complaints::domain::ComplaintCategory;

    struct InMemoryBroadcasts {
        broadcasts: Mutex<HashMap<BroadcastId, Broadcast>>,
    }

    impl InMemoryBroadcasts {
        fn new() -> Self {
            Self {
                broadcasts: Mutex::new(HashMap::new()),
            }
        }
    }

    impl BroadcastRepository for InMemoryBroadcasts {
        fn insert(&self, broadcast: Broadcast) -> Result<Broadcast, RepositoryError> {
            self.broadcasts
                .lock()
                .expect("broadcasts lock")
                .insert(broadcast.id.clone(), broadcast.clone());
            Ok(broadcast)
        }

        fn update(&self, broadcast: Broadcast) -> Result<(), RepositoryError> {
            let mut broadcasts = self.broadcasts.lock().expect("broadcasts lock");
            if !broadcasts.contains_key(&broadcast.id) {
                return Err(RepositoryError::NotFound);
            }
            broadcasts.insert(broadcast.id.clone(), broadcast);
            Ok(())
        }

        fn fetch(&self, id: &BroadcastId) -> Result<Option<Broadcast>, RepositoryError> {
            Ok(self
                .broadcasts
                .lock()
                .expect("broadcasts lock")
                .get(id)
                .cloned())
        }

        fn list(&self) -> Result<Vec<Broadcast>, RepositoryError> {
            Ok(self
                .broadcasts
                .lock()
                .expect("broadcasts lock")
                .values()
                .cloned()
                .collect())
        }
    }

    fn staff() -> Actor {
        Actor::Staff(MemberRef {
            id: MemberId("stf-1".to_string()),
            full_name: "Ravi Kumar".to_string(),
        })
    }

    fn student() -> Actor {
        Actor::Student(MemberRef {
            id: MemberId("stu-1".to_string()),
            full_name: "Anita Sharma".to_string(),
        })
    }

    fn service() -> BroadcastService<InMemoryBroadcasts> {
        BroadcastService::new(Arc::new(InMemoryBroadcasts::new()))
    }

    fn announcement(service: &BroadcastService<InMemoryBroadcasts>) -> Broadcast {
        service
            .create(
                &staff(),
                NewBroadcast {
                    title: "Water outage".to_string(),
                    message: "Tank cleaning until 5 PM".to_string(),
                    category: ComplaintCategory::Water,
                    expected_resolution_time: Some("Today 5 PM".to_string()),
                },
            )
            .expect("broadcast created")
    }

    #[test]
    fn students_cannot_publish() {
        let service = service();
        match service.create(
            &student(),
            NewBroadcast {
                title: "x".to_string(),
                message: "y".to_string(),
                category: ComplaintCategory::Other,
                expected_resolution_time: None,
            },
        ) {
            Err(BroadcastError::Permission(_)) => {}
            other => panic!("expected permission error, got {other:?}"),
        }
    }

    #[test]
    fn active_feed_excludes_deactivated_entries() {
        let service = service();
        let keep = announcement(&service);
        let retire = announcement(&service);

        service
            .deactivate(&staff(), &retire.id)
            .expect("deactivated");

        let active = service.active().expect("active feed");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);

        // The full listing still carries both.
        assert_eq!(service.all().expect("full feed").len(), 2);
    }
}
