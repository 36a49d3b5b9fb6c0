//! Outbound notification seam.
//!
//! The core never sends mail itself and never waits on delivery: it hands a
//! payload to the queue and moves on. Callers that care whether the handoff
//! worked report it as an auxiliary flag, not as an operation failure.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload describing one message for the delivery adapter behind the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub recipient: String,
    pub subject: String,
    pub details: BTreeMap<String, String>,
}

impl Notification {
    /// Credentials message for a freshly created staff account.
    pub fn staff_credentials(full_name: &str, email: &str, password: &str) -> Self {
        let mut details = BTreeMap::new();
        details.insert("full_name".to_string(), full_name.to_string());
        details.insert("email".to_string(), email.to_string());
        details.insert("password".to_string(), password.to_string());

        Self {
            template: "staff_credentials".to_string(),
            recipient: email.to_string(),
            subject: "Your StayEase Staff Account".to_string(),
            details,
        }
    }
}

/// Trait describing the outbound notification hook.
pub trait NotificationQueue: Send + Sync {
    fn enqueue(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notification handoff error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
