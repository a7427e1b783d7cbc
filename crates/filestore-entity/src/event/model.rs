//! Audit event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::EventKind;

/// One immutable entry of the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    /// Unique event identifier (time-ordered).
    pub id: Uuid,
    /// Acting user.
    pub user_id: Uuid,
    /// Affected file.
    pub file_id: Uuid,
    /// What happened.
    pub kind: EventKind,
    /// Optional free-form detail.
    pub message: Option<String>,
    /// When the event was written.
    pub created_at: DateTime<Utc>,
}

/// An event about to be appended alongside a file mutation.
#[derive(Debug, Clone)]
pub struct NewEvent {
    /// Acting user.
    pub user_id: Uuid,
    /// What happened.
    pub kind: EventKind,
    /// Optional free-form detail.
    pub message: Option<String>,
}

impl NewEvent {
    /// Event without a message.
    pub fn new(user_id: Uuid, kind: EventKind) -> Self {
        Self {
            user_id,
            kind,
            message: None,
        }
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
