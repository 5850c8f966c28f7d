use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Item;

/// Message pushed to every WebSocket client.
///
/// Serialized with the variant name in `type`, e.g.
/// `{"type":"ACTIVE_USERS_COUNT","count":2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    ItemCreated { data: Item },
    ItemUpdated { data: Item },
    ItemDeleted { id: Uuid },
    ActiveUsersCount { count: usize },
}

impl Event {
    pub fn active_users(count: usize) -> Self {
        Event::ActiveUsersCount { count }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ItemCreated { .. } => "ITEM_CREATED",
            Event::ItemUpdated { .. } => "ITEM_UPDATED",
            Event::ItemDeleted { .. } => "ITEM_DELETED",
            Event::ActiveUsersCount { .. } => "ACTIVE_USERS_COUNT",
        }
    }

    /// Wire form of the event
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
