//! In-process item store
//!
//! Selected with `STORE_BACKEND=memory`; also backs the handler tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::ItemStore;
use crate::error::Result;
use crate::models::{Item, ItemPatch, NewItem};

#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<HashMap<Uuid, Item>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn find_all(&self) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self.items.read().values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Item>> {
        Ok(self.items.read().get(&id).cloned())
    }

    async fn create(&self, item: &NewItem) -> Result<Item> {
        let now = Utc::now();
        let created = Item {
            id: Uuid::new_v4(),
            title: item.title.clone(),
            description: item.description.clone(),
            created_at: now,
            updated_at: now,
        };

        self.items.write().insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &ItemPatch) -> Result<Option<Item>> {
        let mut items = self.items.write();
        Ok(items.get_mut(&id).map(|item| {
            patch.apply(item);
            item.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.items.write().remove(&id).is_some())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
