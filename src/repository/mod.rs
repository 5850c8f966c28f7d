//! Item persistence
//!
//! Handlers talk to an [`ItemStore`]; Postgres and in-process implementations
//! share the same contract.

pub mod item;
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Item, ItemPatch, NewItem};

pub use item::ItemRepository;
pub use memory::MemoryItemStore;

/// Typed accessor for the items collection
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items, newest first
    async fn find_all(&self) -> Result<Vec<Item>>;

    /// A single item, `None` when no item has this id
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Item>>;

    /// Insert a validated item; the store assigns id and timestamps
    async fn create(&self, item: &NewItem) -> Result<Item>;

    /// Apply a validated patch, `None` when no item has this id
    async fn update(&self, id: Uuid, patch: &ItemPatch) -> Result<Option<Item>>;

    /// Remove an item, `false` when no item has this id
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Check that the backing store can serve requests
    async fn health_check(&self) -> Result<()>;
}
