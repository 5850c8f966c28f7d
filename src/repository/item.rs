use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::ItemStore;
use crate::database::Database;
use crate::error::Result;
use crate::models::{Item, ItemPatch, NewItem};

/// Repository for item database operations
#[derive(Clone)]
pub struct ItemRepository {
    db: Database,
}

impl ItemRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn find_all(&self) -> Result<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, title, description, created_at, updated_at
            FROM items
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        debug!(count = items.len(), "Fetched items");
        Ok(items)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, title, description, created_at, updated_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(item)
    }

    async fn create(&self, item: &NewItem) -> Result<Item> {
        let created = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .fetch_one(self.db.pool())
        .await?;

        debug!(id = %created.id, "Inserted item row");
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &ItemPatch) -> Result<Option<Item>> {
        let updated = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET title = COALESCE($2, title),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, title, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .fetch_optional(self.db.pool())
        .await?;

        if let Some(item) = &updated {
            debug!(id = %item.id, "Updated item row");
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            debug!(id = %id, "Deleted item row");
        }
        Ok(deleted)
    }

    async fn health_check(&self) -> Result<()> {
        self.db.health_check().await.map(|_| ())
    }
}
