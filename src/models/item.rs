use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Maximum title length, counted in characters after trimming
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum description length, counted in characters after trimming
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Length of the hyphenated UUID form, the only form accepted in paths
const ITEM_ID_LEN: usize = 36;

/// Parse an item identifier taken from a request path.
///
/// Only the canonical hyphenated form is accepted. Anything else is a
/// malformed identifier, which is distinct from a well-formed identifier
/// that matches nothing.
pub fn parse_item_id(raw: &str) -> Result<Uuid> {
    if raw.len() != ITEM_ID_LEN {
        return Err(AppError::InvalidItemId(raw.to_string()));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidItemId(raw.to_string()))
}

/// Request to create a new item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Request to update an existing item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Validated, trimmed fields for a new item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub description: Option<String>,
}

/// Trimmed partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl CreateItemRequest {
    /// Check required fields, trim, and validate lengths
    pub fn into_new_item(self) -> Result<NewItem> {
        let title = match self.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(AppError::InvalidRequest("Title is required".to_string())),
        };

        let title = title.trim().to_string();
        let description = self.description.map(|d| d.trim().to_string());

        let errors = validate_fields(Some(&title), description.as_deref());
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(NewItem { title, description })
    }
}

impl UpdateItemRequest {
    /// Check that at least one field is present and trim it.
    ///
    /// An empty title counts as absent. Lengths are checked later by
    /// [`ItemPatch::validate`], once the target item is known to exist.
    pub fn into_patch(self) -> Result<ItemPatch> {
        let title = self.title.filter(|t| !t.is_empty());
        if title.is_none() && self.description.is_none() {
            return Err(AppError::InvalidRequest(
                "Please provide title or description".to_string(),
            ));
        }

        Ok(ItemPatch {
            title: title.map(|t| t.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
        })
    }
}

impl ItemPatch {
    /// Check field lengths of a trimmed patch
    pub fn validate(&self) -> Result<()> {
        let errors = validate_fields(self.title.as_deref(), self.description.as_deref());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    /// Apply the patch in place, bumping `updated_at`
    pub fn apply(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
        item.updated_at = Utc::now();
    }
}

/// Collect one message per violated field constraint
fn validate_fields(title: Option<&str>, description: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(title) = title {
        if title.is_empty() {
            errors.push("Please add a title".to_string());
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.push(format!(
                "Title cannot be more than {} characters",
                TITLE_MAX_CHARS
            ));
        }
    }

    if let Some(description) = description {
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push(format!(
                "Description cannot be more than {} characters",
                DESCRIPTION_MAX_CHARS
            ));
        }
    }

    errors
}
