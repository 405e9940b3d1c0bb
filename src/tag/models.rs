use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::query::{ColumnDescriptor, Columns, FieldType, Table};

pub static TAG_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("id", "g.id::text", FieldType::String),
    ColumnDescriptor::new("title", "g.title", FieldType::String),
    ColumnDescriptor::new("createdAt", "g.created_at", FieldType::Date),
    ColumnDescriptor::new("updatedAt", "g.updated_at", FieldType::Date),
];

pub const TAGS: Table = Table {
    name: "tags",
    from: "tags g",
    select: "g.id, g.title, g.created_at, g.updated_at",
    columns: Columns::new(TAG_COLUMNS),
    default_order: "g.created_at DESC",
    search: Some("g.title"),
};

#[derive(Debug, Clone, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub id: Uuid,
    #[schema(example = "vacations")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            title: tag.title,
            created_at: tag.created_at,
            updated_at: tag.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTagDto {
    #[validate(length(min = 1, max = 30, message = "Title must be 1-30 characters"))]
    #[schema(example = "vacations")]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTagDto {
    #[validate(length(min = 1, max = 30, message = "Title must be 1-30 characters"))]
    #[schema(example = "trip")]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TagIdPath {
    /// Tag UUID
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_valid() {
        assert!(TAGS.columns.validate().is_ok());
        assert_eq!(TAGS.columns.len(), 4);
    }

    #[test]
    fn test_title_length() {
        let dto = CreateTagDto {
            title: "x".repeat(31),
        };
        assert!(dto.validate().is_err());
        let dto = UpdateTagDto { title: None };
        assert!(dto.validate().is_ok());
    }
}
