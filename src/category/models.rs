use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::query::{ColumnDescriptor, Columns, FieldType, Table};

/// Filterable and sortable category fields
pub static CATEGORY_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("id", "c.id::text", FieldType::String),
    ColumnDescriptor::new("title", "c.title", FieldType::String),
    ColumnDescriptor::new("color", "c.color", FieldType::String),
    ColumnDescriptor::new("isIncome", "c.is_income", FieldType::Boolean),
    ColumnDescriptor::new("createdAt", "c.created_at", FieldType::Date),
    ColumnDescriptor::new("updatedAt", "c.updated_at", FieldType::Date),
];

pub const CATEGORIES: Table = Table {
    name: "categories",
    from: "categories c",
    select: "c.id, c.title, c.color, c.is_income, c.created_at, c.updated_at",
    columns: Columns::new(CATEGORY_COLUMNS),
    default_order: "c.title ASC",
    search: Some("c.title"),
};

/// Validate hex color format (#RRGGBB)
pub(crate) fn validate_color_hex(color: &str) -> Result<(), ValidationError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_color"))
    }
}

fn default_color() -> String {
    "#64748b".to_string()
}

/// Database entity for categories
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub color: String,
    pub is_income: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    #[schema(example = "Groceries")]
    pub title: String,
    #[schema(example = "#4CAF50")]
    pub color: String,
    /// Whether transactions in this category are income
    pub is_income: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(cat: Category) -> Self {
        Self {
            id: cat.id,
            title: cat.title,
            color: cat.color,
            is_income: cat.is_income,
            created_at: cat.created_at,
            updated_at: cat.updated_at,
        }
    }
}

/// Request body for creating a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryDto {
    /// Category title (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Title must be 1-50 characters"))]
    #[schema(example = "Groceries")]
    pub title: String,

    /// Display color (defaults to #64748b)
    #[validate(custom(
        function = "validate_color_hex",
        message = "Color must be in #RRGGBB format"
    ))]
    #[serde(default = "default_color")]
    #[schema(example = "#4CAF50")]
    pub color: String,

    #[serde(default)]
    pub is_income: bool,
}

/// Request body for updating a category (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 50, message = "Title must be 1-50 characters"))]
    #[schema(example = "Food & Dining")]
    pub title: Option<String>,

    #[schema(example = "#2196F3")]
    pub color: Option<String>,

    pub is_income: Option<bool>,
}

impl UpdateCategoryDto {
    /// Validate the optional color
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        if let Some(color) = &self.color {
            validate_color_hex(color)?;
        }
        Ok(())
    }
}

/// Path parameters for category ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryIdPath {
    /// Category UUID
    pub id: Uuid,
}
