use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Category, CreateCategoryDto, UpdateCategoryDto, CATEGORIES};
use crate::errors::AppError;
use crate::query::{fetch_paginated, FilterValue, ListQuery, Paginated, Predicate, QuerySettings};

/// Service layer for category business logic.
pub struct CategoryService;

impl CategoryService {
    pub async fn list(
        pool: &PgPool,
        settings: &QuerySettings,
        user_id: Uuid,
        query: &ListQuery,
    ) -> Result<Paginated<Category>, AppError> {
        let scope = Predicate::eq("c.owner_id", FilterValue::Uuid(user_id));
        fetch_paginated(pool, &CATEGORIES, settings, query, scope).await
    }

    /// Get category by ID with ownership check
    pub async fn get_by_id(
        pool: &PgPool,
        category_id: Uuid,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, title, color, is_income, created_at, updated_at
            FROM categories
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
    }

    /// Reject a title the user already has on another category
    async fn ensure_title_available(
        pool: &PgPool,
        user_id: Uuid,
        title: &str,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE owner_id = $1 AND title = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(except)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if taken {
            return Err(AppError::Conflict(format!(
                "Category '{title}' already exists"
            )));
        }
        Ok(())
    }

    pub async fn create(
        pool: &PgPool,
        dto: &CreateCategoryDto,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        let title = dto.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }

        Self::ensure_title_available(pool, user_id, title, None).await?;

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (owner_id, title, color, is_income)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, color, is_income, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(&dto.color)
        .bind(dto.is_income)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    pub async fn update(
        pool: &PgPool,
        category_id: Uuid,
        dto: &UpdateCategoryDto,
        user_id: Uuid,
    ) -> Result<Category, AppError> {
        let existing = Self::get_by_id(pool, category_id, user_id).await?;

        let new_title = match &dto.title {
            Some(t) => {
                let trimmed = t.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AppError::ValidationError(
                        "Title cannot be empty".to_string(),
                    ));
                }
                if trimmed != existing.title {
                    Self::ensure_title_available(pool, user_id, &trimmed, Some(category_id))
                        .await?;
                }
                trimmed
            }
            None => existing.title,
        };

        let new_color = dto.color.as_ref().unwrap_or(&existing.color);
        let new_is_income = dto.is_income.unwrap_or(existing.is_income);

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET title = $3, color = $4, is_income = $5, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, color, is_income, created_at, updated_at
            "#,
        )
        .bind(category_id)
        .bind(user_id)
        .bind(&new_title)
        .bind(new_color)
        .bind(new_is_income)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Delete a category; fails with a conflict while transactions still use it
    pub async fn delete(pool: &PgPool, category_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND owner_id = $2")
            .bind(category_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category not found".to_string()));
        }

        Ok(())
    }
}
