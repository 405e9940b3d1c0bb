use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::models::{CreateTagDto, Tag, UpdateTagDto, TAGS};
use crate::errors::AppError;
use crate::query::{fetch_paginated, FilterValue, ListQuery, Paginated, Predicate, QuerySettings};

pub struct TagService;

impl TagService {
    pub async fn list(
        pool: &PgPool,
        settings: &QuerySettings,
        user_id: Uuid,
        query: &ListQuery,
    ) -> Result<Paginated<Tag>, AppError> {
        let scope = Predicate::eq("g.owner_id", FilterValue::Uuid(user_id));
        fetch_paginated(pool, &TAGS, settings, query, scope).await
    }

    pub async fn get_by_id(pool: &PgPool, tag_id: Uuid, user_id: Uuid) -> Result<Tag, AppError> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, title, created_at, updated_at
            FROM tags
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(tag_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))
    }

    fn clean_title(title: &str) -> Result<String, AppError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AppError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }

    async fn title_taken(
        pool: &PgPool,
        user_id: Uuid,
        title: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tags
                WHERE owner_id = $1 AND title = $2 AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(except)
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))
    }

    pub async fn create(pool: &PgPool, dto: &CreateTagDto, user_id: Uuid) -> Result<Tag, AppError> {
        let title = Self::clean_title(&dto.title)?;
        if Self::title_taken(pool, user_id, &title, None).await? {
            return Err(AppError::Conflict("Tag already exists".to_string()));
        }

        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (owner_id, title)
            VALUES ($1, $2)
            RETURNING id, title, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&title)
        .fetch_one(pool)
        .await?;

        debug!(tag_id = %tag.id, "Tag created");
        Ok(tag)
    }

    pub async fn update(
        pool: &PgPool,
        tag_id: Uuid,
        dto: &UpdateTagDto,
        user_id: Uuid,
    ) -> Result<Tag, AppError> {
        let existing = Self::get_by_id(pool, tag_id, user_id).await?;

        let title = match &dto.title {
            Some(title) => Self::clean_title(title)?,
            None => return Ok(existing),
        };
        if title != existing.title && Self::title_taken(pool, user_id, &title, Some(tag_id)).await? {
            return Err(AppError::Conflict("Tag already exists".to_string()));
        }

        sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
            SET title = $3, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, title, created_at, updated_at
            "#,
        )
        .bind(tag_id)
        .bind(user_id)
        .bind(&title)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Delete a tag; it is detached from every transaction carrying it
    pub async fn delete(pool: &PgPool, tag_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND owner_id = $2")
            .bind(tag_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Tag not found".to_string()));
        }
        Ok(())
    }
}
