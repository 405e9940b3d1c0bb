use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Account, CreateAccountDto, UpdateAccountDto, ACCOUNTS};
use crate::errors::AppError;
use crate::query::{fetch_paginated, FilterValue, ListQuery, Paginated, Predicate, QuerySettings};

const ACCOUNT_RETURNING: &str =
    "id, name, account_type, balance, color_hex, currency, created_at, updated_at";

/// Service layer for account business logic.
pub struct AccountService;

impl AccountService {
    /// List a page of the user's accounts.
    pub async fn list_accounts(
        pool: &PgPool,
        settings: &QuerySettings,
        owner_id: Uuid,
        query: &ListQuery,
    ) -> Result<Paginated<Account>, AppError> {
        let scope = Predicate::eq("a.owner_id", FilterValue::Uuid(owner_id));
        fetch_paginated(pool, &ACCOUNTS, settings, query, scope).await
    }

    /// Get an account by ID, ensuring the requesting user owns it.
    pub async fn get_account_by_id(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Account, AppError> {
        sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_RETURNING} FROM accounts WHERE id = $1 AND owner_id = $2"
        ))
        .bind(account_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
    }

    /// Create a new account.
    pub async fn create_account(
        pool: &PgPool,
        owner_id: Uuid,
        dto: &CreateAccountDto,
    ) -> Result<Account, AppError> {
        let name = dto.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Name cannot be empty".to_string(),
            ));
        }

        sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (owner_id, name, account_type, balance, color_hex, currency)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ACCOUNT_RETURNING}
            "#
        ))
        .bind(owner_id)
        .bind(&name)
        .bind(dto.account_type.as_str())
        .bind(dto.balance)
        .bind(&dto.color_hex)
        .bind(dto.currency.to_uppercase())
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Update an account (partial update - PATCH semantics).
    pub async fn update_account(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
        dto: &UpdateAccountDto,
    ) -> Result<Account, AppError> {
        let current = Self::get_account_by_id(pool, account_id, owner_id).await?;

        let new_name = match &dto.name {
            Some(n) => {
                let trimmed = n.trim().to_string();
                if trimmed.is_empty() {
                    return Err(AppError::ValidationError(
                        "Name cannot be empty".to_string(),
                    ));
                }
                trimmed
            }
            None => current.name,
        };

        let new_type = dto
            .account_type
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or(&current.account_type);
        let new_color = dto.color_hex.as_ref().unwrap_or(&current.color_hex);
        let new_currency = dto
            .currency
            .as_ref()
            .map(|c| c.to_uppercase())
            .unwrap_or(current.currency);

        sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts SET
                name = $3,
                account_type = $4,
                color_hex = $5,
                currency = $6,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {ACCOUNT_RETURNING}
            "#
        ))
        .bind(account_id)
        .bind(owner_id)
        .bind(&new_name)
        .bind(new_type)
        .bind(new_color)
        .bind(&new_currency)
        .fetch_one(pool)
        .await
        .map_err(AppError::from)
    }

    /// Delete an account. Its transactions keep existing without an account.
    pub async fn delete_account(
        pool: &PgPool,
        account_id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND owner_id = $2")
            .bind(account_id)
            .bind(owner_id)
            .execute(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }

        Ok(())
    }
}
