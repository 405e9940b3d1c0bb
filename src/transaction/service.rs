use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{
    AnalyticsRecord, CreateTransactionDto, TagSummary, Transaction, TransactionResponse,
    TransactionTagRow, TransactionType, UpdateTransactionDto, TRANSACTIONS,
    TRANSACTION_ANALYTICS,
};
use crate::analytics::{
    compute_expense_history, compute_history, compute_kpis, history_window, kpi_window,
    AmountPoint, History, HistoryPoint, KpiResult, Period, TransactionRow,
};
use crate::errors::AppError;
use crate::query::{
    fetch_all, fetch_paginated, FilterValue, ListQuery, Paginated, Predicate, QuerySettings,
};

type Tx<'a> = sqlx::Transaction<'a, Postgres>;

/// Service layer for transaction business logic.
/// All balance updates run inside the same database transaction as the row change.
pub struct TransactionService;

/// Indicates whether to apply or reverse a balance effect
#[derive(Debug, Clone, Copy)]
enum BalanceOperation {
    Apply,
    Reverse,
}

fn owner_scope(user_id: Uuid) -> Predicate {
    Predicate::eq("t.owner_id", FilterValue::Uuid(user_id))
}

impl TransactionService {
    /// Page through the user's transactions with their tags attached.
    pub async fn list_transactions(
        pool: &PgPool,
        settings: &QuerySettings,
        user_id: Uuid,
        query: &ListQuery,
    ) -> Result<Paginated<TransactionResponse>, AppError> {
        let page: Paginated<Transaction> =
            fetch_paginated(pool, &TRANSACTIONS, settings, query, owner_scope(user_id)).await?;

        let ids: Vec<Uuid> = page.data.iter().map(|t| t.id).collect();
        let mut tags = Self::load_tags(pool, &ids).await?;

        Ok(page.map(|t| {
            let attached = tags.remove(&t.id).unwrap_or_default();
            TransactionResponse::new(t, attached)
        }))
    }

    /// Tags for a set of transactions, keyed by transaction id
    async fn load_tags(
        pool: &PgPool,
        transaction_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagSummary>>, AppError> {
        if transaction_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, TransactionTagRow>(
            r#"
            SELECT tt.transaction_id, g.id, g.title
            FROM transaction_tags tt
            JOIN tags g ON g.id = tt.tag_id
            WHERE tt.transaction_id = ANY($1)
            ORDER BY g.title ASC
            "#,
        )
        .bind(transaction_ids)
        .fetch_all(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let mut grouped: HashMap<Uuid, Vec<TagSummary>> = HashMap::new();
        for row in rows {
            grouped.entry(row.transaction_id).or_default().push(TagSummary {
                id: row.id,
                title: row.title,
            });
        }
        Ok(grouped)
    }

    /// Get a single transaction by ID
    pub async fn get_transaction(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<TransactionResponse, AppError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM {} WHERE t.id = $1 AND t.owner_id = $2",
            TRANSACTIONS.select, TRANSACTIONS.from
        ))
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))?;

        let mut tags = Self::load_tags(pool, &[transaction_id]).await?;
        let attached = tags.remove(&transaction_id).unwrap_or_default();
        Ok(TransactionResponse::new(transaction, attached))
    }

    async fn ensure_category(tx: &mut Tx<'_>, category_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let valid = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND owner_id = $2)",
        )
        .bind(category_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if !valid {
            return Err(AppError::NotFound(
                "Category not found or access denied".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_account(tx: &mut Tx<'_>, account_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let valid = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = $1 AND owner_id = $2)",
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        if !valid {
            return Err(AppError::NotFound(
                "Account not found or access denied".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace every tag on a transaction. All tags must belong to the user.
    async fn replace_tags(
        tx: &mut Tx<'_>,
        transaction_id: Uuid,
        tag_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut unique = tag_ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        if !unique.is_empty() {
            let owned = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM tags WHERE id = ANY($1) AND owner_id = $2",
            )
            .bind(&unique)
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

            if owned != unique.len() as i64 {
                return Err(AppError::NotFound(
                    "One or more tags not found or access denied".to_string(),
                ));
            }
        }

        sqlx::query("DELETE FROM transaction_tags WHERE transaction_id = $1")
            .bind(transaction_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        if !unique.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO transaction_tags (transaction_id, tag_id)
                SELECT $1, UNNEST($2::uuid[])
                "#,
            )
            .bind(transaction_id)
            .bind(&unique)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        }

        Ok(())
    }

    /// Create a transaction with atomic balance update.
    pub async fn create_transaction(
        pool: &PgPool,
        user_id: Uuid,
        dto: CreateTransactionDto,
    ) -> Result<TransactionResponse, AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Self::ensure_category(&mut tx, dto.category_id, user_id).await?;
        if let Some(account_id) = dto.account_id {
            Self::ensure_account(&mut tx, account_id, user_id).await?;
        }

        let transaction_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO transactions
                (owner_id, category_id, account_id, amount, transaction_date, description,
                 transaction_type, method)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(dto.category_id)
        .bind(dto.account_id)
        .bind(dto.amount)
        .bind(dto.date)
        .bind(&dto.description)
        .bind(dto.transaction_type.as_str())
        .bind(dto.method.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        Self::replace_tags(&mut tx, transaction_id, &dto.tag_ids, user_id).await?;

        if let Some(account_id) = dto.account_id {
            Self::lock_account(&mut tx, account_id).await?;
            Self::update_account_balance(
                &mut tx,
                account_id,
                dto.amount,
                dto.transaction_type,
                BalanceOperation::Apply,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(%transaction_id, "Transaction created");
        Self::get_transaction(pool, user_id, transaction_id).await
    }

    /// Fetch and lock the transaction row inside `tx`
    async fn lock_transaction(
        tx: &mut Tx<'_>,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Transaction, AppError> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM {} WHERE t.id = $1 AND t.owner_id = $2 FOR UPDATE OF t",
            TRANSACTIONS.select, TRANSACTIONS.from
        ))
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Transaction not found".to_string()))
    }

    async fn lock_account(tx: &mut Tx<'_>, account_id: Uuid) -> Result<(), AppError> {
        sqlx::query("SELECT 1 FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        Ok(())
    }

    /// Delete a transaction with atomic balance restoration.
    pub async fn delete_transaction(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let transaction = Self::lock_transaction(&mut tx, user_id, transaction_id).await?;

        if let Some(account_id) = transaction.account_id {
            Self::lock_account(&mut tx, account_id).await?;
            Self::update_account_balance(
                &mut tx,
                account_id,
                transaction.amount,
                transaction.get_type(),
                BalanceOperation::Reverse,
            )
            .await?;
        }

        sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        info!(%transaction_id, "Transaction deleted");
        Ok(())
    }

    /// Update a transaction with atomic balance adjustments.
    /// Amount, type and account changes all reverse the old effect and apply the new one.
    pub async fn update_transaction(
        pool: &PgPool,
        user_id: Uuid,
        transaction_id: Uuid,
        dto: UpdateTransactionDto,
    ) -> Result<TransactionResponse, AppError> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        let old = Self::lock_transaction(&mut tx, user_id, transaction_id).await?;

        let new_category_id = match dto.category_id {
            Some(id) => {
                Self::ensure_category(&mut tx, id, user_id).await?;
                id
            }
            None => old.category_id,
        };

        let new_account_id = match dto.account_id {
            Some(Some(id)) => {
                Self::ensure_account(&mut tx, id, user_id).await?;
                Some(id)
            }
            Some(None) => None,
            None => old.account_id,
        };

        let new_amount = dto.amount.unwrap_or(old.amount);
        let new_type = dto.transaction_type.unwrap_or(old.get_type());
        let new_method = dto
            .method
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| old.method.clone());
        let new_date = dto.date.unwrap_or(old.transaction_date);
        let new_description = dto.description.or_else(|| old.description.clone());

        Self::rebalance(&mut tx, &old, new_account_id, new_amount, new_type).await?;

        sqlx::query(
            r#"
            UPDATE transactions SET
                category_id = $2,
                account_id = $3,
                amount = $4,
                transaction_date = $5,
                description = $6,
                transaction_type = $7,
                method = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(transaction_id)
        .bind(new_category_id)
        .bind(new_account_id)
        .bind(new_amount)
        .bind(new_date)
        .bind(&new_description)
        .bind(new_type.as_str())
        .bind(&new_method)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        if let Some(tag_ids) = &dto.tag_ids {
            Self::replace_tags(&mut tx, transaction_id, tag_ids, user_id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Self::get_transaction(pool, user_id, transaction_id).await
    }

    /// Move the balance effect of `old` to its new account, amount and type
    async fn rebalance(
        tx: &mut Tx<'_>,
        old: &Transaction,
        new_account_id: Option<Uuid>,
        new_amount: i64,
        new_type: TransactionType,
    ) -> Result<(), AppError> {
        let old_type = old.get_type();

        if old.account_id == new_account_id {
            if let Some(account_id) = new_account_id {
                Self::lock_account(tx, account_id).await?;
                let net_change =
                    new_type.balance_effect(new_amount) - old_type.balance_effect(old.amount);
                Self::adjust_balance(tx, account_id, net_change).await?;
            }
            return Ok(());
        }

        if let Some(old_account) = old.account_id {
            Self::lock_account(tx, old_account).await?;
            Self::update_account_balance(
                tx,
                old_account,
                old.amount,
                old_type,
                BalanceOperation::Reverse,
            )
            .await?;
        }

        if let Some(new_account) = new_account_id {
            Self::lock_account(tx, new_account).await?;
            Self::update_account_balance(
                tx,
                new_account,
                new_amount,
                new_type,
                BalanceOperation::Apply,
            )
            .await?;
        }

        Ok(())
    }

    async fn update_account_balance(
        tx: &mut Tx<'_>,
        account_id: Uuid,
        amount: i64,
        transaction_type: TransactionType,
        operation: BalanceOperation,
    ) -> Result<(), AppError> {
        let effect = transaction_type.balance_effect(amount);
        let adjustment = match operation {
            BalanceOperation::Apply => effect,
            BalanceOperation::Reverse => -effect,
        };
        Self::adjust_balance(tx, account_id, adjustment).await
    }

    async fn adjust_balance(tx: &mut Tx<'_>, account_id: Uuid, delta: i64) -> Result<(), AppError> {
        if delta == 0 {
            return Ok(());
        }

        sqlx::query("UPDATE accounts SET balance = balance + $1, updated_at = NOW() WHERE id = $2")
            .bind(delta)
            .bind(account_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        debug!(%account_id, delta, "Account balance adjusted");
        Ok(())
    }

    /// The user's rows dated in `[from, until)`
    async fn analytics_rows(
        pool: &PgPool,
        user_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TransactionRow>, AppError> {
        let predicate = Predicate::all([
            owner_scope(user_id),
            Predicate::gte("t.transaction_date", FilterValue::Timestamp(from)),
            Predicate::lt("t.transaction_date", FilterValue::Timestamp(until)),
        ]);

        let records: Vec<AnalyticsRecord> =
            fetch_all(pool, &TRANSACTION_ANALYTICS, predicate.as_ref()).await?;

        Ok(records.into_iter().filter_map(AnalyticsRecord::into_row).collect())
    }

    /// Current vs previous month totals for the user.
    pub async fn kpis(
        pool: &PgPool,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<KpiResult, AppError> {
        let (from, until) = kpi_window(now).ok_or_else(|| {
            AppError::InternalError(format!("No calendar window around {now}"))
        })?;
        let rows = Self::analytics_rows(pool, user_id, from, until).await?;
        Ok(compute_kpis(&rows, now))
    }

    pub async fn history(
        pool: &PgPool,
        user_id: Uuid,
        period: Period,
        kind: Option<TransactionType>,
        now: DateTime<Utc>,
    ) -> Result<History<HistoryPoint>, AppError> {
        let (from, until) = history_window(period, now).ok_or_else(|| {
            AppError::InternalError(format!("No history window around {now}"))
        })?;
        let rows = Self::analytics_rows(pool, user_id, from, until).await?;
        Ok(compute_history(&rows, period, kind, now))
    }

    pub async fn expense_history(
        pool: &PgPool,
        user_id: Uuid,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<History<AmountPoint>, AppError> {
        let (from, until) = history_window(period, now).ok_or_else(|| {
            AppError::InternalError(format!("No history window around {now}"))
        })?;
        let rows = Self::analytics_rows(pool, user_id, from, until).await?;
        Ok(compute_expense_history(&rows, period, now))
    }
}
