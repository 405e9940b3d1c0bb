use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::transaction::models::TransactionType;

/// One transaction as seen by the aggregator, already scoped to its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: String,
    /// Minor currency units
    pub amount: i64,
    pub transaction_type: TransactionType,
    pub date: DateTime<Utc>,
    pub category_id: String,
    pub category_title: String,
}

/// Category with the largest expense total in the current month
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    #[schema(example = "5b0f3c1e-4a57-4d5b-9a86-0c3f1a1e2b7d")]
    pub category_id: String,
    #[schema(example = "Food")]
    pub title: String,
    #[schema(example = 5000)]
    pub amount: i64,
}

/// Month-over-month totals
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiResult {
    /// Income in the current calendar month
    pub total_income: i64,
    /// Expenses in the current calendar month
    pub total_expenses: i64,
    pub percentage_income_difference: f64,
    pub percentage_expenses_difference: f64,
    pub most_expensive_category: CategorySpend,
}

/// Bucketing period for history series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    /// Seven daily buckets ending today
    #[default]
    Week,
    /// Twelve monthly buckets ending with the current month
    #[serde(alias = "YEAR")]
    Month,
}

/// Income and expense sums for one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HistoryPoint {
    #[schema(example = "Mon")]
    pub label: String,
    pub income: i64,
    pub expense: i64,
}

/// Single-series bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AmountPoint {
    #[schema(example = "Jan")]
    pub label: String,
    pub amount: i64,
}

/// Fixed-length, chronologically ordered series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct History<T> {
    pub data: Vec<T>,
    pub total: i64,
}
