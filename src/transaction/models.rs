use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::analytics::{Period, TransactionRow};
use crate::query::{ColumnDescriptor, Columns, FieldType, Table};

pub static TRANSACTION_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("id", "t.id::text", FieldType::String),
    ColumnDescriptor::new("amount", "t.amount", FieldType::Number),
    ColumnDescriptor::new("description", "t.description", FieldType::String),
    ColumnDescriptor::new("type", "t.transaction_type", FieldType::String),
    ColumnDescriptor::new("method", "t.method", FieldType::String),
    ColumnDescriptor::new("categoryId", "t.category_id::text", FieldType::String),
    ColumnDescriptor::new("accountId", "t.account_id::text", FieldType::String),
    ColumnDescriptor::new("date", "t.transaction_date", FieldType::Date),
    ColumnDescriptor::new("createdAt", "t.created_at", FieldType::Date),
    ColumnDescriptor::new("updatedAt", "t.updated_at", FieldType::Date),
];

const TRANSACTION_FROM: &str = "transactions t JOIN categories c ON c.id = t.category_id";

pub const TRANSACTIONS: Table = Table {
    name: "transactions",
    from: TRANSACTION_FROM,
    select: "t.id, t.amount, t.description, t.transaction_type, t.method, t.category_id, \
             c.title AS category_title, t.account_id, t.transaction_date, t.created_at, t.updated_at",
    columns: Columns::new(TRANSACTION_COLUMNS),
    default_order: "t.transaction_date DESC, t.created_at DESC",
    search: Some("t.description"),
};

/// Same rows, projected for the analytics reducers
pub const TRANSACTION_ANALYTICS: Table = Table {
    name: "transactions",
    from: TRANSACTION_FROM,
    select: "t.id::text AS id, t.amount, t.transaction_type, t.transaction_date, \
             t.category_id::text AS category_id, c.title AS category_title",
    columns: Columns::new(TRANSACTION_COLUMNS),
    default_order: "t.transaction_date ASC",
    search: None,
};

/// Transaction type enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money received (increases account balance)
    Income,
    /// Money spent (decreases account balance)
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INCOME" => Some(TransactionType::Income),
            "EXPENSE" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    /// Signed effect of `amount` on an account balance
    pub fn balance_effect(&self, amount: i64) -> i64 {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }
}

/// How the money moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Yape,
    Cash,
    Deposit,
    DebitCard,
    Transfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Yape => "YAPE",
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Deposit => "DEPOSIT",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Other => "OTHER",
        }
    }
}

/// Database row for a transaction joined with its category title
#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: i64,
    pub description: Option<String>,
    pub transaction_type: String,
    pub method: String,
    pub category_id: Uuid,
    pub category_title: String,
    pub account_id: Option<Uuid>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn get_type(&self) -> TransactionType {
        TransactionType::parse(&self.transaction_type).unwrap_or_default()
    }
}

/// One tag attached to one transaction
#[derive(Debug, Clone, FromRow)]
pub struct TransactionTagRow {
    pub transaction_id: Uuid,
    pub id: Uuid,
    pub title: String,
}

/// Row fed to the analytics reducers
#[derive(Debug, Clone, FromRow)]
pub struct AnalyticsRecord {
    pub id: String,
    pub amount: i64,
    pub transaction_type: String,
    pub transaction_date: DateTime<Utc>,
    pub category_id: String,
    pub category_title: String,
}

impl AnalyticsRecord {
    /// `None` for rows whose stored type is not recognised
    pub fn into_row(self) -> Option<TransactionRow> {
        Some(TransactionRow {
            transaction_type: TransactionType::parse(&self.transaction_type)?,
            id: self.id,
            amount: self.amount,
            date: self.transaction_date,
            category_id: self.category_id,
            category_title: self.category_title,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagSummary {
    pub id: Uuid,
    #[schema(example = "vacations")]
    pub title: String,
}

/// Transaction information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Uuid,
    /// Amount in minor units (always positive)
    #[schema(example = 5000)]
    pub amount: i64,
    #[schema(example = "Weekly groceries")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "EXPENSE")]
    pub transaction_type: String,
    #[schema(example = "YAPE")]
    pub method: String,
    pub category_id: Uuid,
    #[schema(example = "Food")]
    pub category_title: String,
    pub account_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub tags: Vec<TagSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionResponse {
    pub fn new(t: Transaction, tags: Vec<TagSummary>) -> Self {
        Self {
            id: t.id,
            amount: t.amount,
            description: t.description,
            transaction_type: t.transaction_type,
            method: t.method,
            category_id: t.category_id,
            category_title: t.category_title,
            account_id: t.account_id,
            date: t.transaction_date,
            tags,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Distinguish a missing field from an explicit `null`
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Largest accepted amount in minor units
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Request body for creating a transaction
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionDto {
    pub category_id: Uuid,

    /// Account whose balance this transaction moves (optional)
    pub account_id: Option<Uuid>,

    /// Amount in minor units (must be positive)
    #[validate(range(
        min = 1,
        max = 1_000_000_000_000i64,
        message = "Amount must be positive and at most 1000000000000"
    ))]
    #[schema(example = 5000)]
    pub amount: i64,

    #[serde(alias = "transactionDate")]
    pub date: DateTime<Utc>,

    /// Optional description (max 200 chars)
    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    #[schema(example = "Weekly groceries")]
    pub description: Option<String>,

    /// Defaults to EXPENSE
    #[serde(rename = "type", default)]
    pub transaction_type: TransactionType,

    #[serde(default)]
    pub method: PaymentMethod,

    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Request body for updating a transaction (PATCH - all fields optional)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionDto {
    pub category_id: Option<Uuid>,

    /// Account ID (use null to remove account association)
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<Uuid>)]
    pub account_id: Option<Option<Uuid>>,

    #[validate(range(
        min = 1,
        max = 1_000_000_000_000i64,
        message = "Amount must be positive and at most 1000000000000"
    ))]
    #[schema(example = 7500)]
    pub amount: Option<i64>,

    #[serde(alias = "transactionDate")]
    pub date: Option<DateTime<Utc>>,

    #[validate(length(max = 200, message = "Description cannot exceed 200 characters"))]
    #[schema(example = "Updated description")]
    pub description: Option<String>,

    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,

    pub method: Option<PaymentMethod>,

    /// Replaces every tag on the transaction when present
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Path parameters for transaction ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionIdPath {
    /// Transaction UUID
    pub id: Uuid,
}

/// Query parameters for `GET /transactions/history`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// WEEK (default), MONTH or YEAR
    #[serde(default)]
    pub period: Period,
    /// Restrict the series to one transaction type
    #[serde(rename = "type")]
    #[param(value_type = Option<String>, example = "EXPENSE")]
    pub transaction_type: Option<TransactionType>,
}

/// Query parameters for `GET /transactions/expense-history`
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpenseHistoryParams {
    #[serde(default)]
    pub period: Period,
}
