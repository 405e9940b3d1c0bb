use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::category::models::validate_color_hex;
use crate::query::{ColumnDescriptor, Columns, FieldType, Table};

pub const DEFAULT_CURRENCY: &str = "PEN";

pub static ACCOUNT_COLUMNS: &[ColumnDescriptor] = &[
    ColumnDescriptor::new("id", "a.id::text", FieldType::String),
    ColumnDescriptor::new("name", "a.name", FieldType::String),
    ColumnDescriptor::new("type", "a.account_type", FieldType::String),
    ColumnDescriptor::new("balance", "a.balance", FieldType::Number),
    ColumnDescriptor::new("currency", "a.currency", FieldType::String),
    ColumnDescriptor::new("createdAt", "a.created_at", FieldType::Date),
    ColumnDescriptor::new("updatedAt", "a.updated_at", FieldType::Date),
];

pub const ACCOUNTS: Table = Table {
    name: "accounts",
    from: "accounts a",
    select: "a.id, a.name, a.account_type, a.balance, a.color_hex, a.currency, a.created_at, a.updated_at",
    columns: Columns::new(ACCOUNT_COLUMNS),
    default_order: "a.created_at DESC",
    search: Some("a.name"),
};

/// Account type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Checking account for daily transactions
    Checking,
    Savings,
    Credit,
    /// Physical cash
    Cash,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
            AccountType::Cash => "cash",
        }
    }
}

/// ISO 4217 style code: three ASCII letters
fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_currency"))
    }
}

/// Database entity for accounts
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub account_type: String,
    pub balance: i64,
    pub color_hex: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    #[schema(example = "BCP Ahorros")]
    pub name: String,
    /// Account type (checking, savings, credit, cash)
    #[serde(rename = "type")]
    #[schema(example = "savings")]
    pub account_type: String,
    /// Current balance in minor units
    #[schema(example = 150000)]
    pub balance: i64,
    #[schema(example = "#4CAF50")]
    pub color_hex: String,
    #[schema(example = "PEN")]
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            account_type: account.account_type,
            balance: account.balance,
            color_hex: account.color_hex,
            currency: account.currency,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Delete operation response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    #[schema(example = "Account deleted successfully")]
    pub message: String,
    /// Deleted resource ID
    pub id: Uuid,
}

/// Request body for creating an account
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountDto {
    /// Account name (1-50 characters)
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "BCP Ahorros")]
    pub name: String,

    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Opening balance in minor units (defaults to 0)
    #[serde(default)]
    #[schema(example = 100000)]
    pub balance: i64,

    #[validate(custom(
        function = "validate_color_hex",
        message = "Color must be #RRGGBB format"
    ))]
    #[schema(example = "#4CAF50")]
    pub color_hex: String,

    /// Three-letter currency code (defaults to PEN)
    #[validate(custom(
        function = "validate_currency_code",
        message = "Currency must be a three-letter code"
    ))]
    #[serde(default = "default_currency")]
    #[schema(example = "PEN")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Request body for updating an account (PATCH - all fields optional)
///
/// The balance is only moved by transactions.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountDto {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    #[schema(example = "BCP Sueldo")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,

    #[schema(example = "#2196F3")]
    pub color_hex: Option<String>,

    #[schema(example = "USD")]
    pub currency: Option<String>,
}

impl UpdateAccountDto {
    /// Validate the optional color and currency
    pub fn validate_fields(&self) -> Result<(), AccountFieldError> {
        if let Some(color) = &self.color_hex {
            validate_color_hex(color).map_err(|_| AccountFieldError::Color)?;
        }
        if let Some(code) = &self.currency {
            validate_currency_code(code).map_err(|_| AccountFieldError::Currency)?;
        }
        Ok(())
    }
}

/// Which optional field failed validation on update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFieldError {
    Color,
    Currency,
}

impl AccountFieldError {
    pub fn message(self) -> &'static str {
        match self {
            AccountFieldError::Color => "Color must be #RRGGBB format",
            AccountFieldError::Currency => "Currency must be a three-letter code",
        }
    }
}

/// Path parameters for account ID
#[derive(Debug, Deserialize, IntoParams)]
pub struct AccountIdPath {
    /// Account UUID
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_valid() {
        assert!(ACCOUNTS.columns.validate().is_ok());
        assert_eq!(ACCOUNTS.columns.get("balance").map(|c| c.kind), Some(FieldType::Number));
    }

    #[test]
    fn test_create_defaults_currency() {
        let dto: CreateAccountDto = serde_json::from_str(
            r##"{"name":"Wallet","type":"cash","colorHex":"#000000"}"##,
        )
        .unwrap();
        assert_eq!(dto.currency, "PEN");
        assert_eq!(dto.balance, 0);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_field_validation() {
        let dto: UpdateAccountDto = serde_json::from_str(r#"{"currency":"dollars"}"#).unwrap();
        assert_eq!(dto.validate_fields(), Err(AccountFieldError::Currency));

        let dto: UpdateAccountDto = serde_json::from_str(r#"{"colorHex":"red"}"#).unwrap();
        assert_eq!(dto.validate_fields(), Err(AccountFieldError::Color));
    }
}
