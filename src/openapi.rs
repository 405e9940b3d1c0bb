use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::models::{
    AccountResponse, AccountType, CreateAccountDto, DeleteResponse, UpdateAccountDto,
};
use crate::analytics::{AmountPoint, CategorySpend, HistoryPoint, KpiResult, Period};
use crate::auth::models::{AuthTokenResponse, CreateUserDto, LoginDto, UserResponseDto};
use crate::category::models::{CategoryResponse, CreateCategoryDto, UpdateCategoryDto};
use crate::errors::ErrorResponse;
use crate::query::{ListQuery, PaginationInput};
use crate::tag::models::{CreateTagDto, TagResponse, UpdateTagDto};
use crate::transaction::models::{
    CreateTransactionDto, PaymentMethod, TagSummary, TransactionResponse, TransactionType,
    UpdateTransactionDto,
};

/// Security scheme modifier for Bearer token authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Budget Query API",
        version = "1.0.0",
        description = "Personal budget tracking with filterable, sortable and paginated listings"
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    tags(
        (name = "Auth", description = "Registration, login and the current user"),
        (name = "Accounts", description = "Financial accounts"),
        (name = "Categories", description = "Income and expense categories"),
        (name = "Tags", description = "Free-form transaction labels"),
        (name = "Transactions", description = "Transactions with atomic balance updates"),
        (name = "Analytics", description = "Monthly KPIs and gap-filled histories")
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::account::handlers::list_accounts,
        crate::account::handlers::query_accounts,
        crate::account::handlers::get_account,
        crate::account::handlers::create_account,
        crate::account::handlers::update_account,
        crate::account::handlers::delete_account,
        crate::category::handlers::list_categories,
        crate::category::handlers::query_categories,
        crate::category::handlers::get_category,
        crate::category::handlers::create_category,
        crate::category::handlers::update_category,
        crate::category::handlers::delete_category,
        crate::tag::handlers::list_tags,
        crate::tag::handlers::query_tags,
        crate::tag::handlers::get_tag,
        crate::tag::handlers::create_tag,
        crate::tag::handlers::update_tag,
        crate::tag::handlers::delete_tag,
        crate::transaction::handlers::list_transactions,
        crate::transaction::handlers::query_transactions,
        crate::transaction::handlers::get_kpis,
        crate::transaction::handlers::get_history,
        crate::transaction::handlers::get_expense_history,
        crate::transaction::handlers::get_transaction,
        crate::transaction::handlers::create_transaction,
        crate::transaction::handlers::update_transaction,
        crate::transaction::handlers::delete_transaction,
    ),
    components(
        schemas(
            ErrorResponse,
            ListQuery,
            PaginationInput,
            CreateUserDto,
            LoginDto,
            UserResponseDto,
            AuthTokenResponse,
            AccountType,
            AccountResponse,
            CreateAccountDto,
            UpdateAccountDto,
            DeleteResponse,
            CategoryResponse,
            CreateCategoryDto,
            UpdateCategoryDto,
            TagResponse,
            CreateTagDto,
            UpdateTagDto,
            TransactionType,
            PaymentMethod,
            TagSummary,
            TransactionResponse,
            CreateTransactionDto,
            UpdateTransactionDto,
            Period,
            KpiResult,
            CategorySpend,
            HistoryPoint,
            AmountPoint,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_query_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/accounts/query",
            "/categories/query",
            "/tags/query",
            "/transactions/query",
            "/transactions/kpis",
            "/transactions/history",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
