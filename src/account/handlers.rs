use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::query::{ListQuery, Paginated, PaginationInput, QuerySettings};

use super::models::{
    AccountIdPath, AccountResponse, CreateAccountDto, DeleteResponse, UpdateAccountDto,
};
use super::service::AccountService;

/// GET /accounts - List the authenticated user's accounts, one page at a time
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "Accounts",
    params(PaginationInput),
    responses(
        (status = 200, description = "Page of accounts", body = Paginated<AccountResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/accounts")]
pub async fn list_accounts(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    pagination: web::Query<PaginationInput>,
) -> Result<HttpResponse, AppError> {
    let query = ListQuery::page(pagination.into_inner());
    let accounts =
        AccountService::list_accounts(pool.get_ref(), &settings, auth.user_id, &query).await?;

    Ok(HttpResponse::Ok().json(accounts.map(AccountResponse::from)))
}

/// POST /accounts/query - Filter, sort and page accounts
#[utoipa::path(
    post,
    path = "/accounts/query",
    tag = "Accounts",
    request_body = ListQuery,
    responses(
        (status = 200, description = "Page of matching accounts", body = Paginated<AccountResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/accounts/query")]
pub async fn query_accounts(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    body: web::Json<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let accounts =
        AccountService::list_accounts(pool.get_ref(), &settings, auth.user_id, &body).await?;

    Ok(HttpResponse::Ok().json(accounts.map(AccountResponse::from)))
}

/// GET /accounts/{id} - Get a specific account by ID
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "Accounts",
    params(AccountIdPath),
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/accounts/{id}")]
pub async fn get_account(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<AccountIdPath>,
) -> Result<HttpResponse, AppError> {
    let account = AccountService::get_account_by_id(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}

/// POST /accounts - Create a new account
#[utoipa::path(
    post,
    path = "/accounts",
    tag = "Accounts",
    request_body = CreateAccountDto,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/accounts")]
pub async fn create_account(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateAccountDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let account = AccountService::create_account(pool.get_ref(), auth.user_id, &body).await?;

    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// PATCH /accounts/{id} - Update an account (partial update)
#[utoipa::path(
    patch,
    path = "/accounts/{id}",
    tag = "Accounts",
    params(AccountIdPath),
    request_body = UpdateAccountDto,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/accounts/{id}")]
pub async fn update_account(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<AccountIdPath>,
    body: web::Json<UpdateAccountDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    body.validate_fields()
        .map_err(|e| AppError::ValidationError(e.message().to_string()))?;

    let account =
        AccountService::update_account(pool.get_ref(), path.id, auth.user_id, &body).await?;

    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}

/// DELETE /accounts/{id} - Delete an account
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    tag = "Accounts",
    params(AccountIdPath),
    responses(
        (status = 200, description = "Account deleted", body = DeleteResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/accounts/{id}")]
pub async fn delete_account(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<AccountIdPath>,
) -> Result<HttpResponse, AppError> {
    AccountService::delete_account(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: "Account deleted successfully".to_string(),
        id: path.id,
    }))
}
