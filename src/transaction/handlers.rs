use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::analytics::{AmountPoint, Clock, History, HistoryPoint, KpiResult};
use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::query::{ListQuery, Paginated, PaginationInput, QuerySettings};

use super::models::{
    CreateTransactionDto, ExpenseHistoryParams, HistoryParams, TransactionIdPath,
    TransactionResponse, UpdateTransactionDto,
};
use super::service::TransactionService;

/// GET /transactions - Newest transactions first, one page at a time
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "Transactions",
    params(PaginationInput),
    responses(
        (status = 200, description = "Page of transactions", body = Paginated<TransactionResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions")]
pub async fn list_transactions(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    pagination: web::Query<PaginationInput>,
) -> Result<HttpResponse, AppError> {
    let query = ListQuery::page(pagination.into_inner());
    let page =
        TransactionService::list_transactions(pool.get_ref(), &settings, auth.user_id, &query)
            .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// POST /transactions/query - Filter, sort and page transactions
#[utoipa::path(
    post,
    path = "/transactions/query",
    tag = "Transactions",
    request_body = ListQuery,
    responses(
        (status = 200, description = "Page of matching transactions", body = Paginated<TransactionResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/transactions/query")]
pub async fn query_transactions(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    body: web::Json<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let page =
        TransactionService::list_transactions(pool.get_ref(), &settings, auth.user_id, &body)
            .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /transactions/kpis - This month against last month
#[utoipa::path(
    get,
    path = "/transactions/kpis",
    tag = "Analytics",
    responses(
        (status = 200, description = "Monthly totals and top expense category", body = KpiResult),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions/kpis")]
pub async fn get_kpis(
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let kpis = TransactionService::kpis(pool.get_ref(), auth.user_id, clock.now()).await?;

    Ok(HttpResponse::Ok().json(kpis))
}

/// GET /transactions/history - Income and expense per day or month
#[utoipa::path(
    get,
    path = "/transactions/history",
    tag = "Analytics",
    params(HistoryParams),
    responses(
        (status = 200, description = "Gap-filled history", body = History<HistoryPoint>),
        (status = 400, description = "Unknown period or type", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions/history")]
pub async fn get_history(
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
    auth: AuthenticatedUser,
    params: web::Query<HistoryParams>,
) -> Result<HttpResponse, AppError> {
    let history = TransactionService::history(
        pool.get_ref(),
        auth.user_id,
        params.period,
        params.transaction_type,
        clock.now(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(history))
}

/// GET /transactions/expense-history - Expense per day or month with a running total
#[utoipa::path(
    get,
    path = "/transactions/expense-history",
    tag = "Analytics",
    params(ExpenseHistoryParams),
    responses(
        (status = 200, description = "Gap-filled expense history", body = History<AmountPoint>),
        (status = 400, description = "Unknown period", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions/expense-history")]
pub async fn get_expense_history(
    pool: web::Data<PgPool>,
    clock: web::Data<dyn Clock>,
    auth: AuthenticatedUser,
    params: web::Query<ExpenseHistoryParams>,
) -> Result<HttpResponse, AppError> {
    let history =
        TransactionService::expense_history(pool.get_ref(), auth.user_id, params.period, clock.now())
            .await?;

    Ok(HttpResponse::Ok().json(history))
}

/// GET /transactions/{id} - Get a single transaction
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    responses(
        (status = 200, description = "Transaction details", body = TransactionResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/transactions/{id}")]
pub async fn get_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
) -> Result<HttpResponse, AppError> {
    let transaction =
        TransactionService::get_transaction(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::Ok().json(transaction))
}

/// POST /transactions - Create a transaction and move its account balance
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "Transactions",
    request_body = CreateTransactionDto,
    responses(
        (status = 201, description = "Transaction created", body = TransactionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Category, account or tag not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/transactions")]
pub async fn create_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateTransactionDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let transaction =
        TransactionService::create_transaction(pool.get_ref(), auth.user_id, body.into_inner())
            .await?;

    Ok(HttpResponse::Created().json(transaction))
}

/// PATCH /transactions/{id} - Update a transaction (partial update)
#[utoipa::path(
    patch,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    request_body = UpdateTransactionDto,
    responses(
        (status = 200, description = "Transaction updated", body = TransactionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/transactions/{id}")]
pub async fn update_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
    body: web::Json<UpdateTransactionDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let transaction = TransactionService::update_transaction(
        pool.get_ref(),
        auth.user_id,
        path.id,
        body.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(transaction))
}

/// DELETE /transactions/{id} - Delete a transaction and restore its account balance
#[utoipa::path(
    delete,
    path = "/transactions/{id}",
    tag = "Transactions",
    params(TransactionIdPath),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/transactions/{id}")]
pub async fn delete_transaction(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TransactionIdPath>,
) -> Result<HttpResponse, AppError> {
    TransactionService::delete_transaction(pool.get_ref(), auth.user_id, path.id).await?;

    Ok(HttpResponse::NoContent().finish())
}
