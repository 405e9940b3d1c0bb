use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::query::{ListQuery, Paginated, PaginationInput, QuerySettings};

use super::models::{CategoryIdPath, CategoryResponse, CreateCategoryDto, UpdateCategoryDto};
use super::service::CategoryService;

/// GET /categories - Page through the user's categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    params(PaginationInput),
    responses(
        (status = 200, description = "Page of categories", body = Paginated<CategoryResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/categories")]
pub async fn list_categories(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    pagination: web::Query<PaginationInput>,
) -> Result<HttpResponse, AppError> {
    let query = ListQuery::page(pagination.into_inner());
    let page = CategoryService::list(pool.get_ref(), &settings, auth.user_id, &query).await?;

    Ok(HttpResponse::Ok().json(page.map(CategoryResponse::from)))
}

/// POST /categories/query - Filter, sort and page categories
#[utoipa::path(
    post,
    path = "/categories/query",
    tag = "Categories",
    request_body = ListQuery,
    responses(
        (status = 200, description = "Page of matching categories", body = Paginated<CategoryResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/categories/query")]
pub async fn query_categories(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    body: web::Json<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = CategoryService::list(pool.get_ref(), &settings, auth.user_id, &body).await?;

    Ok(HttpResponse::Ok().json(page.map(CategoryResponse::from)))
}

/// GET /categories/{id} - Get a specific category
#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "Categories",
    params(CategoryIdPath),
    responses(
        (status = 200, description = "Category details", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/categories/{id}")]
pub async fn get_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<CategoryIdPath>,
) -> Result<HttpResponse, AppError> {
    let category = CategoryService::get_by_id(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

/// POST /categories - Create a new category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Title already used", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/categories")]
pub async fn create_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateCategoryDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let category = CategoryService::create(pool.get_ref(), &body, auth.user_id).await?;

    Ok(HttpResponse::Created().json(CategoryResponse::from(category)))
}

/// PATCH /categories/{id} - Update a category
#[utoipa::path(
    patch,
    path = "/categories/{id}",
    tag = "Categories",
    params(CategoryIdPath),
    request_body = UpdateCategoryDto,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Title already used", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/categories/{id}")]
pub async fn update_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<CategoryIdPath>,
    body: web::Json<UpdateCategoryDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    body.validate_fields()
        .map_err(|_| AppError::ValidationError("Color must be in #RRGGBB format".to_string()))?;

    let category = CategoryService::update(pool.get_ref(), path.id, &body, auth.user_id).await?;

    Ok(HttpResponse::Ok().json(CategoryResponse::from(category)))
}

/// DELETE /categories/{id} - Delete a category
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    params(CategoryIdPath),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category still has transactions", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/categories/{id}")]
pub async fn delete_category(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<CategoryIdPath>,
) -> Result<HttpResponse, AppError> {
    CategoryService::delete(pool.get_ref(), path.id, auth.user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}
