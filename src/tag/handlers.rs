use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;
use crate::query::{ListQuery, Paginated, PaginationInput, QuerySettings};

use super::models::{CreateTagDto, TagIdPath, TagResponse, UpdateTagDto};
use super::service::TagService;

#[utoipa::path(
    get,
    path = "/tags",
    tag = "Tags",
    params(PaginationInput),
    responses(
        (status = 200, description = "Page of tags", body = Paginated<TagResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/tags")]
pub async fn list_tags(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    pagination: web::Query<PaginationInput>,
) -> Result<HttpResponse, AppError> {
    let query = ListQuery::page(pagination.into_inner());
    let page = TagService::list(pool.get_ref(), &settings, auth.user_id, &query).await?;
    Ok(HttpResponse::Ok().json(page.map(TagResponse::from)))
}

#[utoipa::path(
    post,
    path = "/tags/query",
    tag = "Tags",
    request_body = ListQuery,
    responses(
        (status = 200, description = "Page of matching tags", body = Paginated<TagResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/tags/query")]
pub async fn query_tags(
    pool: web::Data<PgPool>,
    settings: web::Data<QuerySettings>,
    auth: AuthenticatedUser,
    body: web::Json<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = TagService::list(pool.get_ref(), &settings, auth.user_id, &body).await?;
    Ok(HttpResponse::Ok().json(page.map(TagResponse::from)))
}

#[utoipa::path(
    get,
    path = "/tags/{id}",
    tag = "Tags",
    params(TagIdPath),
    responses(
        (status = 200, description = "Tag details", body = TagResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/tags/{id}")]
pub async fn get_tag(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TagIdPath>,
) -> Result<HttpResponse, AppError> {
    let tag = TagService::get_by_id(pool.get_ref(), path.id, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(TagResponse::from(tag)))
}

#[utoipa::path(
    post,
    path = "/tags",
    tag = "Tags",
    request_body = CreateTagDto,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Tag already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[post("/tags")]
pub async fn create_tag(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    body: web::Json<CreateTagDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let tag = TagService::create(pool.get_ref(), &body, auth.user_id).await?;
    Ok(HttpResponse::Created().json(TagResponse::from(tag)))
}

#[utoipa::path(
    patch,
    path = "/tags/{id}",
    tag = "Tags",
    params(TagIdPath),
    request_body = UpdateTagDto,
    responses(
        (status = 200, description = "Tag updated", body = TagResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse),
        (status = 409, description = "Tag already exists", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[patch("/tags/{id}")]
pub async fn update_tag(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TagIdPath>,
    body: web::Json<UpdateTagDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let tag = TagService::update(pool.get_ref(), path.id, &body, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(TagResponse::from(tag)))
}

#[utoipa::path(
    delete,
    path = "/tags/{id}",
    tag = "Tags",
    params(TagIdPath),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[delete("/tags/{id}")]
pub async fn delete_tag(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
    path: web::Path<TagIdPath>,
) -> Result<HttpResponse, AppError> {
    TagService::delete(pool.get_ref(), path.id, auth.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
