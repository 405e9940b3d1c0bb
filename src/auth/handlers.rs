use actix_web::{get, post, web, HttpResponse};
use secrecy::Secret;
use sqlx::PgPool;
use validator::Validate;

use crate::errors::{AppError, ErrorResponse};
use crate::extractors::AuthenticatedUser;

use super::models::{AuthTokenResponse, CreateUserDto, LoginDto, UserResponseDto};
use super::service::AuthService;

/// POST /auth/register - Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User registered", body = AuthTokenResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    )
)]
#[post("/auth/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    jwt_secret: web::Data<Secret<String>>,
    body: web::Json<CreateUserDto>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let response = AuthService::register(pool.get_ref(), jwt_secret.get_ref(), &body).await?;

    Ok(HttpResponse::Created().json(response))
}

/// POST /auth/login - Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Authenticated", body = AuthTokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[post("/auth/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    jwt_secret: web::Data<Secret<String>>,
    body: web::Json<LoginDto>,
) -> Result<HttpResponse, AppError> {
    let response =
        AuthService::login(pool.get_ref(), jwt_secret.get_ref(), &body.email, &body.password)
            .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /auth/me - Current user
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponseDto),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[get("/auth/me")]
pub async fn me(
    pool: web::Data<PgPool>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = AuthService::get_user_by_id(pool.get_ref(), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(UserResponseDto::from_user(&user)))
}
