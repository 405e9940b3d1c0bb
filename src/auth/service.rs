use secrecy::Secret;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

use super::jwt::create_access_token;
use super::models::{AuthTokenResponse, CreateUserDto, User};
use super::password::{hash_password, verify_dummy, verify_password};

const USER_COLUMNS: &str = "id, email, password_hash, full_name, created_at, updated_at";

/// Registration, login and user lookup
pub struct AuthService;

impl AuthService {
    /// Register a new user and return an access token
    pub async fn register(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        dto: &CreateUserDto,
    ) -> Result<AuthTokenResponse, AppError> {
        let email = dto.email.trim().to_lowercase();

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&email)
                .fetch_one(pool)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;

        if exists {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash_password(&dto.password)?;
        let full_name = dto
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, full_name) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(full_name)
        .fetch_one(pool)
        .await?;

        info!(user_id = %user.id, "registered user");

        let access_token = create_access_token(&user, jwt_secret)?;
        Ok(AuthTokenResponse::new(access_token, &user))
    }

    /// Authenticate by email and password
    pub async fn login(
        pool: &PgPool,
        jwt_secret: &Secret<String>,
        email: &str,
        password: &str,
    ) -> Result<AuthTokenResponse, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        let Some(user) = user else {
            verify_dummy(password);
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let access_token = create_access_token(&user, jwt_secret)?;
        Ok(AuthTokenResponse::new(access_token, &user))
    }

    pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::InternalError(e.to_string()))?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
    }
}
