use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::jwt::ACCESS_TOKEN_EXPIRY_MINUTES;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate password complexity: at least one uppercase, one lowercase, and one digit
fn validate_password_complexity(password: &str) -> Result<(), ValidationError> {
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lowercase && has_uppercase && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_complexity"))
    }
}

/// Request body for user registration
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDto {
    /// User's email address
    #[validate(email(message = "Email must be valid"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Password (min 8 chars, must include uppercase, lowercase, and digit)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[validate(custom(
        function = "validate_password_complexity",
        message = "Password must contain at least one uppercase letter, one lowercase letter, and one number"
    ))]
    #[schema(example = "Password123")]
    pub password: String,
    /// Optional full name
    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    #[schema(example = "Ana Quispe")]
    pub full_name: Option<String>,
}

/// User information returned in responses
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseDto {
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Ana Quispe")]
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserResponseDto {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Request body for user login
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginDto {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

/// JWT access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: Uuid,     // User ID
    pub email: String, // User email
    pub iat: usize,    // Issued at
    pub exp: usize,    // Expiration
}

/// Response carrying a bearer token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Always "Bearer"
    #[schema(example = "Bearer")]
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    #[schema(example = 86400)]
    pub expires_in: u64,
    pub user: UserResponseDto,
}

impl AuthTokenResponse {
    pub fn new(access_token: String, user: &User) -> Self {
        Self {
            access_token,
            token_type: "Bearer",
            expires_in: (ACCESS_TOKEN_EXPIRY_MINUTES * 60) as u64,
            user: UserResponseDto::from_user(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str) -> CreateUserDto {
        CreateUserDto {
            email: email.to_string(),
            password: password.to_string(),
            full_name: None,
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(register("ana@example.com", "Password123").validate().is_ok());
    }

    #[test]
    fn test_weak_password_is_rejected() {
        assert!(register("ana@example.com", "password").validate().is_err());
        assert!(register("ana@example.com", "Pass1").validate().is_err());
    }

    #[test]
    fn test_bad_email_is_rejected() {
        assert!(register("not-an-email", "Password123").validate().is_err());
    }
}
