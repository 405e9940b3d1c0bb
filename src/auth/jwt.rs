use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};

use crate::errors::AppError;

use super::models::{TokenClaims, User};

pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 24 * 60;

/// Create a new JWT access token for a user
pub fn create_access_token(user: &User, jwt_secret: &Secret<String>) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::minutes(ACCESS_TOKEN_EXPIRY_MINUTES);

    let claims = TokenClaims {
        sub: user.id,
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: expires_at.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Failed to create access token: {e}")))
}

/// Decode and validate a JWT access token
pub fn decode_token(token: &str, jwt_secret: &Secret<String>) -> Result<TokenClaims, AppError> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let secret = Secret::new("test-secret".to_string());
        let user = user();
        let token = create_access_token(&user, &secret).expect("Should create token");
        let claims = decode_token(&token, &secret).expect("Should decode token");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ana@example.com");
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token = create_access_token(&user(), &Secret::new("one".to_string()))
            .expect("Should create token");
        let result = decode_token(&token, &Secret::new("two".to_string()));
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let secret = Secret::new("test-secret".to_string());
        let issued = Utc::now() - Duration::hours(3);
        let claims = TokenClaims {
            sub: Uuid::new_v4(),
            email: "ana@example.com".to_string(),
            iat: issued.timestamp() as usize,
            exp: (issued + Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .expect("Should encode");
        assert!(decode_token(&token, &secret).is_err());
    }
}
