use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use secrecy::Secret;
use uuid::Uuid;

use crate::auth::decode_token;
use crate::errors::AppError;

/// The caller, identified by a valid bearer token.
///
/// Every service call is scoped to `user_id`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl AuthenticatedUser {
    fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
        let jwt_secret = req
            .app_data::<web::Data<Secret<String>>>()
            .ok_or_else(|| AppError::InternalError("JWT secret not configured".to_string()))?;

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Missing or invalid Authorization header".to_string())
            })?;

        let claims = decode_token(token, jwt_secret.get_ref())?;
        Ok(Self {
            user_id: claims.sub,
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}
