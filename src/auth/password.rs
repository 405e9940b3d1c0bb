use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use lazy_static::lazy_static;

use crate::errors::AppError;

lazy_static! {
    /// Argon2id with the crate defaults: memory=19456 KiB, iterations=2, parallelism=1
    static ref ARGON2: Argon2<'static> =
        Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());

    /// Verified against when the email is unknown so both login failures cost the same
    static ref DUMMY_HASH: Option<String> = hash_password("unused-Password1").ok();
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    ARGON2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::InternalError(format!("Invalid password hash: {e}")))?;
    Ok(ARGON2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Burn one verification for a login attempt on an unknown account.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}
