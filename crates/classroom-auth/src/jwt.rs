//! JWT utilities for authentication.
//!
//! Tokens are signed with HS256 using the configured secret. Verification only
//! accepts HS256, so a token signed with any other algorithm is rejected even
//! when the secret matches.
//!
//! # Example
//!
//! ```ignore
//! use classroom_auth::{Role, create_access_token, verify_token};
//! use classroom_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(student_id, Role::Student, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use classroom_config::JwtConfig;
use classroom_core::{AppError, Layer};

use crate::claims::{Claims, RefreshTokenClaims, Role, TokenType};

const ALGORITHM: Algorithm = Algorithm::HS256;

fn expiry_from_now(now: i64, seconds: i64) -> usize {
    now.saturating_add(seconds).max(0) as usize
}

fn validation() -> Validation {
    Validation::new(ALGORITHM)
}

/// Creates a short-lived access token for `user_id` acting as `role`.
pub fn create_access_token(
    user_id: Uuid,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        typ: TokenType::Access,
        exp: expiry_from_now(now, jwt_config.access_token_expiry),
        iat: now as usize,
    };

    encode(
        &Header::new(ALGORITHM),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| {
        AppError::internal_error(format!("Failed to create token: {}", e)).at(Layer::Auth)
    })
}

/// Verifies an access token and returns the embedded claims.
///
/// # Errors
///
/// Returns an unauthorized error if the signature is invalid, the token has
/// expired, the algorithm is not HS256, the token is malformed, or it is a
/// refresh token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(),
    )
    .ok()
    .map(|data| data.claims)
    .filter(|claims| claims.typ == TokenType::Access)
    .ok_or_else(|| AppError::unauthorized("Invalid or expired token".to_string()))
}

/// Creates a long-lived refresh token bound to the access token it was issued with.
pub fn create_refresh_token(
    user_id: Uuid,
    role: Role,
    access_token: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        role,
        typ: TokenType::Refresh,
        access_token: access_token.to_string(),
        exp: expiry_from_now(now, jwt_config.refresh_token_expiry),
        iat: now as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(ALGORITHM),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| {
        AppError::internal_error(format!("Failed to create refresh token: {}", e)).at(Layer::Auth)
    })
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation(),
    )
    .ok()
    .map(|data| data.claims)
    .filter(|claims| claims.typ == TokenType::Refresh)
    .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token".to_string()))
}

/// Issues an access token and its matching refresh token.
pub fn issue_token_pair(
    user_id: Uuid,
    role: Role,
    jwt_config: &JwtConfig,
) -> Result<(String, String), AppError> {
    let access_token = create_access_token(user_id, role, jwt_config)?;
    let refresh_token = create_refresh_token(user_id, role, &access_token, jwt_config)?;
    Ok((access_token, refresh_token))
}
