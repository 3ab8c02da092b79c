use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, SameSite};
use classroom_core::AppError;
use classroom_models::auth::{ErrorResponse, RefreshTokenRequest, TokenResponse};
use tracing::instrument;

use crate::middleware::auth::TOKEN_COOKIE;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// HttpOnly cookie carrying the access token, read by the auth guard when no
/// bearer header is present.
pub(crate) fn token_cookie(access_token: &str) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, access_token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = state.auth_service.refresh(&dto.refresh_token).await?;
    Ok(Json(tokens))
}
