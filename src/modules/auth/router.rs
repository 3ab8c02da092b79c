use axum::{Router, routing::post};

use super::controller::refresh_token;
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new().route("/refresh", post(refresh_token))
}
