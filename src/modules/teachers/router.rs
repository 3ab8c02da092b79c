use crate::modules::teachers::controller::{
    get_classes, get_profile, login_teacher, register_teacher,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_teacher))
        .route("/login", post(login_teacher))
        .route("/profile", get(get_profile))
        .route("/classes", get(get_classes))
}
