use crate::modules::students::controller::{
    delete_student, edit_profile, get_profile, get_schedule, login_student, register_student,
    search_students,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_students).delete(delete_student))
        .route("/register", post(register_student))
        .route("/login", post(login_student))
        .route("/profile", get(get_profile).put(edit_profile))
        .route("/schedule", get(get_schedule))
}
