use crate::modules::classes::controller::{
    add_student_submission, add_teacher_submission, create_class, create_section, delete_class,
    get_class, get_classes, get_section, get_student_submissions, join_class, leave_class,
    update_section,
};
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// `upload_body_limit` replaces axum's default body limit on the multipart routes.
pub fn init_classes_router(upload_body_limit: usize) -> Router<AppState> {
    let uploads = Router::new()
        .route(
            "/sections/{section_id}/submissions",
            post(add_teacher_submission).get(get_student_submissions),
        )
        .route(
            "/sections/{section_id}/student-submissions",
            post(add_student_submission),
        )
        .layer(DefaultBodyLimit::max(upload_body_limit));

    Router::new()
        .route("/", get(get_classes).post(create_class))
        .route("/{id}", get(get_class).delete(delete_class))
        .route("/{id}/join", post(join_class).delete(leave_class))
        .route("/{id}/sections", post(create_section))
        .route(
            "/sections/{section_id}",
            get(get_section).patch(update_section),
        )
        .merge(uploads)
}
