use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::CookieJar;
use classroom_core::AppError;
use classroom_models::auth::{ErrorResponse, LoginRequest, TokenResponse};
use classroom_models::classes::ClassResponse;
use classroom_models::teachers::{RegisterTeacherDto, TeacherResponse};
use tracing::instrument;

use crate::middleware::role::RequireTeacher;
use crate::modules::auth::controller::token_cookie;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/teachers/register",
    request_body = RegisterTeacherDto,
    responses(
        (status = 201, description = "Teacher registered", body = TokenResponse),
        (status = 400, description = "Invalid input or email / NPM taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Teachers"
)]
#[instrument(skip(state, dto))]
pub async fn register_teacher(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterTeacherDto>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let tokens = state.teacher_service.register(dto).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[utoipa::path(
    post,
    path = "/api/teachers/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "Teachers"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login_teacher(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let tokens = state.teacher_service.login(dto).await?;
    Ok((jar.add(token_cookie(&tokens.access_token)), Json(tokens)))
}

#[utoipa::path(
    get,
    path = "/api/teachers/profile",
    operation_id = "get_teacher_profile",
    responses(
        (status = 200, description = "Own account", body = TeacherResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
) -> Result<Json<TeacherResponse>, AppError> {
    let teacher = state.teacher_service.get_teacher(auth_user.id).await?;
    Ok(Json(TeacherResponse::from(teacher)))
}

#[utoipa::path(
    get,
    path = "/api/teachers/classes",
    operation_id = "get_teacher_classes",
    responses(
        (status = 200, description = "Classes taught by the caller, with join keys", body = Vec<ClassResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_classes(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
) -> Result<Json<Vec<ClassResponse>>, AppError> {
    let classes = state
        .class_service
        .fetch_classes_by_teacher(auth_user.id)
        .await?;
    Ok(Json(classes))
}
