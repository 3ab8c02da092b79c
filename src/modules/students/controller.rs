use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use classroom_core::{AppError, Layer};
use classroom_models::auth::{ErrorResponse, LoginRequest, MessageResponse, TokenResponse};
use classroom_models::students::{
    EditProfileDto, RegisterStudentDto, ScheduleEntry, StudentProfileResponse, StudentQuery,
    StudentResponse,
};
use tracing::instrument;

use crate::middleware::role::{RequireAnyRole, RequireStudent};
use crate::modules::auth::controller::token_cookie;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/students/register",
    request_body = RegisterStudentDto,
    responses(
        (status = 201, description = "Student registered", body = TokenResponse),
        (status = 400, description = "Invalid input or email / NIM taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn register_student(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterStudentDto>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let tokens = state.student_service.register(dto).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

#[utoipa::path(
    post,
    path = "/api/students/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login_student(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AppError> {
    let tokens = state.student_service.login(dto).await?;
    Ok((jar.add(token_cookie(&tokens.access_token)), Json(tokens)))
}

#[utoipa::path(
    get,
    path = "/api/students/profile",
    responses(
        (status = 200, description = "Own profile", body = StudentProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let profile = state.student_service.get_profile(auth_user.id).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/students/profile",
    request_body = EditProfileDto,
    responses(
        (status = 200, description = "Profile saved", body = StudentProfileResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, dto))]
pub async fn edit_profile(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    ValidatedJson(dto): ValidatedJson<EditProfileDto>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let profile = state.student_service.edit_profile(auth_user.id, dto).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    delete,
    path = "/api/students",
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
) -> Result<Json<MessageResponse>, AppError> {
    state.student_service.delete_student(auth_user.id).await?;
    Ok(Json(MessageResponse::new("student deleted")))
}

#[utoipa::path(
    get,
    path = "/api/students/schedule",
    responses(
        (status = 200, description = "Enrolled classes by day and time", body = Vec<ScheduleEntry>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_schedule(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
) -> Result<Json<Vec<ScheduleEntry>>, AppError> {
    let schedule = state.student_service.schedule(auth_user.id).await?;
    Ok(Json(schedule))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Matching students", body = Vec<StudentResponse>),
        (status = 400, description = "Missing name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
#[instrument(skip(state, _auth))]
pub async fn search_students(
    State(state): State<AppState>,
    _auth: RequireAnyRole,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Vec<StudentResponse>>, AppError> {
    let name = query
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("student name cannot be blank")).at(Layer::Handler)
        })?;

    let students = state.student_service.search_by_name(&name).await?;
    Ok(Json(students))
}
