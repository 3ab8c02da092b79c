use anyhow::anyhow;
use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use classroom_core::{AppError, Layer};
use classroom_models::auth::{ErrorResponse, MessageResponse};
use classroom_models::classes::{
    ClassDetail, ClassQuery, ClassResponse, CreateClassDto, JoinClassDto,
};
use classroom_models::sections::{
    ClassSection, CreateSectionDto, SectionDetail, UpdateSectionDto,
};
use classroom_models::submissions::{
    CreateSubmissionDto, StudentSubmission, StudentSubmissionForm, StudentSubmissionView,
    Submission, TeacherSubmissionForm, UploadedFile,
};
use tracing::instrument;

use crate::middleware::role::{RequireAnyRole, RequireStudent, RequireTeacher};
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedPath, validate};

const PDF_MIME: &str = "application/pdf";

fn handler_error(message: &str) -> AppError {
    AppError::bad_request(anyhow!(message.to_string())).at(Layer::Handler)
}

fn form_error(err: MultipartError) -> AppError {
    AppError::bad_request(anyhow!("invalid multipart form: {}", err.body_text()))
        .at(Layer::Handler)
}

/// Fields of a submission form. Only `file` is read for student uploads.
#[derive(Default)]
struct SubmissionForm {
    title: Option<String>,
    description: Option<String>,
    deadline: Option<String>,
    file: Option<UploadedFile>,
}

/// Browsers often send PDFs as `application/octet-stream`; trust the file
/// extension in that case.
fn content_type_for(file_name: &str, declared: Option<&str>) -> String {
    match declared {
        Some(declared) if declared != "application/octet-stream" => declared.to_string(),
        _ if file_name.to_ascii_lowercase().ends_with(".pdf") => PDF_MIME.to_string(),
        declared => declared.unwrap_or("application/octet-stream").to_string(),
    }
}

async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, AppError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = content_type_for(&file_name, field.content_type());
                let bytes = field.bytes().await.map_err(form_error)?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "title" => form.title = Some(field.text().await.map_err(form_error)?),
            "description" => form.description = Some(field.text().await.map_err(form_error)?),
            "deadline" => form.deadline = Some(field.text().await.map_err(form_error)?),
            _ => {}
        }
    }

    Ok(form)
}

fn parse_deadline(value: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|deadline| Some(deadline.with_timezone(&Utc)))
            .map_err(|_| {
                AppError::validation(anyhow!("deadline must be an RFC 3339 timestamp"))
            }),
    }
}

fn required_file(file: Option<UploadedFile>) -> Result<UploadedFile, AppError> {
    file.filter(|f| !f.bytes.is_empty())
        .ok_or_else(|| handler_error("file is required"))
}

#[utoipa::path(
    get,
    path = "/api/classes",
    params(ClassQuery),
    responses(
        (status = 200, description = "Classes whose name contains the query", body = Vec<ClassResponse>),
        (status = 400, description = "Missing name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, _auth))]
pub async fn get_classes(
    State(state): State<AppState>,
    _auth: RequireAnyRole,
    Query(query): Query<ClassQuery>,
) -> Result<Json<Vec<ClassResponse>>, AppError> {
    let name = query
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| handler_error("class name cannot be blank"))?;

    let classes = state.class_service.fetch_classes_by_name(&name).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created, including its join key", body = ClassResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, dto))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<ClassResponse>), AppError> {
    let class = state.class_service.create_class(auth_user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class with sections and students", body = ClassDetail),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    RequireAnyRole(auth_user): RequireAnyRole,
    ValidatedPath(id): ValidatedPath<i32>,
) -> Result<Json<ClassDetail>, AppError> {
    let class = state.class_service.fetch_class_by_id(id, auth_user.id).await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedPath(id): ValidatedPath<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    state.class_service.delete_class(id, auth_user.id).await?;
    Ok(Json(MessageResponse::new("class deleted")))
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/join",
    params(("id" = i32, Path, description = "Class ID")),
    request_body = JoinClassDto,
    responses(
        (status = 201, description = "Joined the class", body = MessageResponse),
        (status = 400, description = "Invalid key or already enrolled", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state, dto))]
pub async fn join_class(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    ValidatedPath(id): ValidatedPath<i32>,
    ValidatedJson(dto): ValidatedJson<JoinClassDto>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    state
        .class_service
        .join_class(id, auth_user.id, &dto.key)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("Success join class"))))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}/join",
    params(("id" = i32, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Left the class", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn leave_class(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    ValidatedPath(id): ValidatedPath<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    state.class_service.leave_class(id, auth_user.id).await?;
    Ok(Json(MessageResponse::new("left class")))
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/sections",
    params(("id" = i32, Path, description = "Class ID")),
    request_body = CreateSectionDto,
    responses(
        (status = 201, description = "Section created", body = ClassSection),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sections"
)]
#[instrument(skip(state, dto))]
pub async fn create_section(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedPath(id): ValidatedPath<i32>,
    ValidatedJson(dto): ValidatedJson<CreateSectionDto>,
) -> Result<(StatusCode, Json<ClassSection>), AppError> {
    state.class_service.ensure_class_owner(id, auth_user.id).await?;
    let section = state.class_service.create_section(id, dto).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

#[utoipa::path(
    get,
    path = "/api/classes/sections/{section_id}",
    params(("section_id" = i32, Path, description = "Section ID")),
    responses(
        (status = 200, description = "Section with its task briefs", body = SectionDetail),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sections"
)]
#[instrument(skip(state, _auth))]
pub async fn get_section(
    State(state): State<AppState>,
    _auth: RequireAnyRole,
    ValidatedPath(section_id): ValidatedPath<i32>,
) -> Result<Json<SectionDetail>, AppError> {
    let section = state.class_service.fetch_section_by_id(section_id).await?;
    Ok(Json(section))
}

#[utoipa::path(
    patch,
    path = "/api/classes/sections/{section_id}",
    params(("section_id" = i32, Path, description = "Section ID")),
    request_body = UpdateSectionDto,
    responses(
        (status = 200, description = "Section updated", body = ClassSection),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this class", body = ErrorResponse),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Sections"
)]
#[instrument(skip(state, dto))]
pub async fn update_section(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedPath(section_id): ValidatedPath<i32>,
    ValidatedJson(dto): ValidatedJson<UpdateSectionDto>,
) -> Result<Json<ClassSection>, AppError> {
    state
        .class_service
        .ensure_section_owner(section_id, auth_user.id)
        .await?;
    let section = state.class_service.update_section(section_id, dto).await?;
    Ok(Json(section))
}

/// Upload the task brief of a section and open it for hand-ins
#[utoipa::path(
    post,
    path = "/api/classes/sections/{section_id}/submissions",
    params(("section_id" = i32, Path, description = "Section ID")),
    request_body(content = TeacherSubmissionForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Brief stored and task opened", body = Submission),
        (status = 400, description = "Invalid form or file", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this class", body = ErrorResponse),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Submissions"
)]
#[instrument(skip(state, multipart))]
pub async fn add_teacher_submission(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedPath(section_id): ValidatedPath<i32>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    state
        .class_service
        .ensure_section_owner(section_id, auth_user.id)
        .await?;

    let form = read_form(multipart).await?;
    let dto = CreateSubmissionDto {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        deadline: parse_deadline(form.deadline)?,
    };
    validate(&dto)?;
    let file = required_file(form.file)?;

    let submission = state
        .class_service
        .add_submission_teacher(section_id, dto, file)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/api/classes/sections/{section_id}/submissions",
    params(("section_id" = i32, Path, description = "Section ID")),
    responses(
        (status = 200, description = "Student hand-ins for the section", body = Vec<StudentSubmissionView>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this class", body = ErrorResponse),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Submissions"
)]
#[instrument(skip(state))]
pub async fn get_student_submissions(
    State(state): State<AppState>,
    RequireTeacher(auth_user): RequireTeacher,
    ValidatedPath(section_id): ValidatedPath<i32>,
) -> Result<Json<Vec<StudentSubmissionView>>, AppError> {
    let submissions = state
        .class_service
        .fetch_submissions_by_section(section_id, auth_user.id)
        .await?;
    Ok(Json(submissions))
}

/// Hand in a file for a section whose task is open
#[utoipa::path(
    post,
    path = "/api/classes/sections/{section_id}/student-submissions",
    params(("section_id" = i32, Path, description = "Section ID")),
    request_body(content = StudentSubmissionForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Hand-in stored", body = StudentSubmission),
        (status = 400, description = "No open task, or invalid file", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Submissions"
)]
#[instrument(skip(state, multipart))]
pub async fn add_student_submission(
    State(state): State<AppState>,
    RequireStudent(auth_user): RequireStudent,
    ValidatedPath(section_id): ValidatedPath<i32>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StudentSubmission>), AppError> {
    let form = read_form(multipart).await?;
    let file = required_file(form.file)?;

    let submission = state
        .class_service
        .add_submission_student(auth_user.id, section_id, file)
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}
