use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use classroom_models::auth::{
    ErrorResponse, LoginRequest, MessageResponse, RefreshTokenRequest, Role, TokenResponse,
};
use classroom_models::classes::{ClassDetail, ClassResponse, CreateClassDto, Day, JoinClassDto};
use classroom_models::sections::{
    ClassSection, CreateSectionDto, SectionDetail, UpdateSectionDto,
};
use classroom_models::students::{
    EditProfileDto, RegisterStudentDto, ScheduleEntry, StudentBrief, StudentProfileResponse,
    StudentResponse,
};
use classroom_models::submissions::{
    StudentSubmission, StudentSubmissionForm, StudentSubmissionView, Submission,
    TeacherSubmissionForm,
};
use classroom_models::teachers::{RegisterTeacherDto, TeacherResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::refresh_token,
        crate::modules::students::controller::register_student,
        crate::modules::students::controller::login_student,
        crate::modules::students::controller::get_profile,
        crate::modules::students::controller::edit_profile,
        crate::modules::students::controller::delete_student,
        crate::modules::students::controller::get_schedule,
        crate::modules::students::controller::search_students,
        crate::modules::teachers::controller::register_teacher,
        crate::modules::teachers::controller::login_teacher,
        crate::modules::teachers::controller::get_profile,
        crate::modules::teachers::controller::get_classes,
        crate::modules::classes::controller::get_classes,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::join_class,
        crate::modules::classes::controller::leave_class,
        crate::modules::classes::controller::create_section,
        crate::modules::classes::controller::get_section,
        crate::modules::classes::controller::update_section,
        crate::modules::classes::controller::add_teacher_submission,
        crate::modules::classes::controller::get_student_submissions,
        crate::modules::classes::controller::add_student_submission,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            LoginRequest,
            TokenResponse,
            RefreshTokenRequest,
            Role,
            RegisterStudentDto,
            StudentResponse,
            StudentBrief,
            StudentProfileResponse,
            EditProfileDto,
            ScheduleEntry,
            RegisterTeacherDto,
            TeacherResponse,
            Day,
            CreateClassDto,
            ClassResponse,
            ClassDetail,
            JoinClassDto,
            ClassSection,
            CreateSectionDto,
            UpdateSectionDto,
            SectionDetail,
            Submission,
            StudentSubmission,
            StudentSubmissionView,
            TeacherSubmissionForm,
            StudentSubmissionForm,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Token refresh"),
        (name = "Students", description = "Student accounts, profiles and schedules"),
        (name = "Teachers", description = "Teacher accounts"),
        (name = "Classes", description = "Classes and enrollment by join key"),
        (name = "Sections", description = "Ordered sections inside a class"),
        (name = "Submissions", description = "Task briefs and student hand-ins")
    ),
    info(
        title = "Classroom API",
        version = "0.1.0",
        description = "Learning management backend: classes, sections and file submissions for students and teachers.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
