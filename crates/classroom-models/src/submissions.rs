//! Submission models: assignment briefs posted by teachers and the files
//! students hand in against them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Assignment brief attached to a section by its teacher.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Submission {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Download link of the brief
    pub file: String,
    pub deadline: Option<DateTime<Utc>>,
    pub class_section_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub title: String,
    pub description: String,
    pub file: String,
    pub deadline: Option<DateTime<Utc>>,
    pub class_section_id: i32,
}

/// Text fields of the teacher's multipart upload.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateSubmissionDto {
    #[validate(custom(function = "validate_not_blank"), length(max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// A file a student handed in for a section.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct StudentSubmission {
    pub id: i32,
    pub student_id: Uuid,
    pub class_section_id: i32,
    pub file: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStudentSubmission {
    pub student_id: Uuid,
    pub class_section_id: i32,
    pub file: String,
}

/// Student submission joined with the submitting student's name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct StudentSubmissionView {
    pub id: i32,
    pub student_id: Uuid,
    pub student_name: String,
    pub file: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Multipart body schema for documentation.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct TeacherSubmissionForm {
    title: String,
    description: Option<String>,
    /// RFC 3339 timestamp
    deadline: Option<String>,
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Multipart body schema for documentation.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct StudentSubmissionForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}
