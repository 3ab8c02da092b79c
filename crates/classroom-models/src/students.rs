//! Student domain models and DTOs.
//!
//! A [`Student`] row holds the account itself. Personal details live in a
//! separate [`StudentProfile`] that only exists once the student edits it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use classroom_core::serde::{deserialize_optional_date, serialize_time_hm};

use crate::classes::Day;
use crate::validation::validate_not_blank;

/// A student account as stored in the database, including the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub nim: i64,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a student account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentResponse {
    pub id: Uuid,
    pub name: String,
    pub nim: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            nim: student.nim,
            email: student.email,
            created_at: student.created_at,
        }
    }
}

/// Minimal student reference used in class rosters and submission lists.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct StudentBrief {
    pub id: Uuid,
    pub name: String,
}

/// Fields needed to insert a student.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub id: Uuid,
    pub name: String,
    pub nim: i64,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterStudentDto {
    #[validate(custom(function = "validate_not_blank"), length(max = 255))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[validate(range(min = 1, message = "nim must be a positive number"))]
    #[schema(example = 2201001)]
    pub nim: i64,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

/// Optional personal details attached to a student.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct StudentProfile {
    pub student_id: Uuid,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub address: String,
    pub phone: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl StudentProfile {
    /// Builds the first profile of a student from exactly the supplied fields.
    pub fn from_edit(student_id: Uuid, dto: EditProfileDto) -> Self {
        Self {
            student_id,
            date_of_birth: dto.date_of_birth,
            gender: non_empty(dto.gender).unwrap_or_default(),
            address: non_empty(dto.address).unwrap_or_default(),
            phone: non_empty(dto.phone).unwrap_or_default(),
        }
    }

    /// Overwrites only the fields that were supplied and non-empty.
    pub fn merge(&mut self, dto: EditProfileDto) {
        if let Some(date_of_birth) = dto.date_of_birth {
            self.date_of_birth = Some(date_of_birth);
        }
        if let Some(gender) = non_empty(dto.gender) {
            self.gender = gender;
        }
        if let Some(address) = non_empty(dto.address) {
            self.address = address;
        }
        if let Some(phone) = non_empty(dto.phone) {
            self.phone = phone;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EditProfileDto {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    #[schema(value_type = Option<String>, example = "2003-05-17")]
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Student account joined with its (possibly missing) profile.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub nim: i64,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: String,
    pub address: String,
    pub phone: String,
}

impl StudentProfileResponse {
    pub fn new(student: Student, profile: Option<StudentProfile>) -> Self {
        let profile = profile.unwrap_or_default();
        Self {
            id: student.id,
            name: student.name,
            nim: student.nim,
            email: student.email,
            date_of_birth: profile.date_of_birth,
            gender: profile.gender,
            address: profile.address,
            phone: profile.phone,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StudentQuery {
    /// Case-insensitive substring of the student name
    pub name: Option<String>,
}

/// One enrolled class as read for the schedule.
#[derive(Debug, Clone, FromRow)]
pub struct ScheduleRow {
    pub class_id: i32,
    pub class_name: String,
    pub day: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleEntry {
    pub class_id: i32,
    pub class_name: String,
    #[schema(example = "monday")]
    pub day: String,
    #[serde(serialize_with = "serialize_time_hm")]
    #[schema(value_type = String, example = "08:00")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "serialize_time_hm")]
    #[schema(value_type = String, example = "09:40")]
    pub end_time: NaiveTime,
}

impl From<ScheduleRow> for ScheduleEntry {
    fn from(row: ScheduleRow) -> Self {
        Self {
            class_id: row.class_id,
            class_name: row.class_name,
            day: Day::render(row.day),
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}
