//! Teacher domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_not_blank;

/// A teacher account as stored in the database, including the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct Teacher {
    pub id: Uuid,
    pub name: String,
    pub npm: i64,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeacherResponse {
    pub id: Uuid,
    pub name: String,
    pub npm: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Teacher> for TeacherResponse {
    fn from(teacher: Teacher) -> Self {
        Self {
            id: teacher.id,
            name: teacher.name,
            npm: teacher.npm,
            email: teacher.email,
            created_at: teacher.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTeacher {
    pub id: Uuid,
    pub name: String,
    pub npm: i64,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterTeacherDto {
    #[validate(custom(function = "validate_not_blank"), length(max = 255))]
    #[schema(example = "Dr. Ada Lovelace")]
    pub name: String,
    #[validate(range(min = 1, message = "npm must be a positive number"))]
    pub npm: i64,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let dto = RegisterTeacherDto {
            name: "Ada".to_string(),
            npm: 7,
            email: "ada@campus.edu".to_string(),
            password: "password123".to_string(),
        };
        assert!(dto.validate().is_ok());

        let dto = RegisterTeacherDto { npm: 0, ..dto };
        assert!(dto.validate().is_err());
    }
}
