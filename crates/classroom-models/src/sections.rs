//! Class section models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::submissions::Submission;
use crate::validation::validate_not_blank;

/// An ordered unit of a class. `task` is set once a teacher posts an assignment brief.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct ClassSection {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub order: i32,
    pub task: bool,
    pub class_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSection {
    pub title: String,
    pub description: String,
    pub order: i32,
    pub class_id: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSectionDto {
    #[validate(custom(function = "validate_not_blank"), length(max = 255))]
    #[schema(example = "Week 1: Processes")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub order: i32,
}

impl CreateSectionDto {
    pub fn into_new_section(self, class_id: i32) -> NewSection {
        NewSection {
            title: self.title.trim().to_string(),
            description: self.description,
            order: self.order,
            class_id,
        }
    }
}

/// Partial section update. The task flag is not client-writable.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSectionDto {
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub order: Option<i32>,
}

impl ClassSection {
    /// Applies the non-empty fields of `dto`. An order of zero leaves the
    /// stored order unchanged.
    pub fn apply(&mut self, dto: UpdateSectionDto) {
        if let Some(title) = dto.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            self.title = title;
        }
        if let Some(description) = dto.description.filter(|d| !d.trim().is_empty()) {
            self.description = description;
        }
        if let Some(order) = dto.order.filter(|o| *o != 0) {
            self.order = order;
        }
    }
}

/// A section together with the assignment briefs posted to it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SectionDetail {
    pub section: ClassSection,
    pub submissions: Vec<Submission>,
}
