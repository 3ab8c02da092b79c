//! Class domain models and DTOs.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use classroom_core::AppError;
use classroom_core::serde::{parse_time_hm, serialize_time_hm};

use crate::sections::ClassSection;
use crate::students::StudentBrief;
use crate::validation::validate_not_blank;

/// Weekday a class meets on. Stored as 1 (monday) through 7 (sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Parses a lowercase-insensitive day name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|day| day.name() == name)
    }

    pub fn from_number(number: i16) -> Option<Self> {
        usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn number(self) -> i16 {
        match self {
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
            Self::Sunday => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Renders a stored day number; unknown numbers render as an empty string.
    pub fn render(number: i16) -> String {
        Self::from_number(number)
            .map(|day| day.name().to_string())
            .unwrap_or_default()
    }
}

/// A class row as stored in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Class {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub key: String,
    pub teacher_id: Uuid,
    pub day: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a class.
#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub description: String,
    pub key: String,
    pub teacher_id: Uuid,
    pub day: Day,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// When a class meets, parsed from the wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassSchedule {
    pub day: Day,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    #[validate(custom(function = "validate_not_blank"), length(max = 255))]
    #[schema(example = "Operating Systems")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = "monday")]
    pub day: String,
    #[schema(example = "08:00")]
    pub start_time: String,
    #[schema(example = "09:40")]
    pub end_time: String,
}

impl CreateClassDto {
    /// Parses the day name and `HH:MM` times.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown day, a malformed time, or a
    /// start time that is not before the end time.
    pub fn schedule(&self) -> Result<ClassSchedule, AppError> {
        let day = Day::from_name(&self.day).ok_or_else(|| {
            AppError::validation(anyhow::anyhow!("day must be a weekday name, e.g. monday"))
        })?;

        let start_time = parse_time_hm(&self.start_time).ok_or_else(|| {
            AppError::validation(anyhow::anyhow!("start_time must use the HH:MM format"))
        })?;
        let end_time = parse_time_hm(&self.end_time).ok_or_else(|| {
            AppError::validation(anyhow::anyhow!("end_time must use the HH:MM format"))
        })?;

        if start_time >= end_time {
            return Err(AppError::validation(anyhow::anyhow!(
                "start_time must be before end_time"
            )));
        }

        Ok(ClassSchedule {
            day,
            start_time,
            end_time,
        })
    }
}

/// Class as returned to clients. The join key is only present for the owning teacher.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub teacher_id: Uuid,
    #[schema(example = "monday")]
    pub day: String,
    #[serde(serialize_with = "serialize_time_hm")]
    #[schema(value_type = String, example = "08:00")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "serialize_time_hm")]
    #[schema(value_type = String, example = "09:40")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl ClassResponse {
    pub fn new(class: Class, include_key: bool) -> Self {
        Self {
            id: class.id,
            name: class.name,
            description: class.description,
            key: include_key.then_some(class.key),
            teacher_id: class.teacher_id,
            day: Day::render(class.day),
            start_time: class.start_time,
            end_time: class.end_time,
            created_at: class.created_at,
        }
    }

    pub fn with_key(class: Class) -> Self {
        Self::new(class, true)
    }

    pub fn without_key(class: Class) -> Self {
        Self::new(class, false)
    }
}

/// A class with its ordered sections and enrolled students.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassDetail {
    pub class: ClassResponse,
    pub sections: Vec<ClassSection>,
    pub students: Vec<StudentBrief>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct JoinClassDto {
    #[validate(length(min = 1, message = "key is required"))]
    #[schema(example = "aBcDeFgH")]
    pub key: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ClassQuery {
    /// Substring of the class name
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(day: &str, start: &str, end: &str) -> CreateClassDto {
        CreateClassDto {
            name: "Algorithms".to_string(),
            description: String::new(),
            day: day.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
        }
    }

    #[test]
    fn test_day_round_trip() {
        for (i, day) in Day::ALL.into_iter().enumerate() {
            let number = i as i16 + 1;
            assert_eq!(day.number(), number);
            assert_eq!(Day::from_number(number), Some(day));
            assert_eq!(Day::from_name(day.name()), Some(day));
        }
    }

    #[test]
    fn test_day_unknown_values() {
        assert_eq!(Day::from_name("funday"), None);
        assert_eq!(Day::from_name(""), None);
        assert_eq!(Day::from_number(0), None);
        assert_eq!(Day::from_number(8), None);
        assert_eq!(Day::from_number(-1), None);
        assert_eq!(Day::render(9), "");
        assert_eq!(Day::from_name(" Friday "), Some(Day::Friday));
    }

    #[test]
    fn test_schedule_parses() {
        let schedule = dto("wednesday", "13:00", "14:40").schedule().unwrap();
        assert_eq!(schedule.day, Day::Wednesday);
        assert_eq!(schedule.start_time, NaiveTime::from_hms_opt(13, 0, 0).unwrap());
    }

    #[test]
    fn test_schedule_rejects_bad_input() {
        assert!(dto("someday", "08:00", "09:00").schedule().is_err());
        assert!(dto("monday", "8am", "09:00").schedule().is_err());
        assert!(dto("monday", "10:00", "09:00").schedule().is_err());
        assert!(dto("monday", "09:00", "09:00").schedule().is_err());
    }

    #[test]
    fn test_response_hides_key() {
        let class = Class {
            id: 1,
            name: "Algorithms".to_string(),
            description: String::new(),
            key: "abcdEFGH".to_string(),
            teacher_id: Uuid::new_v4(),
            day: 2,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 40, 0).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let hidden = serde_json::to_value(ClassResponse::without_key(class.clone())).unwrap();
        assert!(hidden.get("key").is_none());
        assert_eq!(hidden["day"], "tuesday");
        assert_eq!(hidden["start_time"], "08:00");

        let shown = serde_json::to_value(ClassResponse::with_key(class)).unwrap();
        assert_eq!(shown["key"], "abcdEFGH");
    }
}
