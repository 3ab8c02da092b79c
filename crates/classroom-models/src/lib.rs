//! # Classroom Models
//!
//! Domain models and DTOs for the Classroom API: database rows, request
//! payloads with their validation rules, and response shapes.
//!
//! # Modules
//!
//! - [`auth`]: Login, token and error response DTOs
//! - [`students`]: Student accounts, profiles and schedules
//! - [`teachers`]: Teacher accounts
//! - [`classes`]: Classes, weekdays and enrollment DTOs
//! - [`sections`]: Class sections
//! - [`submissions`]: Assignment briefs and student hand-ins

pub mod auth;
pub mod classes;
pub mod sections;
pub mod students;
pub mod submissions;
pub mod teachers;
pub mod validation;

pub use auth::{ErrorResponse, LoginRequest, MessageResponse, RefreshTokenRequest, TokenResponse};
pub use classes::{Class, ClassDetail, ClassResponse, Day};
pub use sections::{ClassSection, SectionDetail};
pub use students::{Student, StudentBrief, StudentProfile};
pub use submissions::{StudentSubmission, Submission, UploadedFile};
pub use teachers::Teacher;
