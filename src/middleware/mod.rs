//! Extractors for authentication and role checks.
//!
//! - [`auth`]: `AuthUser`, read from the bearer token or the `token` cookie
//! - [`role`]: `RequireStudent`, `RequireTeacher` and [`role::check_role`]
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::role::RequireTeacher;
//!
//! async fn create_class(
//!     RequireTeacher(auth_user): RequireTeacher,
//! ) -> Result<Json<ClassResponse>, AppError> {
//!     // Only executes for a valid teacher token
//! }
//! ```

pub mod auth;
pub mod role;
