//! # Classroom Core
//!
//! Core types, errors, and utilities shared by every Classroom crate:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`file_storage`]: Object storage abstraction (local disk, hosted buckets)
//! - [`password`]: Password hashing and verification
//! - [`serde`]: Serde helpers for dates and `HH:MM` times
//!
//! # Example
//!
//! ```ignore
//! use classroom_core::errors::AppError;
//! use classroom_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("class not found"));
//! let hash = hash_password("secure_password", 8)?;
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod errors;
pub mod file_storage;
pub mod password;
pub mod serde;

pub use errors::{AppError, ErrorKind, Layer};
pub use file_storage::{FileStorage, StorageError};
pub use password::{hash_password, verify_password};

/// Boxed future used by object-safe async traits (storage backends, repositories).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
