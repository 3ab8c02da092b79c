//! # Classroom Config
//!
//! Configuration types for the Classroom API, loaded from environment variables:
//!
//! - [`jwt`]: JWT signing secret and token lifetimes
//! - [`cors`]: CORS allowed origins
//! - [`password`]: bcrypt work factor
//! - [`storage`]: Object storage backend and bucket names
//! - [`server`]: Bind address and log directory
//!
//! # Example
//!
//! ```ignore
//! use classroom_config::{JwtConfig, StorageConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let storage_config = StorageConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod password;
pub mod server;
pub mod storage;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use password::PasswordConfig;
pub use server::ServerConfig;
pub use storage::{StorageBackend, StorageConfig};
