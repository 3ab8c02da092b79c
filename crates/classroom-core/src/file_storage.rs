//! File storage abstraction layer.
//!
//! Submissions are written through the [`FileStorage`] trait so the business
//! logic does not care whether bytes end up on local disk or in a hosted
//! object store bucket.
//!
//! # Example
//!
//! ```ignore
//! use classroom_core::file_storage::{FileStorage, LocalFileStorage};
//! use std::path::PathBuf;
//!
//! let storage = LocalFileStorage::new(
//!     PathBuf::from("./uploads"),
//!     "http://localhost:3000/files".to_string(),
//! );
//!
//! let key = storage.save("class_section/1/brief.pdf", &bytes, "application/pdf").await?;
//! let url = storage.get_url(&key)?;
//! ```

use std::path::PathBuf;

use tokio::fs;

use crate::BoxFuture;

/// Abstract trait for file storage backends.
pub trait FileStorage: Send + Sync {
    /// Save file content and return the storage key.
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the file (e.g., "class_section/3/brief.pdf")
    /// * `content` - File bytes to store
    /// * `content_type` - MIME type reported by the uploader
    fn save<'a>(
        &'a self,
        key: &'a str,
        content: &'a [u8],
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>>;

    /// Delete a file by key. Missing files are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Get the public URL for accessing a file.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;
}

/// Error type for file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("MIME type '{received}' not allowed. Allowed types: {}", .allowed.join(", "))]
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("File not found")]
    NotFound,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Object store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object store responded with status {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Size and type limits applied before any bytes are written.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_mime_types: vec!["application/pdf".to_string()],
        }
    }
}

impl UploadLimits {
    pub fn check(&self, content: &[u8], content_type: &str) -> Result<(), StorageError> {
        if content.len() > self.max_file_size {
            return Err(StorageError::InvalidFileSize {
                max_bytes: self.max_file_size,
            });
        }

        if !self.allowed_mime_types.iter().any(|t| t == content_type) {
            return Err(StorageError::InvalidMimeType {
                received: content_type.to_string(),
                allowed: self.allowed_mime_types.clone(),
            });
        }

        Ok(())
    }
}

/// Validate storage key format to prevent path traversal.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Key must not be empty, contain '..', or start with '/'".to_string(),
        ));
    }

    if !key
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
    {
        return Err(StorageError::InvalidKey(
            "Key contains invalid characters".to_string(),
        ));
    }

    Ok(())
}

/// Turns free text (a section title, a student name) into a single key segment.
///
/// Anything outside `[A-Za-z0-9_-]` becomes `-`, runs of `-` collapse, and the
/// result is never empty.
pub fn key_segment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Local filesystem-based file storage implementation.
#[derive(Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,

    /// Base URL for public file access (e.g., "http://localhost:3000/files")
    base_url: String,

    limits: UploadLimits,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String) -> Self {
        Self::with_limits(base_dir, base_url, UploadLimits::default())
    }

    pub fn with_limits(base_dir: PathBuf, base_url: String, limits: UploadLimits) -> Self {
        Self {
            base_dir,
            base_url,
            limits,
        }
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(
        &'a self,
        key: &'a str,
        content: &'a [u8],
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            validate_key(key)?;
            self.limits.check(content, content_type)?;

            let file_path = self.base_dir.join(key);

            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }

            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            validate_key(key)?;

            let file_path = self.base_dir.join(key);

            match fs::remove_file(&file_path).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}

/// Storage backed by a Supabase-compatible object storage REST API.
///
/// Objects are uploaded to `{base_url}/object/{bucket}/{key}` with a service
/// key, and served from `{base_url}/object/public/{bucket}/{key}`.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
    limits: UploadLimits,
}

impl SupabaseStorage {
    pub fn new(base_url: String, service_key: String, bucket: String, limits: UploadLimits) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket,
            limits,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, self.bucket, key)
    }

    async fn check_response(response: reqwest::Response) -> Result<(), StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

impl FileStorage for SupabaseStorage {
    fn save<'a>(
        &'a self,
        key: &'a str,
        content: &'a [u8],
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(async move {
            validate_key(key)?;
            self.limits.check(content, content_type)?;

            let response = self
                .client
                .post(self.object_url(key))
                .bearer_auth(&self.service_key)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .header("x-upsert", "true")
                .body(content.to_vec())
                .send()
                .await?;

            Self::check_response(response).await?;
            tracing::debug!(bucket = %self.bucket, key = %key, "Uploaded object");

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            validate_key(key)?;

            let response = self
                .client
                .delete(self.object_url(key))
                .bearer_auth(&self.service_key)
                .send()
                .await?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(());
            }
            Self::check_response(response).await
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!(
            "{}/object/public/{}/{}",
            self.base_url, self.bucket, key
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("classroom-storage-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_validate_key_accepts_valid_keys() {
        assert!(validate_key("class_section/12/brief.pdf").is_ok());
        assert!(validate_key("class_section/Week-1/Jane-Doe-42.pdf").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_path_traversal() {
        assert!(validate_key("../../../etc/passwd").is_err());
        assert!(validate_key("..\\windows\\system32").is_err());
    }

    #[test]
    fn test_validate_key_rejects_absolute_paths() {
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("\\windows\\system32").is_err());
    }

    #[test]
    fn test_key_segment() {
        assert_eq!(key_segment("Week 1: Intro"), "Week-1-Intro");
        assert_eq!(key_segment("  Jane   Doe "), "Jane-Doe");
        assert_eq!(key_segment("../"), "file");
        assert_eq!(key_segment(""), "file");
    }

    #[test]
    fn test_upload_limits() {
        let limits = UploadLimits {
            max_file_size: 4,
            allowed_mime_types: vec!["application/pdf".to_string()],
        };

        assert!(limits.check(b"%PDF", "application/pdf").is_ok());
        assert!(matches!(
            limits.check(b"%PDF-1.7", "application/pdf"),
            Err(StorageError::InvalidFileSize { max_bytes: 4 })
        ));
        assert!(matches!(
            limits.check(b"png", "image/png"),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[test]
    fn test_get_url_handles_trailing_slash() {
        let storage = LocalFileStorage::new(
            PathBuf::from("./uploads"),
            "http://localhost:3000/files/".to_string(),
        );

        let url = storage.get_url("class_section/1/brief.pdf").unwrap();
        assert_eq!(url, "http://localhost:3000/files/class_section/1/brief.pdf");
    }

    #[test]
    fn test_supabase_public_url() {
        let storage = SupabaseStorage::new(
            "https://project.supabase.co/storage/v1/".to_string(),
            "service-key".to_string(),
            "submissions_student".to_string(),
            UploadLimits::default(),
        );

        let url = storage.get_url("class_section/Intro/Jane-1.pdf").unwrap();
        assert_eq!(
            url,
            "https://project.supabase.co/storage/v1/object/public/submissions_student/class_section/Intro/Jane-1.pdf"
        );
    }

    #[tokio::test]
    async fn test_local_save_and_delete() {
        let dir = temp_dir("save");
        let storage = LocalFileStorage::new(dir.clone(), "http://localhost/files".to_string());

        let key = storage
            .save("class_section/1/brief.pdf", b"%PDF-1.4", "application/pdf")
            .await
            .unwrap();
        assert_eq!(key, "class_section/1/brief.pdf");
        assert!(dir.join(&key).exists());

        storage.delete(&key).await.unwrap();
        assert!(!dir.join(&key).exists());

        // deleting twice is fine
        storage.delete(&key).await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }
}
