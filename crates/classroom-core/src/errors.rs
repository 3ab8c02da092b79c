//! Application error type with HTTP response conversion.
//!
//! Every fallible operation in the API returns [`AppError`]. An error carries
//! three things:
//!
//! - an [`ErrorKind`] that decides the HTTP status,
//! - the [`Layer`] it was raised in (handler, usecase, repository, ...),
//! - the underlying cause as an [`anyhow::Error`].
//!
//! The response body is `{"error": "<cause>", "layer": "<layer>"}`.

use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::file_storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    BadRequest,
    Conflict,
    AlreadyEnrolled,
    InvalidKey,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Validation
            | Self::BadRequest
            | Self::Conflict
            | Self::AlreadyEnrolled
            | Self::InvalidKey => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Where in the request pipeline an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Handler,
    Usecase,
    Repository,
    Model,
    Auth,
    Storage,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handler => "handler",
            Self::Usecase => "usecase",
            Self::Repository => "repository",
            Self::Model => "model",
            Self::Auth => "auth",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub layer: Layer,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(kind: ErrorKind, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind,
            layer: Layer::Handler,
            error: err.into(),
        }
    }

    /// Re-tags the error with the layer it originated in.
    pub fn at(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Internal, err)
    }

    pub fn internal_error(message: String) -> Self {
        Self::new(ErrorKind::Internal, anyhow::anyhow!(message))
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::NotFound, err)
    }

    pub fn validation<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Validation, err).at(Layer::Model)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::BadRequest, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Conflict, err).at(Layer::Repository)
    }

    pub fn already_enrolled() -> Self {
        Self::new(
            ErrorKind::AlreadyEnrolled,
            anyhow::anyhow!("you have already joined this class"),
        )
        .at(Layer::Usecase)
    }

    pub fn invalid_key() -> Self {
        Self::new(ErrorKind::InvalidKey, anyhow::anyhow!("invalid class key")).at(Layer::Usecase)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Internal, err).at(Layer::Repository)
    }

    pub fn unauthorized(message: String) -> Self {
        Self::new(ErrorKind::Unauthorized, anyhow::anyhow!(message)).at(Layer::Auth)
    }

    pub fn forbidden(message: String) -> Self {
        Self::new(ErrorKind::Forbidden, anyhow::anyhow!(message)).at(Layer::Auth)
    }

    /// Maps an object store failure. Rejected uploads are the client's fault,
    /// everything else is a server error.
    pub fn storage(err: StorageError) -> Self {
        let kind = match err {
            StorageError::InvalidFileSize { .. }
            | StorageError::InvalidMimeType { .. }
            | StorageError::InvalidKey(_) => ErrorKind::BadRequest,
            _ => ErrorKind::Internal,
        };
        Self::new(kind, err).at(Layer::Storage)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {} : {}", self.layer, self.error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.kind == ErrorKind::Internal {
            tracing::error!(layer = %self.layer, error = ?self.error, "Internal error");
        }

        let body = Json(json!({
            "error": self.error.to_string(),
            "layer": self.layer,
        }));

        (self.status(), body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::AlreadyEnrolled.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::InvalidKey.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorKind::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_includes_layer() {
        let err = AppError::not_found(anyhow::anyhow!("class not found")).at(Layer::Repository);
        assert_eq!(err.to_string(), "error at repository : class not found");
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.layer, Layer::Handler);
    }

    #[test]
    fn test_storage_size_error_is_bad_request() {
        let err = AppError::storage(StorageError::InvalidFileSize { max_bytes: 10 });
        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(err.layer, Layer::Storage);

        let err = AppError::storage(StorageError::NotFound);
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = AppError::invalid_key().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid class key");
        assert_eq!(body["layer"], "usecase");
    }
}
