use anyhow::anyhow;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::request::Parts,
};
use classroom_core::{AppError, Layer};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

pub fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value
        .validate()
        .map_err(|errors| AppError::validation(anyhow!("{}", format_errors(&errors))))
}

/// JSON body that has been deserialized and passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let error_msg = rejection.body_text();

                let err = if error_msg.contains("missing field") {
                    let field = error_msg
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    anyhow!("{} is required", field)
                } else if error_msg.contains("invalid type") {
                    anyhow!("Invalid field type in request")
                } else if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    anyhow!("Missing 'Content-Type: application/json' header")
                } else {
                    anyhow!("Invalid request body")
                };

                AppError::bad_request(err).at(Layer::Handler)
            })?;

        validate(&value)?;

        Ok(ValidatedJson(value))
    }
}

/// Path parameters whose rejection is reported as an `AppError` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                let err = match rejection {
                    PathRejection::FailedToDeserializePathParams(inner) => {
                        anyhow!("Invalid path parameter: {}", inner.body_text())
                    }
                    _ => anyhow!("Invalid request path"),
                };
                AppError::bad_request(err).at(Layer::Handler)
            })?;

        Ok(ValidatedPath(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::ErrorKind;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 8, message = "password must be at least 8 characters"))]
        password: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_validate_collects_messages() {
        let err = validate(&Signup {
            password: "short".to_string(),
            email: "nope".to_string(),
        })
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        let message = err.error.to_string();
        assert!(message.contains("password must be at least 8 characters"));
        assert!(message.contains("email is invalid"));
    }
}
