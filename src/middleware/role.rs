//! Role-based authorization for the two account kinds.
//!
//! Handlers either take one of the `Require*` extractors, which reject the
//! request before the handler runs, or call [`check_role`] themselves.

use classroom_auth::Role;
use classroom_core::AppError;

use crate::middleware::auth::AuthUser;

/// Fails with 403 unless the caller's role is one of `allowed`.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn handler(auth_user: AuthUser) -> Result<Json<Response>, AppError> {
///     check_role(&auth_user, &[Role::Teacher])?;
///     // Handler logic
/// }
/// ```
pub fn check_role(auth_user: &AuthUser, allowed: &[Role]) -> Result<(), AppError> {
    if !allowed.contains(&auth_user.role) {
        let allowed = allowed
            .iter()
            .map(|role| role.as_str())
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(AppError::forbidden(format!(
            "Access denied. This action is for {} accounts only",
            allowed
        )));
    }
    Ok(())
}

/// Declares an extractor that authenticates the caller and checks its role.
#[macro_export]
macro_rules! require_role {
    ($name:ident, [$($role:expr),+ $(,)?]) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = classroom_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                $crate::middleware::role::check_role(&auth_user, &[$($role),+])?;
                Ok($name(auth_user))
            }
        }
    };
}

require_role!(RequireStudent, [Role::Student]);
require_role!(RequireTeacher, [Role::Teacher]);
require_role!(RequireAnyRole, [Role::Student, Role::Teacher]);

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::ErrorKind;
    use uuid::Uuid;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_check_role_match() {
        assert!(check_role(&user(Role::Student), &[Role::Student]).is_ok());
        assert!(check_role(&user(Role::Teacher), &[Role::Student, Role::Teacher]).is_ok());
    }

    #[test]
    fn test_check_role_mismatch_is_forbidden() {
        let err = check_role(&user(Role::Student), &[Role::Teacher]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        assert!(err.error.to_string().contains("teacher"));
    }
}
