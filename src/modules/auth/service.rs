use std::sync::Arc;

use classroom_auth::{Role, issue_token_pair, verify_refresh_token};
use classroom_config::JwtConfig;
use classroom_core::AppError;
use classroom_models::auth::TokenResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::students::repository::StudentRepository;
use crate::modules::teachers::repository::TeacherRepository;

/// Exchanges refresh tokens for fresh token pairs.
#[derive(Clone)]
pub struct AuthService {
    students: Arc<dyn StudentRepository>,
    teachers: Arc<dyn TeacherRepository>,
    jwt_config: JwtConfig,
}

impl AuthService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        teachers: Arc<dyn TeacherRepository>,
        jwt_config: JwtConfig,
    ) -> Self {
        Self {
            students,
            teachers,
            jwt_config,
        }
    }

    /// The account named by the token must still exist.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, &self.jwt_config)?;
        let account_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid account ID in token".to_string()))?;

        let exists = match claims.role {
            Role::Student => self.students.find_by_id(account_id).await?.is_some(),
            Role::Teacher => self.teachers.find_by_id(account_id).await?.is_some(),
        };
        if !exists {
            return Err(AppError::unauthorized("Account no longer exists".to_string()));
        }

        let (access_token, refresh_token) =
            issue_token_pair(account_id, claims.role, &self.jwt_config)?;
        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use classroom_auth::{create_access_token, verify_token};
    use classroom_core::ErrorKind;
    use classroom_models::students::NewStudent;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "auth-service-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 7200,
        }
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair() {
        let store = Arc::new(InMemoryStore::new());
        let student = StudentRepository::create(
            store.as_ref(),
            NewStudent {
                id: Uuid::new_v4(),
                name: "Jane".to_string(),
                nim: 1,
                email: "jane@campus.edu".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();

        let service = AuthService::new(store.clone(), store, jwt_config());
        let (_, refresh) = issue_token_pair(student.id, Role::Student, &jwt_config()).unwrap();

        let tokens = service.refresh(&refresh).await.unwrap();
        let claims = verify_token(&tokens.access_token, &jwt_config()).unwrap();
        assert_eq!(claims.sub, student.id.to_string());
        assert_eq!(claims.role, Role::Student);
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_account_and_access_tokens() {
        let store = Arc::new(InMemoryStore::new());
        let service = AuthService::new(store.clone(), store, jwt_config());

        let (access, refresh) =
            issue_token_pair(Uuid::new_v4(), Role::Teacher, &jwt_config()).unwrap();
        let err = service.refresh(&refresh).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let err = service.refresh(&access).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);

        let plain = create_access_token(Uuid::new_v4(), Role::Student, &jwt_config()).unwrap();
        assert!(service.refresh(&plain).await.is_err());
    }
}
