use std::sync::Arc;

use classroom_auth::{Role, issue_token_pair};
use classroom_config::{JwtConfig, PasswordConfig};
use classroom_core::{AppError, Layer, hash_password, verify_password};
use classroom_models::auth::{LoginRequest, TokenResponse};
use classroom_models::teachers::{NewTeacher, RegisterTeacherDto, Teacher};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::students::service::INVALID_CREDENTIALS;
use crate::modules::teachers::repository::TeacherRepository;

#[derive(Clone)]
pub struct TeacherService {
    repo: Arc<dyn TeacherRepository>,
    jwt_config: JwtConfig,
    password_config: PasswordConfig,
}

impl TeacherService {
    pub fn new(
        repo: Arc<dyn TeacherRepository>,
        jwt_config: JwtConfig,
        password_config: PasswordConfig,
    ) -> Self {
        Self {
            repo,
            jwt_config,
            password_config,
        }
    }

    #[instrument(skip(self, dto), fields(email = %dto.email))]
    pub async fn register(&self, dto: RegisterTeacherDto) -> Result<TokenResponse, AppError> {
        let password_hash = hash_password(&dto.password, self.password_config.bcrypt_cost)?;

        let teacher = self
            .repo
            .create(NewTeacher {
                id: Uuid::new_v4(),
                name: dto.name.trim().to_string(),
                npm: dto.npm,
                email: dto.email.trim().to_string(),
                password_hash,
            })
            .await?;

        info!(teacher_id = %teacher.id, "Teacher registered");
        self.issue_tokens(teacher.id)
    }

    #[instrument(skip(self, dto), fields(email = %dto.email))]
    pub async fn login(&self, dto: LoginRequest) -> Result<TokenResponse, AppError> {
        let unauthorized = || AppError::unauthorized(INVALID_CREDENTIALS.to_string());

        let teacher = self
            .repo
            .find_by_email(dto.email.trim())
            .await?
            .ok_or_else(unauthorized)?;

        if !verify_password(&dto.password, &teacher.password)? {
            return Err(unauthorized());
        }

        self.issue_tokens(teacher.id)
    }

    fn issue_tokens(&self, teacher_id: Uuid) -> Result<TokenResponse, AppError> {
        let (access_token, refresh_token) =
            issue_token_pair(teacher_id, Role::Teacher, &self.jwt_config)?;
        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_teacher(&self, id: Uuid) -> Result<Teacher, AppError> {
        self.repo.find_by_id(id).await?.ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("teacher not found")).at(Layer::Usecase)
        })
    }
}
