use std::sync::Arc;

use classroom_auth::{Role, issue_token_pair};
use classroom_config::{JwtConfig, PasswordConfig};
use classroom_core::{AppError, Layer, hash_password, verify_password};
use classroom_models::auth::{LoginRequest, TokenResponse};
use classroom_models::students::{
    EditProfileDto, NewStudent, RegisterStudentDto, ScheduleEntry, Student,
    StudentProfile, StudentProfileResponse, StudentResponse,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::students::repository::StudentRepository;

pub(crate) const INVALID_CREDENTIALS: &str = "invalid email or password";

#[derive(Clone)]
pub struct StudentService {
    repo: Arc<dyn StudentRepository>,
    jwt_config: JwtConfig,
    password_config: PasswordConfig,
}

impl StudentService {
    pub fn new(
        repo: Arc<dyn StudentRepository>,
        jwt_config: JwtConfig,
        password_config: PasswordConfig,
    ) -> Self {
        Self {
            repo,
            jwt_config,
            password_config,
        }
    }

    /// Creates the account and signs it in.
    #[instrument(skip(self, dto), fields(email = %dto.email))]
    pub async fn register(&self, dto: RegisterStudentDto) -> Result<TokenResponse, AppError> {
        let password_hash = hash_password(&dto.password, self.password_config.bcrypt_cost)?;

        let student = self
            .repo
            .create(NewStudent {
                id: Uuid::new_v4(),
                name: dto.name.trim().to_string(),
                nim: dto.nim,
                email: dto.email.trim().to_string(),
                password_hash,
            })
            .await?;

        info!(student_id = %student.id, "Student registered");
        self.issue_tokens(student.id)
    }

    /// Unknown email and wrong password fail identically.
    #[instrument(skip(self, dto), fields(email = %dto.email))]
    pub async fn login(&self, dto: LoginRequest) -> Result<TokenResponse, AppError> {
        let unauthorized = || AppError::unauthorized(INVALID_CREDENTIALS.to_string());

        let student = self
            .repo
            .find_by_email(dto.email.trim())
            .await?
            .ok_or_else(unauthorized)?;

        if !verify_password(&dto.password, &student.password)? {
            return Err(unauthorized());
        }

        self.issue_tokens(student.id)
    }

    fn issue_tokens(&self, student_id: Uuid) -> Result<TokenResponse, AppError> {
        let (access_token, refresh_token) =
            issue_token_pair(student_id, Role::Student, &self.jwt_config)?;
        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_student(&self, id: Uuid) -> Result<Student, AppError> {
        self.repo.find_by_id(id).await?.ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("student not found")).at(Layer::Usecase)
        })
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, id: Uuid) -> Result<StudentProfileResponse, AppError> {
        let student = self.get_student(id).await?;
        let profile = self.repo.find_profile(id).await?;
        Ok(StudentProfileResponse::new(student, profile))
    }

    /// Creates the profile on first edit, afterwards merges the non-empty fields.
    #[instrument(skip(self, dto))]
    pub async fn edit_profile(
        &self,
        id: Uuid,
        dto: EditProfileDto,
    ) -> Result<StudentProfileResponse, AppError> {
        let student = self.get_student(id).await?;

        let profile = match self.repo.find_profile(id).await? {
            Some(mut existing) => {
                existing.merge(dto);
                existing
            }
            None => StudentProfile::from_edit(id, dto),
        };

        let saved = self.repo.save_profile(profile).await?;
        Ok(StudentProfileResponse::new(student, Some(saved)))
    }

    #[instrument(skip(self))]
    pub async fn delete_student(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.soft_delete(id).await? {
            return Err(
                AppError::not_found(anyhow::anyhow!("student not found")).at(Layer::Usecase)
            );
        }
        info!(student_id = %id, "Student deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<StudentResponse>, AppError> {
        let students = self.repo.search_by_name(name.trim()).await?;
        Ok(students.into_iter().map(StudentResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn schedule(&self, id: Uuid) -> Result<Vec<ScheduleEntry>, AppError> {
        let rows = self.repo.schedule(id).await?;
        Ok(rows.into_iter().map(ScheduleEntry::from).collect())
    }
}
