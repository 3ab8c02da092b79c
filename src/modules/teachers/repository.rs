use classroom_core::{AppError, BoxFuture};
use classroom_models::teachers::{NewTeacher, Teacher};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::map_write_error;

pub trait TeacherRepository: Send + Sync {
    /// Fails with a conflict when the email or NPM is already taken by a live account.
    fn create<'a>(&'a self, teacher: NewTeacher) -> BoxFuture<'a, Result<Teacher, AppError>>;

    fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Teacher>, AppError>>;

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<Teacher>, AppError>>;
}

const TEACHER_COLUMNS: &str = "id, name, npm, email, password, created_at, updated_at";

#[derive(Clone)]
pub struct PgTeacherRepository {
    db: PgPool,
}

impl PgTeacherRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl TeacherRepository for PgTeacherRepository {
    fn create<'a>(&'a self, teacher: NewTeacher) -> BoxFuture<'a, Result<Teacher, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Teacher>(&format!(
                r#"INSERT INTO teachers (id, name, npm, email, password)
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING {TEACHER_COLUMNS}"#
            ))
            .bind(teacher.id)
            .bind(&teacher.name)
            .bind(teacher.npm)
            .bind(&teacher.email)
            .bind(&teacher.password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_write_error(e, "email or npm is already registered"))
        })
    }

    fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Teacher>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Teacher>(&format!(
                "SELECT {TEACHER_COLUMNS} FROM teachers WHERE id = $1 AND deleted_at IS NULL"
            ))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<Teacher>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Teacher>(&format!(
                "SELECT {TEACHER_COLUMNS} FROM teachers WHERE email = $1 AND deleted_at IS NULL"
            ))
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
        })
    }
}
