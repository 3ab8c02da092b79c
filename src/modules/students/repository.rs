use classroom_core::{AppError, BoxFuture};
use classroom_models::students::{NewStudent, ScheduleRow, Student, StudentProfile};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{escape_like, map_write_error};

/// Persistence for student accounts, their profiles and schedules.
///
/// Every read ignores soft-deleted rows.
pub trait StudentRepository: Send + Sync {
    /// Fails with a conflict when the email or NIM is already taken by a live account.
    fn create<'a>(&'a self, student: NewStudent) -> BoxFuture<'a, Result<Student, AppError>>;

    fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Student>, AppError>>;

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<Student>, AppError>>;

    fn search_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<Student>, AppError>>;

    /// Returns `false` when there was no live student to delete.
    fn soft_delete<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<bool, AppError>>;

    fn find_profile<'a>(
        &'a self,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<Option<StudentProfile>, AppError>>;

    /// Inserts the profile, or replaces the stored one for the same student.
    fn save_profile<'a>(
        &'a self,
        profile: StudentProfile,
    ) -> BoxFuture<'a, Result<StudentProfile, AppError>>;

    /// Live classes the student is enrolled in, ordered by day then start time.
    fn schedule<'a>(&'a self, student_id: Uuid) -> BoxFuture<'a, Result<Vec<ScheduleRow>, AppError>>;
}

const STUDENT_COLUMNS: &str = "id, name, nim, email, password, created_at, updated_at";

#[derive(Clone)]
pub struct PgStudentRepository {
    db: PgPool,
}

impl PgStudentRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl StudentRepository for PgStudentRepository {
    fn create<'a>(&'a self, student: NewStudent) -> BoxFuture<'a, Result<Student, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Student>(&format!(
                r#"INSERT INTO students (id, name, nim, email, password)
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING {STUDENT_COLUMNS}"#
            ))
            .bind(student.id)
            .bind(&student.name)
            .bind(student.nim)
            .bind(&student.email)
            .bind(&student.password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_write_error(e, "email or nim is already registered"))
        })
    }

    fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Student>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Student>(&format!(
                "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 AND deleted_at IS NULL"
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
    ) -> BoxFuture<'a, Result<Option<Student>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Student>(&format!(
                "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1 AND deleted_at IS NULL"
            ))
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn search_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<Student>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Student>(&format!(
                r#"SELECT {STUDENT_COLUMNS} FROM students
                   WHERE name ILIKE '%' || $1 || '%' ESCAPE '\' AND deleted_at IS NULL
                   ORDER BY name"#
            ))
            .bind(escape_like(name))
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn soft_delete<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<bool, AppError>> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE students SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(AppError::database)?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn find_profile<'a>(
        &'a self,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<Option<StudentProfile>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, StudentProfile>(
                r#"SELECT student_id, date_of_birth, gender, address, phone
                   FROM student_profile WHERE student_id = $1"#,
            )
            .bind(student_id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn save_profile<'a>(
        &'a self,
        profile: StudentProfile,
    ) -> BoxFuture<'a, Result<StudentProfile, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, StudentProfile>(
                r#"INSERT INTO student_profile (student_id, date_of_birth, gender, address, phone)
                   VALUES ($1, $2, $3, $4, $5)
                   ON CONFLICT (student_id) DO UPDATE
                   SET date_of_birth = EXCLUDED.date_of_birth,
                       gender = EXCLUDED.gender,
                       address = EXCLUDED.address,
                       phone = EXCLUDED.phone,
                       updated_at = NOW()
                   RETURNING student_id, date_of_birth, gender, address, phone"#,
            )
            .bind(profile.student_id)
            .bind(profile.date_of_birth)
            .bind(&profile.gender)
            .bind(&profile.address)
            .bind(&profile.phone)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn schedule<'a>(&'a self, student_id: Uuid) -> BoxFuture<'a, Result<Vec<ScheduleRow>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, ScheduleRow>(
                r#"SELECT c.id AS class_id, c.name AS class_name, c.day, c.start_time, c.end_time
                   FROM student_class sc
                   JOIN classes c ON c.id = sc.class_id
                   WHERE sc.student_id = $1
                     AND sc.deleted_at IS NULL
                     AND c.deleted_at IS NULL
                   ORDER BY c.day, c.start_time"#,
            )
            .bind(student_id)
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }
}
