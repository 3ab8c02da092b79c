use classroom_core::{AppError, BoxFuture};
use classroom_models::classes::{Class, NewClass};
use classroom_models::sections::{ClassSection, NewSection};
use classroom_models::students::StudentBrief;
use classroom_models::submissions::{
    NewStudentSubmission, NewSubmission, StudentSubmission, StudentSubmissionView, Submission,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{escape_like, is_unique_violation, map_write_error};

/// Persistence for classes, enrollments, sections and submissions.
///
/// Reads never return soft-deleted rows, and sections of a deleted class are
/// treated as gone.
pub trait ClassRepository: Send + Sync {
    /// Fails with a conflict when the key collides with a live class.
    fn create<'a>(&'a self, class: NewClass) -> BoxFuture<'a, Result<Class, AppError>>;

    fn find_by_id<'a>(&'a self, id: i32) -> BoxFuture<'a, Result<Option<Class>, AppError>>;

    fn search_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<Class>, AppError>>;

    fn find_by_teacher<'a>(
        &'a self,
        teacher_id: Uuid,
    ) -> BoxFuture<'a, Result<Vec<Class>, AppError>>;

    fn soft_delete<'a>(&'a self, id: i32) -> BoxFuture<'a, Result<bool, AppError>>;

    /// Sections of a class ordered by their display position.
    fn sections_of<'a>(
        &'a self,
        class_id: i32,
    ) -> BoxFuture<'a, Result<Vec<ClassSection>, AppError>>;

    fn students_of<'a>(
        &'a self,
        class_id: i32,
    ) -> BoxFuture<'a, Result<Vec<StudentBrief>, AppError>>;

    fn is_enrolled<'a>(
        &'a self,
        class_id: i32,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<bool, AppError>>;

    /// Records a live enrollment. A second live enrollment of the same pair
    /// fails with `AlreadyEnrolled`.
    fn enroll<'a>(&'a self, class_id: i32, student_id: Uuid) -> BoxFuture<'a, Result<(), AppError>>;

    /// Soft-deletes the live enrollment. Returns `false` when there was none.
    fn unenroll<'a>(
        &'a self,
        class_id: i32,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<bool, AppError>>;

    fn create_section<'a>(
        &'a self,
        section: NewSection,
    ) -> BoxFuture<'a, Result<ClassSection, AppError>>;

    fn find_section<'a>(
        &'a self,
        id: i32,
    ) -> BoxFuture<'a, Result<Option<ClassSection>, AppError>>;

    /// Persists title, description and order. The task flag is left untouched.
    fn update_section<'a>(
        &'a self,
        section: ClassSection,
    ) -> BoxFuture<'a, Result<ClassSection, AppError>>;

    fn submissions_of_section<'a>(
        &'a self,
        section_id: i32,
    ) -> BoxFuture<'a, Result<Vec<Submission>, AppError>>;

    /// Inserts the brief and marks the section as having a task, atomically.
    fn add_teacher_submission<'a>(
        &'a self,
        submission: NewSubmission,
    ) -> BoxFuture<'a, Result<Submission, AppError>>;

    fn add_student_submission<'a>(
        &'a self,
        submission: NewStudentSubmission,
    ) -> BoxFuture<'a, Result<StudentSubmission, AppError>>;

    fn student_submissions_of_section<'a>(
        &'a self,
        section_id: i32,
    ) -> BoxFuture<'a, Result<Vec<StudentSubmissionView>, AppError>>;
}

const CLASS_COLUMNS: &str =
    "id, name, description, key, teacher_id, day, start_time, end_time, created_at, updated_at";

const SECTION_COLUMNS: &str =
    r#"id, title, description, "order", task, class_id, created_at, updated_at"#;

const SUBMISSION_COLUMNS: &str =
    "id, title, description, file, deadline, class_section_id, created_at";

#[derive(Clone)]
pub struct PgClassRepository {
    db: PgPool,
}

impl PgClassRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl ClassRepository for PgClassRepository {
    fn create<'a>(&'a self, class: NewClass) -> BoxFuture<'a, Result<Class, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Class>(&format!(
                r#"INSERT INTO classes (name, description, key, teacher_id, day, start_time, end_time)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING {CLASS_COLUMNS}"#
            ))
            .bind(&class.name)
            .bind(&class.description)
            .bind(&class.key)
            .bind(class.teacher_id)
            .bind(class.day.number())
            .bind(class.start_time)
            .bind(class.end_time)
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_write_error(e, "class key already in use"))
        })
    }

    fn find_by_id<'a>(&'a self, id: i32) -> BoxFuture<'a, Result<Option<Class>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Class>(&format!(
                "SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1 AND deleted_at IS NULL"
            ))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn search_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<Class>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Class>(&format!(
                r#"SELECT {CLASS_COLUMNS} FROM classes
                   WHERE name ILIKE '%' || $1 || '%' ESCAPE '\' AND deleted_at IS NULL
                   ORDER BY name, id"#
            ))
            .bind(escape_like(name))
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn find_by_teacher<'a>(
        &'a self,
        teacher_id: Uuid,
    ) -> BoxFuture<'a, Result<Vec<Class>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Class>(&format!(
                r#"SELECT {CLASS_COLUMNS} FROM classes
                   WHERE teacher_id = $1 AND deleted_at IS NULL
                   ORDER BY day, start_time"#
            ))
            .bind(teacher_id)
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn soft_delete<'a>(&'a self, id: i32) -> BoxFuture<'a, Result<bool, AppError>> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE classes SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(AppError::database)?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn sections_of<'a>(
        &'a self,
        class_id: i32,
    ) -> BoxFuture<'a, Result<Vec<ClassSection>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, ClassSection>(&format!(
                r#"SELECT {SECTION_COLUMNS} FROM class_sections
                   WHERE class_id = $1 AND deleted_at IS NULL
                   ORDER BY "order", id"#
            ))
            .bind(class_id)
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn students_of<'a>(
        &'a self,
        class_id: i32,
    ) -> BoxFuture<'a, Result<Vec<StudentBrief>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, StudentBrief>(
                r#"SELECT s.id, s.name
                   FROM student_class sc
                   JOIN students s ON s.id = sc.student_id
                   WHERE sc.class_id = $1
                     AND sc.deleted_at IS NULL
                     AND s.deleted_at IS NULL
                   ORDER BY s.name"#,
            )
            .bind(class_id)
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn is_enrolled<'a>(
        &'a self,
        class_id: i32,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<bool, AppError>> {
        Box::pin(async move {
            sqlx::query_scalar::<_, bool>(
                r#"SELECT EXISTS (
                       SELECT 1 FROM student_class
                       WHERE class_id = $1 AND student_id = $2 AND deleted_at IS NULL
                   )"#,
            )
            .bind(class_id)
            .bind(student_id)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn enroll<'a>(&'a self, class_id: i32, student_id: Uuid) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async move {
            sqlx::query("INSERT INTO student_class (class_id, student_id) VALUES ($1, $2)")
                .bind(class_id)
                .bind(student_id)
                .execute(&self.db)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        return AppError::already_enrolled();
                    }
                    AppError::database(e)
                })?;

            Ok(())
        })
    }

    fn unenroll<'a>(
        &'a self,
        class_id: i32,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<bool, AppError>> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"UPDATE student_class SET deleted_at = NOW()
                   WHERE class_id = $1 AND student_id = $2 AND deleted_at IS NULL"#,
            )
            .bind(class_id)
            .bind(student_id)
            .execute(&self.db)
            .await
            .map_err(AppError::database)?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn create_section<'a>(
        &'a self,
        section: NewSection,
    ) -> BoxFuture<'a, Result<ClassSection, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, ClassSection>(&format!(
                r#"INSERT INTO class_sections (title, description, "order", class_id)
                   VALUES ($1, $2, $3, $4)
                   RETURNING {SECTION_COLUMNS}"#
            ))
            .bind(&section.title)
            .bind(&section.description)
            .bind(section.order)
            .bind(section.class_id)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn find_section<'a>(
        &'a self,
        id: i32,
    ) -> BoxFuture<'a, Result<Option<ClassSection>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, ClassSection>(
                r#"SELECT cs.id, cs.title, cs.description, cs."order", cs.task, cs.class_id,
                          cs.created_at, cs.updated_at
                   FROM class_sections cs
                   JOIN classes c ON c.id = cs.class_id
                   WHERE cs.id = $1 AND cs.deleted_at IS NULL AND c.deleted_at IS NULL"#,
            )
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn update_section<'a>(
        &'a self,
        section: ClassSection,
    ) -> BoxFuture<'a, Result<ClassSection, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, ClassSection>(&format!(
                r#"UPDATE class_sections
                   SET title = $1, description = $2, "order" = $3, updated_at = NOW()
                   WHERE id = $4 AND deleted_at IS NULL
                   RETURNING {SECTION_COLUMNS}"#
            ))
            .bind(&section.title)
            .bind(&section.description)
            .bind(section.order)
            .bind(section.id)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("section not found")))
        })
    }

    fn submissions_of_section<'a>(
        &'a self,
        section_id: i32,
    ) -> BoxFuture<'a, Result<Vec<Submission>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, Submission>(&format!(
                r#"SELECT {SUBMISSION_COLUMNS} FROM submissions
                   WHERE class_section_id = $1 AND deleted_at IS NULL
                   ORDER BY created_at, id"#
            ))
            .bind(section_id)
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn add_teacher_submission<'a>(
        &'a self,
        submission: NewSubmission,
    ) -> BoxFuture<'a, Result<Submission, AppError>> {
        Box::pin(async move {
            let mut tx = self.db.begin().await.map_err(AppError::database)?;

            let created = sqlx::query_as::<_, Submission>(&format!(
                r#"INSERT INTO submissions (title, description, file, deadline, class_section_id)
                   VALUES ($1, $2, $3, $4, $5)
                   RETURNING {SUBMISSION_COLUMNS}"#
            ))
            .bind(&submission.title)
            .bind(&submission.description)
            .bind(&submission.file)
            .bind(submission.deadline)
            .bind(submission.class_section_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::database)?;

            sqlx::query(
                "UPDATE class_sections SET task = TRUE, updated_at = NOW() WHERE id = $1",
            )
            .bind(submission.class_section_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::database)?;

            tx.commit().await.map_err(AppError::database)?;

            Ok(created)
        })
    }

    fn add_student_submission<'a>(
        &'a self,
        submission: NewStudentSubmission,
    ) -> BoxFuture<'a, Result<StudentSubmission, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, StudentSubmission>(
                r#"INSERT INTO student_submissions (student_id, class_section_id, file)
                   VALUES ($1, $2, $3)
                   RETURNING id, student_id, class_section_id, file, created_at"#,
            )
            .bind(submission.student_id)
            .bind(submission.class_section_id)
            .bind(&submission.file)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::database)
        })
    }

    fn student_submissions_of_section<'a>(
        &'a self,
        section_id: i32,
    ) -> BoxFuture<'a, Result<Vec<StudentSubmissionView>, AppError>> {
        Box::pin(async move {
            sqlx::query_as::<_, StudentSubmissionView>(
                r#"SELECT ss.id, ss.student_id, s.name AS student_name, ss.file, ss.created_at
                   FROM student_submissions ss
                   JOIN students s ON s.id = ss.student_id
                   WHERE ss.class_section_id = $1 AND ss.deleted_at IS NULL
                   ORDER BY ss.created_at, ss.id"#,
            )
            .bind(section_id)
            .fetch_all(&self.db)
            .await
            .map_err(AppError::database)
        })
    }
}
