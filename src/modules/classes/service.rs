use std::sync::Arc;

use classroom_core::file_storage::key_segment;
use classroom_core::{AppError, ErrorKind, FileStorage, Layer};
use classroom_models::classes::{Class, ClassDetail, ClassResponse, CreateClassDto, NewClass};
use classroom_models::sections::{ClassSection, CreateSectionDto, SectionDetail, UpdateSectionDto};
use classroom_models::submissions::{
    CreateSubmissionDto, NewStudentSubmission, NewSubmission, StudentSubmission,
    StudentSubmissionView, Submission, UploadedFile,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::classes::key::generate_class_key;
use crate::modules::classes::repository::ClassRepository;
use crate::modules::students::repository::StudentRepository;

/// Produces candidate join keys.
pub type KeyGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Attempts at finding an unused join key before giving up.
pub const MAX_KEY_ATTEMPTS: usize = 5;

const NO_TASK_MESSAGE: &str = "there's currently no task here";

fn not_found(what: &str) -> AppError {
    AppError::not_found(anyhow::anyhow!("{} not found", what)).at(Layer::Usecase)
}

#[derive(Clone)]
pub struct ClassService {
    repo: Arc<dyn ClassRepository>,
    students: Arc<dyn StudentRepository>,
    teacher_storage: Arc<dyn FileStorage>,
    student_storage: Arc<dyn FileStorage>,
    key_generator: KeyGenerator,
}

impl ClassService {
    pub fn new(
        repo: Arc<dyn ClassRepository>,
        students: Arc<dyn StudentRepository>,
        teacher_storage: Arc<dyn FileStorage>,
        student_storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            repo,
            students,
            teacher_storage,
            student_storage,
            key_generator: Arc::new(generate_class_key),
        }
    }

    pub fn with_key_generator(mut self, key_generator: KeyGenerator) -> Self {
        self.key_generator = key_generator;
        self
    }

    /// Creates a class owned by `teacher_id` with a fresh join key.
    ///
    /// A key that collides with a live class is regenerated, up to
    /// [`MAX_KEY_ATTEMPTS`] times.
    #[instrument(skip(self, dto))]
    pub async fn create_class(
        &self,
        teacher_id: Uuid,
        dto: CreateClassDto,
    ) -> Result<ClassResponse, AppError> {
        let schedule = dto.schedule()?;

        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let new_class = NewClass {
                name: dto.name.trim().to_string(),
                description: dto.description.clone(),
                key: (self.key_generator)(),
                teacher_id,
                day: schedule.day,
                start_time: schedule.start_time,
                end_time: schedule.end_time,
            };

            match self.repo.create(new_class).await {
                Ok(class) => {
                    info!(class_id = class.id, "Class created");
                    return Ok(ClassResponse::with_key(class));
                }
                Err(err) if err.kind == ErrorKind::Conflict => {
                    warn!(attempt, "Class key collision, regenerating");
                }
                Err(err) => return Err(err),
            }
        }

        Err(AppError::internal_error(
            "could not generate a unique class key".to_string(),
        )
        .at(Layer::Usecase))
    }

    /// Loads the class with its ordered sections and enrolled students.
    /// The join key is only included for the owning teacher.
    #[instrument(skip(self))]
    pub async fn fetch_class_by_id(
        &self,
        class_id: i32,
        viewer_id: Uuid,
    ) -> Result<ClassDetail, AppError> {
        let class = self.load_class(class_id).await?;
        let sections = self.repo.sections_of(class_id).await?;
        let students = self.repo.students_of(class_id).await?;

        let is_owner = class.teacher_id == viewer_id;
        Ok(ClassDetail {
            class: ClassResponse::new(class, is_owner),
            sections,
            students,
        })
    }

    #[instrument(skip(self))]
    pub async fn fetch_classes_by_name(&self, name: &str) -> Result<Vec<ClassResponse>, AppError> {
        let classes = self.repo.search_by_name(name.trim()).await?;
        Ok(classes.into_iter().map(ClassResponse::without_key).collect())
    }

    #[instrument(skip(self))]
    pub async fn fetch_classes_by_teacher(
        &self,
        teacher_id: Uuid,
    ) -> Result<Vec<ClassResponse>, AppError> {
        let classes = self.repo.find_by_teacher(teacher_id).await?;
        Ok(classes.into_iter().map(ClassResponse::with_key).collect())
    }

    async fn load_class(&self, class_id: i32) -> Result<Class, AppError> {
        self.repo
            .find_by_id(class_id)
            .await?
            .ok_or_else(|| not_found("class"))
    }

    async fn load_section(&self, section_id: i32) -> Result<ClassSection, AppError> {
        self.repo
            .find_section(section_id)
            .await?
            .ok_or_else(|| not_found("section"))
    }

    /// Resolves the class and checks that `teacher_id` owns it.
    #[instrument(skip(self))]
    pub async fn ensure_class_owner(
        &self,
        class_id: i32,
        teacher_id: Uuid,
    ) -> Result<Class, AppError> {
        let class = self.load_class(class_id).await?;
        if class.teacher_id != teacher_id {
            return Err(AppError::forbidden(
                "only the teacher of this class can do that".to_string(),
            ));
        }
        Ok(class)
    }

    /// Resolves the section's class and checks that `teacher_id` owns it.
    #[instrument(skip(self))]
    pub async fn ensure_section_owner(
        &self,
        section_id: i32,
        teacher_id: Uuid,
    ) -> Result<ClassSection, AppError> {
        let section = self.load_section(section_id).await?;
        self.ensure_class_owner(section.class_id, teacher_id).await?;
        Ok(section)
    }

    #[instrument(skip(self))]
    pub async fn delete_class(&self, class_id: i32, teacher_id: Uuid) -> Result<(), AppError> {
        self.ensure_class_owner(class_id, teacher_id).await?;
        if !self.repo.soft_delete(class_id).await? {
            return Err(not_found("class"));
        }
        info!(class_id, "Class deleted");
        Ok(())
    }

    /// Enrolls a student who presents the class key.
    ///
    /// A wrong key is rejected before enrollment is looked at. The final
    /// insert is guarded by a unique index, so concurrent duplicate joins
    /// fail with `AlreadyEnrolled` instead of creating a second edge.
    #[instrument(skip(self, key))]
    pub async fn join_class(
        &self,
        class_id: i32,
        student_id: Uuid,
        key: &str,
    ) -> Result<(), AppError> {
        let class = self.load_class(class_id).await?;

        if class.key != key {
            return Err(AppError::invalid_key());
        }

        if self.repo.is_enrolled(class_id, student_id).await? {
            return Err(AppError::already_enrolled());
        }

        self.repo.enroll(class_id, student_id).await?;
        info!(class_id, student_id = %student_id, "Student joined class");
        Ok(())
    }

    pub async fn is_student_enrolled(
        &self,
        class_id: i32,
        student_id: Uuid,
    ) -> Result<bool, AppError> {
        self.repo.is_enrolled(class_id, student_id).await
    }

    #[instrument(skip(self))]
    pub async fn leave_class(&self, class_id: i32, student_id: Uuid) -> Result<(), AppError> {
        if !self.repo.unenroll(class_id, student_id).await? {
            return Err(
                AppError::not_found(anyhow::anyhow!("you are not enrolled in this class"))
                    .at(Layer::Usecase),
            );
        }
        info!(class_id, student_id = %student_id, "Student left class");
        Ok(())
    }

    /// Appends a section at the caller-given order. Ownership is checked by the caller.
    #[instrument(skip(self, dto))]
    pub async fn create_section(
        &self,
        class_id: i32,
        dto: CreateSectionDto,
    ) -> Result<ClassSection, AppError> {
        self.load_class(class_id).await?;
        self.repo
            .create_section(dto.into_new_section(class_id))
            .await
    }

    #[instrument(skip(self, dto))]
    pub async fn update_section(
        &self,
        section_id: i32,
        dto: UpdateSectionDto,
    ) -> Result<ClassSection, AppError> {
        let mut section = self.load_section(section_id).await?;
        section.apply(dto);
        self.repo.update_section(section).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_section_by_id(&self, section_id: i32) -> Result<SectionDetail, AppError> {
        let section = self.load_section(section_id).await?;
        let submissions = self.repo.submissions_of_section(section_id).await?;
        Ok(SectionDetail {
            section,
            submissions,
        })
    }

    /// Uploads the brief, then records it and opens the section's task.
    #[instrument(skip(self, dto, file), fields(file_size = file.bytes.len()))]
    pub async fn add_submission_teacher(
        &self,
        section_id: i32,
        dto: CreateSubmissionDto,
        file: UploadedFile,
    ) -> Result<Submission, AppError> {
        self.load_section(section_id).await?;

        let title = key_segment(&dto.title);
        let key = format!(
            "class_section/{}/{}-{}.pdf",
            section_id,
            title,
            Uuid::new_v4().simple()
        );
        let link = upload(
            self.teacher_storage.as_ref(),
            &key,
            &file,
            &format!("{}.pdf", title),
        )
        .await?;

        let result = self
            .repo
            .add_teacher_submission(NewSubmission {
                title: dto.title.trim().to_string(),
                description: dto.description,
                file: link,
                deadline: dto.deadline,
                class_section_id: section_id,
            })
            .await;

        if result.is_err() {
            discard_upload(self.teacher_storage.as_ref(), &key).await;
        }
        let submission = result?;

        info!(section_id, submission_id = submission.id, "Task opened");
        Ok(submission)
    }

    /// Stores a student's hand-in. Every call creates a new object and row.
    #[instrument(skip(self, file), fields(file_size = file.bytes.len()))]
    pub async fn add_submission_student(
        &self,
        student_id: Uuid,
        section_id: i32,
        file: UploadedFile,
    ) -> Result<StudentSubmission, AppError> {
        let section = self.load_section(section_id).await?;
        if !section.task {
            return Err(AppError::bad_request(anyhow::anyhow!(NO_TASK_MESSAGE)).at(Layer::Usecase));
        }

        let student = self
            .students
            .find_by_id(student_id)
            .await?
            .ok_or_else(|| not_found("student"))?;

        let download_name = format!(
            "{}-{}-{}.pdf",
            key_segment(&section.title),
            key_segment(&student.name),
            student.nim
        );
        let key = format!(
            "class_section/{}/{}-{}-{}.pdf",
            key_segment(&section.title),
            key_segment(&student.name),
            student.nim,
            Uuid::new_v4().simple()
        );
        let link = upload(self.student_storage.as_ref(), &key, &file, &download_name).await?;

        let result = self
            .repo
            .add_student_submission(NewStudentSubmission {
                student_id,
                class_section_id: section_id,
                file: link,
            })
            .await;

        if result.is_err() {
            discard_upload(self.student_storage.as_ref(), &key).await;
        }
        result
    }

    /// Lists hand-ins for a section the teacher owns.
    #[instrument(skip(self))]
    pub async fn fetch_submissions_by_section(
        &self,
        section_id: i32,
        teacher_id: Uuid,
    ) -> Result<Vec<StudentSubmissionView>, AppError> {
        self.ensure_section_owner(section_id, teacher_id).await?;
        self.repo.student_submissions_of_section(section_id).await
    }
}

/// Writes the file and returns its public link with a download file name.
async fn upload(
    storage: &dyn FileStorage,
    key: &str,
    file: &UploadedFile,
    download_name: &str,
) -> Result<String, AppError> {
    let stored = storage
        .save(key, &file.bytes, &file.content_type)
        .await
        .map_err(AppError::storage)?;
    let url = storage.get_url(&stored).map_err(AppError::storage)?;
    Ok(format!("{}?download={}", url, download_name))
}

async fn discard_upload(storage: &dyn FileStorage, key: &str) {
    if let Err(e) = storage.delete(key).await {
        warn!(key = %key, error = %e, "Failed to remove orphaned upload");
    }
}
