use std::path::PathBuf;
use std::sync::Arc;

use classroom_config::{CorsConfig, JwtConfig, PasswordConfig, StorageBackend, StorageConfig};
use classroom_core::FileStorage;
use classroom_core::file_storage::{LocalFileStorage, SupabaseStorage, UploadLimits};
use sqlx::PgPool;
use tracing::info;

use crate::modules::auth::service::AuthService;
use crate::modules::classes::repository::{ClassRepository, PgClassRepository};
use crate::modules::classes::service::ClassService;
use crate::modules::students::repository::{PgStudentRepository, StudentRepository};
use crate::modules::students::service::StudentService;
use crate::modules::teachers::repository::{PgTeacherRepository, TeacherRepository};
use crate::modules::teachers::service::TeacherService;

#[derive(Clone)]
pub struct AppState {
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    /// Directory served under `/files` when submissions are stored locally.
    pub files_dir: Option<PathBuf>,
    /// Largest request body accepted on the upload routes.
    pub upload_body_limit: usize,
    pub auth_service: AuthService,
    pub student_service: StudentService,
    pub teacher_service: TeacherService,
    pub class_service: ClassService,
}

pub struct Repositories {
    pub students: Arc<dyn StudentRepository>,
    pub teachers: Arc<dyn TeacherRepository>,
    pub classes: Arc<dyn ClassRepository>,
}

/// One store per bucket: teacher briefs and student hand-ins.
pub struct SubmissionStorage {
    pub teacher: Arc<dyn FileStorage>,
    pub student: Arc<dyn FileStorage>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        storage: SubmissionStorage,
        jwt_config: JwtConfig,
        password_config: PasswordConfig,
        cors_config: CorsConfig,
    ) -> Self {
        let Repositories {
            students,
            teachers,
            classes,
        } = repositories;

        Self {
            auth_service: AuthService::new(students.clone(), teachers.clone(), jwt_config.clone()),
            student_service: StudentService::new(
                students.clone(),
                jwt_config.clone(),
                password_config.clone(),
            ),
            teacher_service: TeacherService::new(teachers, jwt_config.clone(), password_config),
            class_service: ClassService::new(classes, students, storage.teacher, storage.student),
            jwt_config,
            cors_config,
            files_dir: None,
            upload_body_limit: upload_body_limit(UploadLimits::default().max_file_size),
        }
    }

    pub fn with_files_dir(mut self, dir: PathBuf) -> Self {
        self.files_dir = Some(dir);
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.upload_body_limit = upload_body_limit(max_file_size);
        self
    }
}

/// Room for the other form fields and multipart framing around the file.
const FORM_OVERHEAD: usize = 64 * 1024;

fn upload_body_limit(max_file_size: usize) -> usize {
    max_file_size.saturating_add(FORM_OVERHEAD)
}

/// Builds the two submission stores for the configured backend.
pub fn init_storage(config: &StorageConfig) -> SubmissionStorage {
    let limits = UploadLimits {
        max_file_size: config.max_file_size,
        ..UploadLimits::default()
    };

    match config.backend {
        StorageBackend::Supabase => {
            let bucket = |name: &str| -> Arc<dyn FileStorage> {
                Arc::new(SupabaseStorage::new(
                    config.supabase_url.clone(),
                    config.supabase_key.clone(),
                    name.to_string(),
                    limits.clone(),
                ))
            };
            SubmissionStorage {
                teacher: bucket(&config.teacher_bucket),
                student: bucket(&config.student_bucket),
            }
        }
        StorageBackend::Local => {
            let base_url = config.public_base_url.trim_end_matches('/');
            let bucket = |name: &str| -> Arc<dyn FileStorage> {
                Arc::new(LocalFileStorage::with_limits(
                    PathBuf::from(&config.local_dir).join(name),
                    format!("{}/{}", base_url, name),
                    limits.clone(),
                ))
            };
            SubmissionStorage {
                teacher: bucket(&config.teacher_bucket),
                student: bucket(&config.student_bucket),
            }
        }
    }
}

pub fn init_app_state(db: PgPool) -> AppState {
    let storage_config = StorageConfig::from_env();
    info!(backend = ?storage_config.backend, "Initializing submission storage");

    let state = AppState::new(
        Repositories {
            students: Arc::new(PgStudentRepository::new(db.clone())),
            teachers: Arc::new(PgTeacherRepository::new(db.clone())),
            classes: Arc::new(PgClassRepository::new(db)),
        },
        init_storage(&storage_config),
        JwtConfig::from_env(),
        PasswordConfig::from_env(),
        CorsConfig::from_env(),
    )
    .with_max_file_size(storage_config.max_file_size);

    match storage_config.backend {
        StorageBackend::Local => state.with_files_dir(PathBuf::from(storage_config.local_dir)),
        StorageBackend::Supabase => state,
    }
}
