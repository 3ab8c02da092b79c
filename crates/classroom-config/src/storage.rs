use std::env;

/// Which object store the submission files are written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Supabase,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "supabase" => Some(Self::Supabase),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Storage REST endpoint, e.g. `https://<project>.supabase.co/storage/v1`.
    pub supabase_url: String,
    pub supabase_key: String,
    /// Directory used by the local backend.
    pub local_dir: String,
    /// Public URL prefix the local backend serves files from.
    pub public_base_url: String,
    pub teacher_bucket: String,
    pub student_bucket: String,
    pub max_file_size: usize,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|s| StorageBackend::parse(&s))
                .unwrap_or(StorageBackend::Local),
            supabase_url: env::var("SUPABASE_STORAGE_URL").unwrap_or_default(),
            supabase_key: env::var("SUPABASE_KEY").unwrap_or_default(),
            local_dir: env::var("STORAGE_LOCAL_DIR")
                .unwrap_or_else(|_| "storage/uploads".to_string()),
            public_base_url: env::var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000/files".to_string()),
            teacher_bucket: env::var("STORAGE_TEACHER_BUCKET")
                .unwrap_or_else(|_| "submissions_teacher".to_string()),
            student_bucket: env::var("STORAGE_STUDENT_BUCKET")
                .unwrap_or_else(|_| "submissions_student".to_string()),
            max_file_size: env::var("STORAGE_MAX_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024), // 10MB
        }
    }
}
