//! In-memory implementations of the repositories and of [`FileStorage`].
//!
//! They mirror the Postgres behaviour closely enough to drive the services
//! and the router in tests without a database: uniqueness only applies to
//! live rows, soft-deleted rows are invisible to reads, and sections of a
//! deleted class are gone.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use classroom_core::file_storage::{UploadLimits, validate_key};
use classroom_core::{AppError, BoxFuture, FileStorage, StorageError};
use classroom_models::classes::{Class, NewClass};
use classroom_models::sections::{ClassSection, NewSection};
use classroom_models::students::{NewStudent, ScheduleRow, Student, StudentBrief, StudentProfile};
use classroom_models::submissions::{
    NewStudentSubmission, NewSubmission, StudentSubmission, StudentSubmissionView, Submission,
};
use classroom_models::teachers::{NewTeacher, Teacher};
use uuid::Uuid;

use crate::modules::classes::repository::ClassRepository;
use crate::modules::students::repository::StudentRepository;
use crate::modules::teachers::repository::TeacherRepository;

struct Row<T> {
    value: T,
    deleted_at: Option<DateTime<Utc>>,
}

impl<T> Row<T> {
    fn live(value: T) -> Self {
        Self {
            value,
            deleted_at: None,
        }
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    students: Vec<Row<Student>>,
    profiles: HashMap<Uuid, StudentProfile>,
    teachers: Vec<Row<Teacher>>,
    classes: Vec<Row<Class>>,
    sections: Vec<Row<ClassSection>>,
    enrollments: Vec<Row<(i32, Uuid)>>,
    submissions: Vec<Submission>,
    student_submissions: Vec<StudentSubmission>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn live_student(&self, id: Uuid) -> Option<&Student> {
        self.students
            .iter()
            .find(|r| r.is_live() && r.value.id == id)
            .map(|r| &r.value)
    }

    fn live_class(&self, id: i32) -> Option<&Class> {
        self.classes
            .iter()
            .find(|r| r.is_live() && r.value.id == id)
            .map(|r| &r.value)
    }

    fn is_enrolled(&self, class_id: i32, student_id: Uuid) -> bool {
        self.enrollments
            .iter()
            .any(|r| r.is_live() && r.value == (class_id, student_id))
    }
}

/// Shared backing store for every repository trait.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::internal_error("in-memory store poisoned".to_string()))
    }

    fn run<'a, T, F>(&'a self, op: F) -> BoxFuture<'a, Result<T, AppError>>
    where
        T: Send + 'a,
        F: FnOnce(&mut Tables) -> Result<T, AppError>,
    {
        let result = self.tables().and_then(|mut tables| op(&mut tables));
        Box::pin(std::future::ready(result))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl StudentRepository for InMemoryStore {
    fn create<'a>(&'a self, student: NewStudent) -> BoxFuture<'a, Result<Student, AppError>> {
        self.run(move |t| {
            let taken = t.students.iter().any(|r| {
                r.is_live() && (r.value.email == student.email || r.value.nim == student.nim)
            });
            if taken {
                return Err(AppError::conflict(anyhow::anyhow!(
                    "email or nim is already registered"
                )));
            }

            let now = Utc::now();
            let row = Student {
                id: student.id,
                name: student.name,
                nim: student.nim,
                email: student.email,
                password: student.password_hash,
                created_at: now,
                updated_at: now,
            };
            t.students.push(Row::live(row.clone()));
            Ok(row)
        })
    }

    fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Student>, AppError>> {
        self.run(move |t| Ok(t.live_student(id).cloned()))
    }

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<Student>, AppError>> {
        self.run(move |t| {
            Ok(t.students
                .iter()
                .find(|r| r.is_live() && r.value.email == email)
                .map(|r| r.value.clone()))
        })
    }

    fn search_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<Student>, AppError>> {
        self.run(move |t| {
            let mut found: Vec<Student> = t
                .students
                .iter()
                .filter(|r| r.is_live() && contains_ignore_case(&r.value.name, name))
                .map(|r| r.value.clone())
                .collect();
            found.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(found)
        })
    }

    fn soft_delete<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<bool, AppError>> {
        self.run(move |t| {
            match t
                .students
                .iter_mut()
                .find(|r| r.is_live() && r.value.id == id)
            {
                Some(row) => {
                    row.deleted_at = Some(Utc::now());
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn find_profile<'a>(
        &'a self,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<Option<StudentProfile>, AppError>> {
        self.run(move |t| Ok(t.profiles.get(&student_id).cloned()))
    }

    fn save_profile<'a>(
        &'a self,
        profile: StudentProfile,
    ) -> BoxFuture<'a, Result<StudentProfile, AppError>> {
        self.run(move |t| {
            t.profiles.insert(profile.student_id, profile.clone());
            Ok(profile)
        })
    }

    fn schedule<'a>(&'a self, student_id: Uuid) -> BoxFuture<'a, Result<Vec<ScheduleRow>, AppError>> {
        self.run(move |t| {
            let mut rows: Vec<ScheduleRow> = t
                .enrollments
                .iter()
                .filter(|r| r.is_live() && r.value.1 == student_id)
                .filter_map(|r| t.live_class(r.value.0))
                .map(|c| ScheduleRow {
                    class_id: c.id,
                    class_name: c.name.clone(),
                    day: c.day,
                    start_time: c.start_time,
                    end_time: c.end_time,
                })
                .collect();
            rows.sort_by_key(|r| (r.day, r.start_time));
            Ok(rows)
        })
    }
}

impl TeacherRepository for InMemoryStore {
    fn create<'a>(&'a self, teacher: NewTeacher) -> BoxFuture<'a, Result<Teacher, AppError>> {
        self.run(move |t| {
            let taken = t.teachers.iter().any(|r| {
                r.is_live() && (r.value.email == teacher.email || r.value.npm == teacher.npm)
            });
            if taken {
                return Err(AppError::conflict(anyhow::anyhow!(
                    "email or npm is already registered"
                )));
            }

            let now = Utc::now();
            let row = Teacher {
                id: teacher.id,
                name: teacher.name,
                npm: teacher.npm,
                email: teacher.email,
                password: teacher.password_hash,
                created_at: now,
                updated_at: now,
            };
            t.teachers.push(Row::live(row.clone()));
            Ok(row)
        })
    }

    fn find_by_id<'a>(&'a self, id: Uuid) -> BoxFuture<'a, Result<Option<Teacher>, AppError>> {
        self.run(move |t| {
            Ok(t.teachers
                .iter()
                .find(|r| r.is_live() && r.value.id == id)
                .map(|r| r.value.clone()))
        })
    }

    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> BoxFuture<'a, Result<Option<Teacher>, AppError>> {
        self.run(move |t| {
            Ok(t.teachers
                .iter()
                .find(|r| r.is_live() && r.value.email == email)
                .map(|r| r.value.clone()))
        })
    }
}

impl ClassRepository for InMemoryStore {
    fn create<'a>(&'a self, class: NewClass) -> BoxFuture<'a, Result<Class, AppError>> {
        self.run(move |t| {
            if t.classes
                .iter()
                .any(|r| r.is_live() && r.value.key == class.key)
            {
                return Err(AppError::conflict(anyhow::anyhow!("class key already in use")));
            }

            let now = Utc::now();
            let row = Class {
                id: t.next_id(),
                name: class.name,
                description: class.description,
                key: class.key,
                teacher_id: class.teacher_id,
                day: class.day.number(),
                start_time: class.start_time,
                end_time: class.end_time,
                created_at: now,
                updated_at: now,
            };
            t.classes.push(Row::live(row.clone()));
            Ok(row)
        })
    }

    fn find_by_id<'a>(&'a self, id: i32) -> BoxFuture<'a, Result<Option<Class>, AppError>> {
        self.run(move |t| Ok(t.live_class(id).cloned()))
    }

    fn search_by_name<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<Class>, AppError>> {
        self.run(move |t| {
            let mut found: Vec<Class> = t
                .classes
                .iter()
                .filter(|r| r.is_live() && contains_ignore_case(&r.value.name, name))
                .map(|r| r.value.clone())
                .collect();
            found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(found)
        })
    }

    fn find_by_teacher<'a>(
        &'a self,
        teacher_id: Uuid,
    ) -> BoxFuture<'a, Result<Vec<Class>, AppError>> {
        self.run(move |t| {
            let mut found: Vec<Class> = t
                .classes
                .iter()
                .filter(|r| r.is_live() && r.value.teacher_id == teacher_id)
                .map(|r| r.value.clone())
                .collect();
            found.sort_by_key(|c| (c.day, c.start_time));
            Ok(found)
        })
    }

    fn soft_delete<'a>(&'a self, id: i32) -> BoxFuture<'a, Result<bool, AppError>> {
        self.run(move |t| {
            match t
                .classes
                .iter_mut()
                .find(|r| r.is_live() && r.value.id == id)
            {
                Some(row) => {
                    row.deleted_at = Some(Utc::now());
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn sections_of<'a>(
        &'a self,
        class_id: i32,
    ) -> BoxFuture<'a, Result<Vec<ClassSection>, AppError>> {
        self.run(move |t| {
            let mut found: Vec<ClassSection> = t
                .sections
                .iter()
                .filter(|r| r.is_live() && r.value.class_id == class_id)
                .map(|r| r.value.clone())
                .collect();
            found.sort_by_key(|s| (s.order, s.id));
            Ok(found)
        })
    }

    fn students_of<'a>(
        &'a self,
        class_id: i32,
    ) -> BoxFuture<'a, Result<Vec<StudentBrief>, AppError>> {
        self.run(move |t| {
            let mut found: Vec<StudentBrief> = t
                .enrollments
                .iter()
                .filter(|r| r.is_live() && r.value.0 == class_id)
                .filter_map(|r| t.live_student(r.value.1))
                .map(|s| StudentBrief {
                    id: s.id,
                    name: s.name.clone(),
                })
                .collect();
            found.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(found)
        })
    }

    fn is_enrolled<'a>(
        &'a self,
        class_id: i32,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<bool, AppError>> {
        self.run(move |t| Ok(t.is_enrolled(class_id, student_id)))
    }

    fn enroll<'a>(&'a self, class_id: i32, student_id: Uuid) -> BoxFuture<'a, Result<(), AppError>> {
        self.run(move |t| {
            if t.is_enrolled(class_id, student_id) {
                return Err(AppError::already_enrolled());
            }
            t.enrollments.push(Row::live((class_id, student_id)));
            Ok(())
        })
    }

    fn unenroll<'a>(
        &'a self,
        class_id: i32,
        student_id: Uuid,
    ) -> BoxFuture<'a, Result<bool, AppError>> {
        self.run(move |t| {
            match t
                .enrollments
                .iter_mut()
                .find(|r| r.is_live() && r.value == (class_id, student_id))
            {
                Some(row) => {
                    row.deleted_at = Some(Utc::now());
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn create_section<'a>(
        &'a self,
        section: NewSection,
    ) -> BoxFuture<'a, Result<ClassSection, AppError>> {
        self.run(move |t| {
            let now = Utc::now();
            let row = ClassSection {
                id: t.next_id(),
                title: section.title,
                description: section.description,
                order: section.order,
                task: false,
                class_id: section.class_id,
                created_at: now,
                updated_at: now,
            };
            t.sections.push(Row::live(row.clone()));
            Ok(row)
        })
    }

    fn find_section<'a>(
        &'a self,
        id: i32,
    ) -> BoxFuture<'a, Result<Option<ClassSection>, AppError>> {
        self.run(move |t| {
            Ok(t.sections
                .iter()
                .find(|r| r.is_live() && r.value.id == id)
                .filter(|r| t.live_class(r.value.class_id).is_some())
                .map(|r| r.value.clone()))
        })
    }

    fn update_section<'a>(
        &'a self,
        section: ClassSection,
    ) -> BoxFuture<'a, Result<ClassSection, AppError>> {
        self.run(move |t| {
            let row = t
                .sections
                .iter_mut()
                .find(|r| r.is_live() && r.value.id == section.id)
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("section not found")))?;

            row.value.title = section.title;
            row.value.description = section.description;
            row.value.order = section.order;
            row.value.updated_at = Utc::now();
            Ok(row.value.clone())
        })
    }

    fn submissions_of_section<'a>(
        &'a self,
        section_id: i32,
    ) -> BoxFuture<'a, Result<Vec<Submission>, AppError>> {
        self.run(move |t| {
            Ok(t.submissions
                .iter()
                .filter(|s| s.class_section_id == section_id)
                .cloned()
                .collect())
        })
    }

    fn add_teacher_submission<'a>(
        &'a self,
        submission: NewSubmission,
    ) -> BoxFuture<'a, Result<Submission, AppError>> {
        self.run(move |t| {
            let id = t.next_id();
            let section = t
                .sections
                .iter_mut()
                .find(|r| r.is_live() && r.value.id == submission.class_section_id)
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("section not found")))?;
            section.value.task = true;

            let row = Submission {
                id,
                title: submission.title,
                description: submission.description,
                file: submission.file,
                deadline: submission.deadline,
                class_section_id: submission.class_section_id,
                created_at: Utc::now(),
            };
            t.submissions.push(row.clone());
            Ok(row)
        })
    }

    fn add_student_submission<'a>(
        &'a self,
        submission: NewStudentSubmission,
    ) -> BoxFuture<'a, Result<StudentSubmission, AppError>> {
        self.run(move |t| {
            let row = StudentSubmission {
                id: t.next_id(),
                student_id: submission.student_id,
                class_section_id: submission.class_section_id,
                file: submission.file,
                created_at: Utc::now(),
            };
            t.student_submissions.push(row.clone());
            Ok(row)
        })
    }

    fn student_submissions_of_section<'a>(
        &'a self,
        section_id: i32,
    ) -> BoxFuture<'a, Result<Vec<StudentSubmissionView>, AppError>> {
        self.run(move |t| {
            Ok(t.student_submissions
                .iter()
                .filter(|s| s.class_section_id == section_id)
                .filter_map(|s| {
                    let student = t.students.iter().find(|r| r.value.id == s.student_id)?;
                    Some(StudentSubmissionView {
                        id: s.id,
                        student_id: s.student_id,
                        student_name: student.value.name.clone(),
                        file: s.file.clone(),
                        created_at: s.created_at,
                    })
                })
                .collect())
        })
    }
}

/// Object store kept in a map, applying the same key and upload checks as
/// the real backends.
pub struct MemoryFileStorage {
    base_url: String,
    limits: UploadLimits,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStorage {
    pub fn new(base_url: &str) -> Self {
        Self::with_limits(base_url, UploadLimits::default())
    }

    pub fn with_limits(base_url: &str, limits: UploadLimits) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            limits,
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn objects(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.objects.lock().map_err(|_| {
            StorageError::IoError(std::io::Error::other("in-memory storage poisoned"))
        })
    }
}

impl FileStorage for MemoryFileStorage {
    fn save<'a>(
        &'a self,
        key: &'a str,
        content: &'a [u8],
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        let result = validate_key(key)
            .and_then(|_| self.limits.check(content, content_type))
            .and_then(|_| {
                self.objects()?.insert(key.to_string(), content.to_vec());
                Ok(key.to_string())
            });
        Box::pin(std::future::ready(result))
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        let result = validate_key(key).and_then(|_| {
            self.objects()?.remove(key);
            Ok(())
        });
        Box::pin(std::future::ready(result))
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!("{}/{}", self.base_url, key))
    }
}
