//! Runs against a real database. Needs `DATABASE_URL`; run with
//! `cargo test -- --ignored`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveTime;
use classroom::modules::classes::repository::{ClassRepository, PgClassRepository};
use classroom::modules::students::repository::{PgStudentRepository, StudentRepository};
use classroom::modules::teachers::repository::{PgTeacherRepository, TeacherRepository};
use classroom::state::Repositories;
use classroom_core::ErrorKind;
use classroom_models::classes::{Class, Day, NewClass};
use classroom_models::sections::NewSection;
use classroom_models::students::NewStudent;
use classroom_models::submissions::NewSubmission;
use classroom_models::teachers::NewTeacher;
use common::{TestApp, build_test_app, empty_request, generate_unique_email, json_request};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn setup_pg_app(pool: PgPool) -> TestApp {
    build_test_app(Repositories {
        students: Arc::new(PgStudentRepository::new(pool.clone())),
        teachers: Arc::new(PgTeacherRepository::new(pool.clone())),
        classes: Arc::new(PgClassRepository::new(pool)),
    })
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_pg_duplicate_email_allowed_after_soft_delete(pool: PgPool) {
    let app = setup_pg_app(pool);
    let email = generate_unique_email();
    let register = |nim: i64| {
        json_request(
            "POST",
            "/api/students/register",
            None,
            json!({"name": "Jane Doe", "nim": nim, "email": email, "password": "testpass123"}),
        )
    };

    let response = app.send(register(2201001)).await;
    assert_eq!(response.status, StatusCode::CREATED);
    let token = common::access_token(&response);

    let response = app.send(register(2201002)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .send(empty_request("DELETE", "/api/students", Some(&token)))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.send(register(2201001)).await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_pg_join_and_schedule(pool: PgPool) {
    let app = setup_pg_app(pool);
    let teacher = app.register_teacher("Dr. Smith", 1980001).await;
    let student = app.register_student("Jane Doe", 2201003).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/classes",
            Some(&teacher),
            json!({"name": "Operating Systems", "day": "tuesday", "start_time": "10:00", "end_time": "11:40"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let class = response.body;
    let join_uri = format!("/api/classes/{}/join", class["id"]);

    let response = app
        .send(json_request("POST", &join_uri, Some(&student), json!({"key": class["key"]})))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .send(json_request("POST", &join_uri, Some(&student), json!({"key": class["key"]})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .send(empty_request("GET", "/api/students/schedule", Some(&student)))
        .await;
    let schedule = response.body.as_array().unwrap();
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0]["day"], "tuesday");
    assert_eq!(schedule[0]["start_time"], "10:00");
}

async fn seed_class(pool: &PgPool, key: &str) -> Class {
    let teacher = PgTeacherRepository::new(pool.clone())
        .create(NewTeacher {
            id: Uuid::new_v4(),
            name: "Dr. Smith".to_string(),
            npm: 1980100,
            email: generate_unique_email(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();

    PgClassRepository::new(pool.clone())
        .create(new_class(teacher.id, key))
        .await
        .unwrap()
}

fn new_class(teacher_id: Uuid, key: &str) -> NewClass {
    NewClass {
        name: "Operating Systems".to_string(),
        description: String::new(),
        key: key.to_string(),
        teacher_id,
        day: Day::Monday,
        start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(9, 40, 0).unwrap(),
    }
}

fn section(class_id: i32, title: &str) -> NewSection {
    NewSection {
        title: title.to_string(),
        description: String::new(),
        order: 1,
        class_id,
    }
}

fn brief(section_id: i32) -> NewSubmission {
    NewSubmission {
        title: "Essay".to_string(),
        description: String::new(),
        file: "https://files.test/teacher/essay.pdf?download=Essay.pdf".to_string(),
        deadline: None,
        class_section_id: section_id,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_pg_duplicate_live_key_is_conflict(pool: PgPool) {
    let classes = PgClassRepository::new(pool.clone());
    let first = seed_class(&pool, "ABCDEFGH").await;

    let err = classes
        .create(new_class(first.teacher_id, "ABCDEFGH"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    assert!(classes.soft_delete(first.id).await.unwrap());
    let reused = classes
        .create(new_class(first.teacher_id, "ABCDEFGH"))
        .await
        .unwrap();
    assert_eq!(reused.key, "ABCDEFGH");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_pg_duplicate_enrollment_is_already_enrolled(pool: PgPool) {
    let classes = PgClassRepository::new(pool.clone());
    let class = seed_class(&pool, "QWERTYUI").await;
    let student = PgStudentRepository::new(pool.clone())
        .create(NewStudent {
            id: Uuid::new_v4(),
            name: "Jane Doe".to_string(),
            nim: 2201100,
            email: generate_unique_email(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();

    classes.enroll(class.id, student.id).await.unwrap();
    let err = classes.enroll(class.id, student.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyEnrolled);

    assert!(classes.unenroll(class.id, student.id).await.unwrap());
    classes.enroll(class.id, student.id).await.unwrap();
    assert!(classes.is_enrolled(class.id, student.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_pg_brief_and_task_flag_commit_together(pool: PgPool) {
    let classes = PgClassRepository::new(pool.clone());
    let class = seed_class(&pool, "ZXCVBNMA").await;
    let opened = classes.create_section(section(class.id, "Week 1")).await.unwrap();
    let locked = classes.create_section(section(class.id, "Week 2")).await.unwrap();

    classes.add_teacher_submission(brief(opened.id)).await.unwrap();
    let opened = classes.find_section(opened.id).await.unwrap().unwrap();
    assert!(opened.task);

    sqlx::query(
        r#"CREATE FUNCTION reject_section_update() RETURNS trigger AS $$
           BEGIN RAISE EXCEPTION 'section locked'; END;
           $$ LANGUAGE plpgsql"#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        r#"CREATE TRIGGER lock_sections BEFORE UPDATE ON class_sections
           FOR EACH ROW EXECUTE FUNCTION reject_section_update()"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    assert!(classes.add_teacher_submission(brief(locked.id)).await.is_err());

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM submissions WHERE class_section_id = $1")
            .bind(locked.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_pg_search_matches_wildcards_literally(pool: PgPool) {
    let app = setup_pg_app(pool);
    let teacher = app.register_teacher("Dr. Smith", 1980002).await;

    for name in ["100% Rust", "Go"] {
        let response = app
            .send(json_request(
                "POST",
                "/api/classes",
                Some(&teacher),
                json!({"name": name, "day": "monday", "start_time": "08:00", "end_time": "09:00"}),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let response = app
        .send(empty_request("GET", "/api/classes?name=%25", Some(&teacher)))
        .await;
    let found = response.body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "100% Rust");

    let response = app
        .send(empty_request("GET", "/api/classes?name=_", Some(&teacher)))
        .await;
    assert!(response.body.as_array().unwrap().is_empty());
}
