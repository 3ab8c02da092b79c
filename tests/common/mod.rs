use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use classroom::memory::{InMemoryStore, MemoryFileStorage};
use classroom::router::init_router;
use classroom::state::{AppState, Repositories, SubmissionStorage};
use classroom_config::{CorsConfig, JwtConfig, PasswordConfig};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const BOUNDARY: &str = "classroom-test-boundary";

pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub teacher_files: Arc<MemoryFileStorage>,
    #[allow(dead_code)]
    pub student_files: Arc<MemoryFileStorage>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn setup_test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    build_test_app(Repositories {
        students: store.clone(),
        teachers: store.clone(),
        classes: store,
    })
}

pub fn build_test_app(repositories: Repositories) -> TestApp {
    let teacher_files = Arc::new(MemoryFileStorage::new("https://files.test/teacher"));
    let student_files = Arc::new(MemoryFileStorage::new("https://files.test/student"));

    let jwt_config = JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    };

    let state = AppState::new(
        repositories,
        SubmissionStorage {
            teacher: teacher_files.clone(),
            student: student_files.clone(),
        },
        jwt_config,
        PasswordConfig { bcrypt_cost: 4 },
        CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
    );

    TestApp {
        router: init_router(state),
        teacher_files,
        student_files,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    #[allow(dead_code)]
    pub async fn register_student(&self, name: &str, nim: i64) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/students/register",
                None,
                json!({
                    "name": name,
                    "nim": nim,
                    "email": generate_unique_email(),
                    "password": "testpass123"
                }),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        access_token(&response)
    }

    #[allow(dead_code)]
    pub async fn register_teacher(&self, name: &str, npm: i64) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/api/teachers/register",
                None,
                json!({
                    "name": name,
                    "npm": npm,
                    "email": generate_unique_email(),
                    "password": "testpass123"
                }),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        access_token(&response)
    }
}

pub fn access_token(response: &TestResponse) -> String {
    response.body["access_token"]
        .as_str()
        .expect("access_token in body")
        .to_string()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// One part of a multipart form: `(name, file name, content type, bytes)`.
#[allow(dead_code)]
pub type Part<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a [u8]);

#[allow(dead_code)]
pub fn multipart_request(uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
            ),
        }
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}
