mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{
    access_token, empty_request, generate_unique_email, json_request, setup_test_app,
};
use serde_json::json;

#[tokio::test]
async fn test_student_register_then_login_sets_cookie() {
    let app = setup_test_app();
    let email = generate_unique_email();

    let response = app
        .send(json_request(
            "POST",
            "/api/students/register",
            None,
            json!({"name": "Jane Doe", "nim": 2201001, "email": email, "password": "testpass123"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body.get("access_token").is_some());
    assert!(response.body.get("refresh_token").is_some());

    let response = app
        .send(json_request(
            "POST",
            "/api/students/login",
            None,
            json!({"email": email, "password": "testpass123"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let cookie = response
        .headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("set-cookie header");
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains(&access_token(&response)));
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let app = setup_test_app();
    let email = generate_unique_email();

    app.send(json_request(
        "POST",
        "/api/students/register",
        None,
        json!({"name": "Jane Doe", "nim": 2201002, "email": email, "password": "testpass123"}),
    ))
    .await;

    let wrong_password = app
        .send(json_request(
            "POST",
            "/api/students/login",
            None,
            json!({"email": email, "password": "wrongpass123"}),
        ))
        .await;
    let unknown_email = app
        .send(json_request(
            "POST",
            "/api/students/login",
            None,
            json!({"email": "nobody@test.com", "password": "testpass123"}),
        ))
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body["error"], unknown_email.body["error"]);
}

#[tokio::test]
async fn test_duplicate_student_email_rejected() {
    let app = setup_test_app();
    let email = generate_unique_email();
    let body = json!({"name": "Jane Doe", "nim": 2201003, "email": email, "password": "testpass123"});

    let first = app
        .send(json_request("POST", "/api/students/register", None, body))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .send(json_request(
            "POST",
            "/api/students/register",
            None,
            json!({"name": "John Roe", "nim": 2201004, "email": email, "password": "testpass123"}),
        ))
        .await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = setup_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/students/register",
            None,
            json!({"name": "Jane Doe", "nim": 2201005, "email": "not-an-email", "password": "short"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            "POST",
            "/api/teachers/register",
            None,
            json!({"name": "Dr. Smith", "email": generate_unique_email(), "password": "testpass123"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_requires_login() {
    let app = setup_test_app();

    let response = app
        .send(empty_request("GET", "/api/students/profile", None))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .send(empty_request("GET", "/api/students/profile", Some("garbage")))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_accepts_cookie_token() {
    let app = setup_test_app();
    let token = app.register_student("Jane Doe", 2201006).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/students/profile")
        .header(header::COOKIE, format!("token={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Jane Doe");
    assert_eq!(response.body["nim"], 2201006);
}

#[tokio::test]
async fn test_edit_profile_merges_fields() {
    let app = setup_test_app();
    let token = app.register_student("Jane Doe", 2201007).await;

    let response = app
        .send(json_request(
            "PUT",
            "/api/students/profile",
            Some(&token),
            json!({"gender": "female", "address": "Jl. Merdeka 1"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .send(json_request(
            "PUT",
            "/api/students/profile",
            Some(&token),
            json!({"phone": "08123456789", "address": ""}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .send(empty_request("GET", "/api/students/profile", Some(&token)))
        .await;
    assert_eq!(response.body["gender"], "female");
    assert_eq!(response.body["address"], "Jl. Merdeka 1");
    assert_eq!(response.body["phone"], "08123456789");
}

#[tokio::test]
async fn test_role_guards() {
    let app = setup_test_app();
    let student = app.register_student("Jane Doe", 2201008).await;
    let teacher = app.register_teacher("Dr. Smith", 1980001).await;

    let response = app
        .send(empty_request("GET", "/api/teachers/profile", Some(&student)))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .send(empty_request("GET", "/api/students/profile", Some(&teacher)))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .send(empty_request("GET", "/api/teachers/profile", Some(&teacher)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["npm"], 1980001);
}

#[tokio::test]
async fn test_refresh_issues_new_pair() {
    let app = setup_test_app();
    let email = generate_unique_email();

    let response = app
        .send(json_request(
            "POST",
            "/api/teachers/register",
            None,
            json!({"name": "Dr. Smith", "npm": 1980002, "email": email, "password": "testpass123"}),
        ))
        .await;
    let refresh_token = response.body["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({"refresh_token": refresh_token}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let token = access_token(&response);
    let response = app
        .send(empty_request("GET", "/api/teachers/profile", Some(&token)))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/refresh",
            None,
            json!({"refresh_token": token}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_student_cannot_log_in() {
    let app = setup_test_app();
    let email = generate_unique_email();

    let response = app
        .send(json_request(
            "POST",
            "/api/students/register",
            None,
            json!({"name": "Jane Doe", "nim": 2201009, "email": email, "password": "testpass123"}),
        ))
        .await;
    let token = access_token(&response);

    let response = app
        .send(empty_request("DELETE", "/api/students", Some(&token)))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .send(json_request(
            "POST",
            "/api/students/login",
            None,
            json!({"email": email, "password": "testpass123"}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_students_rejects_blank_name() {
    let app = setup_test_app();
    let token = app.register_student("Jane Doe", 2201010).await;

    let response = app
        .send(empty_request("GET", "/api/students?name=%20", Some(&token)))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .send(empty_request("GET", "/api/students?name=jane", Some(&token)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_refresh_token_rejected_as_bearer() {
    let app = setup_test_app();

    let response = app
        .send(json_request(
            "POST",
            "/api/students/register",
            None,
            json!({"name": "Jane Doe", "nim": 2201011, "email": generate_unique_email(), "password": "testpass123"}),
        ))
        .await;
    let refresh_token = response.body["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .send(empty_request("GET", "/api/students/profile", Some(&refresh_token)))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("GET")
        .uri("/api/students/profile")
        .header(header::COOKIE, format!("token={}", refresh_token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::UNAUTHORIZED);
}
