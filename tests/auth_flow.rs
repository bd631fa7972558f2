mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_token_for_new_user() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "name": "Amina",
                "email": "Amina@Farm.io",
                "password": "secret123",
                "farmSize": "small",
                "poultryType": "layers",
                "preferredLanguage": "sw"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let user = &body["user"];
    assert_eq!(user["name"], "Amina");
    assert_eq!(user["email"], "amina@farm.io");
    assert_eq!(user["poultryType"], "layers");
    assert_eq!(user["preferredLanguage"], "sw");
    assert_eq!(user["role"], "farmer");
    assert!(user.get("passwordHash").is_none());

    let claims = app.state.tokens.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.user_id.to_string(), user["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Short", "email": "short@farm.io", "password": "12345" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    // Length is counted in characters, not bytes.
    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Accents", "email": "accents@farm.io", "password": "ééé" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.register("Kofi", "kofi@farm.io").await;
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "Kofi Again", "email": "KOFI@farm.io", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (token, _) = app.admin().await;
    let (_, users) = app.get("/api/admin/users", Some(&token)).await;
    let kofis = users
        .as_array()
        .unwrap()
        .iter()
        .filter(|u| u["email"] == "kofi@farm.io")
        .count();
    assert_eq!(kofis, 1);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new();
    let (_, id) = app.register("Lena", "lena@farm.io").await;

    let (status, body) = app
        .post("/api/auth/login", None, json!({ "email": "lena@farm.io", "password": "wrong-pass" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app
        .post("/api/auth/login", None, json!({ "email": "lena@farm.io", "password": "secret123" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id.to_string());
}

#[tokio::test]
async fn test_inactive_account_cannot_log_in() {
    let app = TestApp::new();
    let (_, id) = app.register("Idle", "idle@farm.io").await;
    app.deactivate(id).await;

    let (status, body) = app
        .post("/api/auth/login", None, json!({ "email": "idle@farm.io", "password": "secret123" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Account is inactive");
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token, authorization denied");

    let (status, _) = app.get("/api/activity", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new();
    let (token, _) = app.register("Ravi", "ravi@farm.io").await;

    let (status, body) = app
        .put(
            "/api/users/profile",
            Some(&token),
            json!({ "farmSize": "medium", "preferredLanguage": "fr" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["farmSize"], "medium");
    assert_eq!(body["user"]["preferredLanguage"], "fr");
    assert_eq!(body["user"]["name"], "Ravi");

    let (status, _) = app.put("/api/users/profile", Some(&token), json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_fallbacks() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");

    let (status, body) = app.get("/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found: /api/nope");

    let (status, body) = app.request(Method::DELETE, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/auth/login", None, json!(["not", "an", "object"]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}
