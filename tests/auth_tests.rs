//! Integration tests for the authentication endpoints.
//!
//! Covers login, logout, the session-backed account routes, and the
//! guard behavior around deactivated accounts.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use vellum::api::AppState;
use vellum::auth::roles::Role;
use vellum::config::Config;
use vellum::services::NewAccount;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = vellum::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let app = vellum::api::router(state.clone())
        .await
        .expect("Failed to build router");

    (app, state)
}

async fn create_user(state: &Arc<AppState>, username: &str, role: Role) {
    state
        .auth()
        .create_account(NewAccount {
            username: username.to_string(),
            password: "password123".to_string(),
            email: None,
            display_name: None,
            role,
        })
        .await
        .expect("Failed to create test user");
}

async fn login(app: &Router, identifier: &str, password: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "usernameOrEmail": identifier,
                        "password": password,
                        "rememberMe": false,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Cookie pair from the login response, ready for a `Cookie` header.
fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("Response should carry a session cookie")
        .to_string()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn get_me(app: &Router, cookie: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_with_seeded_admin() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "admin", "password").await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(set_cookie.contains("blog.sid="));

    let body = body_json(response).await;
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["data"]["username"], "admin");
    assert_eq!(body["data"]["email"], "admin@blog.local");
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["is_active"], true);
    // The password hash must never appear in a response.
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_accepts_email_identifier() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "admin@blog.local", "password").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], "admin");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, state) = spawn_app().await;

    create_user(&state, "former", Role::Author).await;
    let deactivated = state.store().deactivate_user("former").await.unwrap();
    assert!(deactivated);

    let response = login(&app, "ghost", "password123").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = body_json(response).await;

    let response = login(&app, "admin", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(response).await;

    let response = login(&app, "former", "password123").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let deactivated_user = body_json(response).await;

    assert_eq!(unknown_user["error"], "Invalid credentials");
    assert_eq!(unknown_user, wrong_password);
    assert_eq!(unknown_user, deactivated_user);
}

#[tokio::test]
async fn test_login_validation_details() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(!body["success"].as_bool().unwrap());
    assert_eq!(body["error"], "Invalid input data");

    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"usernameOrEmail"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_login_rejected_when_already_signed_in() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "admin", "password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Cookie", cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "usernameOrEmail": "admin",
                        "password": "password",
                        "rememberMe": false,
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "You already have an active session");
}

#[tokio::test]
async fn test_me_requires_session() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let rejected = body_json(response).await;
    assert_eq!(rejected["error"], "Authentication required");

    let response = login(&app, "admin", "password").await;
    let cookie = session_cookie(&response);

    let response = get_me(&app, &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["username"], "admin");
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "admin", "password").await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("Cookie", cookie.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Signed out successfully");

    // The old cookie no longer resolves to a session.
    let response = get_me(&app, &cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Checking a destroyed session is not an error, however often.
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/check")
                    .header("Cookie", cookie.clone())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let checked = body_json(response).await;
        assert_eq!(checked["data"]["authenticated"], false);
    }
}

#[tokio::test]
async fn test_check_reports_session_state() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let anonymous = body_json(response).await;
    assert!(anonymous["success"].as_bool().unwrap());
    assert_eq!(anonymous["data"]["authenticated"], false);
    assert!(anonymous["data"]["user"].is_null());

    let response = login(&app, "admin", "password").await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/check")
                .header("Cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let signed_in = body_json(response).await;
    assert_eq!(signed_in["data"]["authenticated"], true);
    assert_eq!(signed_in["data"]["user"]["username"], "admin");
}

#[tokio::test]
async fn test_deactivation_invalidates_live_session() {
    let (app, state) = spawn_app().await;

    create_user(&state, "casey", Role::Author).await;

    let response = login(&app, "casey", "password123").await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let response = get_me(&app, &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let deactivated = state.store().deactivate_user("casey").await.unwrap();
    assert!(deactivated);

    // The live session is rejected and destroyed on its next use.
    let response = get_me(&app, &cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let first = body_json(response).await;
    assert_eq!(first["error"], "Account is deactivated");

    let response = get_me(&app, &cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let second = body_json(response).await;
    assert_eq!(second["error"], "Authentication required");

    // Signing in again looks like any other bad credential.
    let response = login(&app, "casey", "password123").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let rejected = body_json(response).await;
    assert_eq!(rejected["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_change_password_requires_correct_current() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "admin", "password").await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/change-password")
                .header("Cookie", cookie.clone())
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "currentPassword": "wrong-password",
                        "newPassword": "newsecret1",
                        "confirmPassword": "newsecret1",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let wrong_current = body_json(response).await;
    assert_eq!(wrong_current["error"], "Current password is incorrect");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/change-password")
                .header("Cookie", cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "currentPassword": "password",
                        "newPassword": "newsecret1",
                        "confirmPassword": "different1",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let mismatch = body_json(response).await;
    let fields: Vec<&str> = mismatch["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"confirmPassword"));
}

#[tokio::test]
async fn test_change_password_round_trip() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "admin", "password").await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/change-password")
                .header("Cookie", cookie.clone())
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "currentPassword": "password",
                        "newPassword": "newsecret1",
                        "confirmPassword": "newsecret1",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Password updated successfully");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("Cookie", cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = login(&app, "admin", "password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&app, "admin", "newsecret1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_profile() {
    let (app, _) = spawn_app().await;

    let response = login(&app, "admin", "password").await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/profile")
                .header("Cookie", cookie.clone())
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "display_name": "Site Admin",
                        "bio": "Runs the site.",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["display_name"], "Site Admin");

    // No fields at all is a validation failure.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/profile")
                .header("Cookie", cookie.clone())
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/auth/profile")
                .header("Cookie", cookie)
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "display_name": "x".repeat(151) }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_long = body_json(response).await;
    assert_eq!(
        too_long["error"],
        "Display name cannot exceed 150 characters"
    );
}
