use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Once;
use tower::ServiceExt;
use user_hub_api::api::routes::create_app;

// Ensure tracing and auth environment are initialized only once
static INIT: Once = Once::new();

fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        std::env::set_var("JWT_SECRET", "integration_test_secret_key");
        std::env::set_var("JWT_ISSUER", "userhub-test");
        std::env::set_var("MAX_LOGIN_ATTEMPTS", "3");
    });
}

/// Build a fresh application; without an initialized database pool the
/// repository runs on its in-memory fallback, so every app is isolated.
async fn test_app() -> Router {
    initialize();
    create_app().await
}

// Helper function to get body bytes from a response
async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_body(nickname: &str, email: &str) -> Value {
    json!({
        "nickname": nickname,
        "email": email,
        "password": "SecurePassword123!",
        "first_name": "John",
        "last_name": "Doe",
        "bio": "I am a software engineer with over 5 years of experience.",
        "profile_picture_url": "https://example.com/profile_pictures/john_doe.jpg",
        "linkedin_profile_url": "https://linkedin.com/in/johndoe",
        "github_profile_url": "https://github.com/johndoe"
    })
}

async fn post_json(app: &Router, uri: &str, body: Value, bearer: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn get_with_token(app: &Router, uri: &str, bearer: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method(Method::GET).uri(uri);

    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Register the bootstrap admin and log in, returning the access token
async fn register_and_login_admin(app: &Router) -> String {
    let response = post_json(app, "/register", register_body("admin_user", "admin@example.com"), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app,
        "/auth/login",
        json!({"email": "admin@example.com", "password": "SecurePassword123!"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = get_body_json(response).await;
    body["access_token"].as_str().unwrap().to_string()
}

// Integration test for the health check endpoint
#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let response = get_with_token(&app, "/health", None).await;

    // Without a database pool the service reports degraded, never error
    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::SERVICE_UNAVAILABLE
    );

    let health = get_body_json(response).await;
    let status = health["status"].as_str().unwrap();
    assert!(
        status == "ok" || status == "degraded",
        "Health status should be either 'ok' or 'degraded' but was '{}'",
        status
    );
    assert!(health["version"].is_string());
    assert!(health["components"]["database"]["status"].is_string());
}

// The first registered account bootstraps the admin
#[tokio::test]
async fn test_first_registration_creates_verified_admin() {
    let app = test_app().await;

    let response = post_json(&app, "/register", register_body("admin_user", "admin@example.com"), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let user = get_body_json(response).await;
    assert_eq!(user["role"], "ADMIN");
    assert_eq!(user["email_verified"], true);
    assert_eq!(user["nickname"], "admin_user");

    // Responses carry HATEOAS links and never credential material
    assert!(user["links"].as_array().unwrap().len() >= 2);
    assert!(user.get("hashed_password").is_none());
    assert!(user.get("verification_token").is_none());
}

// Later registrations start unverified and cannot log in yet
#[tokio::test]
async fn test_second_registration_requires_verification() {
    let app = test_app().await;

    post_json(&app, "/register", register_body("admin_user", "admin@example.com"), None).await;

    let response = post_json(&app, "/register", register_body("second_user", "second@example.com"), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let user = get_body_json(response).await;
    assert_eq!(user["role"], "ANONYMOUS");
    assert_eq!(user["email_verified"], false);

    // Login before verification is refused
    let response = post_json(
        &app,
        "/auth/login",
        json!({"email": "second@example.com", "password": "SecurePassword123!"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// Duplicate email is rejected
#[tokio::test]
async fn test_duplicate_email_rejected() {
    let app = test_app().await;

    post_json(&app, "/register", register_body("first_user", "dup@example.com"), None).await;
    let response = post_json(&app, "/register", register_body("other_user", "dup@example.com"), None).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// Invalid nickname is rejected with a validation error
#[tokio::test]
async fn test_invalid_nickname_rejected() {
    let app = test_app().await;

    let response = post_json(&app, "/register", register_body("bad nickname", "user@example.com"), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = get_body_json(response).await;
    assert_eq!(body["error"], "validation_error");
}

// Login issues working bearer tokens
#[tokio::test]
async fn test_login_and_token_flow() {
    let app = test_app().await;

    let token = register_and_login_admin(&app).await;

    // The token unlocks the management API
    let response = get_with_token(&app, "/api/v1/users", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = get_body_json(response).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["data"][0]["nickname"], "admin_user");

    // Auth info reflects the token's identity
    let response = get_with_token(&app, "/auth/info", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = get_body_json(response).await;
    assert_eq!(body["roles"][0], "ADMIN");
}

// Management routes require authentication
#[tokio::test]
async fn test_management_routes_require_token() {
    let app = test_app().await;

    let response = get_with_token(&app, "/api/v1/users", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_with_token(&app, "/api/v1/users", Some("not.a.token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// Full admin CRUD flow over the management API
#[tokio::test]
async fn test_admin_user_crud_flow() {
    let app = test_app().await;
    let token = register_and_login_admin(&app).await;

    // Create a manager account
    let response = post_json(
        &app,
        "/api/v1/users",
        json!({
            "nickname": "manager_1",
            "email": "manager@example.com",
            "password": "SecurePassword123!",
            "role": "MANAGER"
        }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let manager = get_body_json(response).await;
    let manager_id = manager["id"].as_str().unwrap().to_string();
    assert_eq!(manager["role"], "MANAGER");
    assert_eq!(manager["email_verified"], true);

    // Fetch it back
    let response = get_with_token(&app, &format!("/api/v1/users/{}", manager_id), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Update the bio
    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/users/{}", manager_id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(
            json!({"bio": "Keeps the team running."}).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = get_body_json(response).await;
    assert_eq!(updated["bio"], "Keeps the team running.");

    // Empty update is rejected
    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/users/{}", manager_id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(json!({}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Delete the account
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/v1/users/{}", manager_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // It is gone now
    let response = get_with_token(&app, &format!("/api/v1/users/{}", manager_id), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// Managers can read but not perform admin-only operations
#[tokio::test]
async fn test_manager_cannot_delete_users() {
    let app = test_app().await;
    let admin_token = register_and_login_admin(&app).await;

    // Admin creates a manager, then the manager logs in
    let response = post_json(
        &app,
        "/api/v1/users",
        json!({
            "nickname": "manager_1",
            "email": "manager@example.com",
            "password": "SecurePassword123!",
            "role": "MANAGER"
        }),
        Some(&admin_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let manager = get_body_json(response).await;
    let manager_id = manager["id"].as_str().unwrap().to_string();

    let response = post_json(
        &app,
        "/auth/login",
        json!({"email": "manager@example.com", "password": "SecurePassword123!"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let manager_token = get_body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    // Managers may list users
    let response = get_with_token(&app, "/api/v1/users", Some(&manager_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // But deleting is admin-only
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/v1/users/{}", manager_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", manager_token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// Authenticated users outside ADMIN/MANAGER cannot reach the management API
#[tokio::test]
async fn test_authenticated_role_cannot_list_users() {
    let app = test_app().await;
    let admin_token = register_and_login_admin(&app).await;

    let response = post_json(
        &app,
        "/api/v1/users",
        json!({
            "nickname": "regular_user",
            "email": "regular@example.com",
            "password": "SecurePassword123!",
            "role": "AUTHENTICATED"
        }),
        Some(&admin_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        &app,
        "/auth/login",
        json!({"email": "regular@example.com", "password": "SecurePassword123!"}),
        None,
    )
    .await;
    let user_token = get_body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = get_with_token(&app, "/api/v1/users", Some(&user_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// Repeated failed logins lock the account; the admin can unlock it
#[tokio::test]
async fn test_lockout_and_unlock_flow() {
    let app = test_app().await;
    let admin_token = register_and_login_admin(&app).await;

    let response = post_json(
        &app,
        "/api/v1/users",
        json!({
            "nickname": "lockme",
            "email": "lockme@example.com",
            "password": "SecurePassword123!",
            "role": "AUTHENTICATED"
        }),
        Some(&admin_token),
    )
    .await;
    let user_id = get_body_json(response).await["id"].as_str().unwrap().to_string();

    // MAX_LOGIN_ATTEMPTS is 3 in this test environment; the first two
    // failures are plain rejections, the third trips the lock
    for _ in 0..2 {
        let response = post_json(
            &app,
            "/auth/login",
            json!({"email": "lockme@example.com", "password": "WrongPassword1"}),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = post_json(
        &app,
        "/auth/login",
        json!({"email": "lockme@example.com", "password": "WrongPassword1"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Correct password is also refused while locked
    let response = post_json(
        &app,
        "/auth/login",
        json!({"email": "lockme@example.com", "password": "SecurePassword123!"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin unlocks the account
    let response = post_json(
        &app,
        &format!("/api/v1/users/{}/unlock", user_id),
        json!({}),
        Some(&admin_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let unlocked = get_body_json(response).await;
    assert_eq!(unlocked["is_locked"], false);

    // Login works again
    let response = post_json(
        &app,
        "/auth/login",
        json!({"email": "lockme@example.com", "password": "SecurePassword123!"}),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// Logging out revokes the user's tokens
#[tokio::test]
async fn test_logout_revokes_tokens() {
    let app = test_app().await;
    let token = register_and_login_admin(&app).await;

    // The token works before logout
    let response = get_with_token(&app, "/auth/info", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(&app, "/auth/logout", json!({}), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // And is rejected afterwards
    let response = get_with_token(&app, "/auth/info", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// The refresh endpoint mints a new access token from a refresh token
#[tokio::test]
async fn test_refresh_token_flow() {
    let app = test_app().await;

    post_json(&app, "/register", register_body("admin_user", "admin@example.com"), None).await;
    let response = post_json(
        &app,
        "/auth/login",
        json!({"email": "admin@example.com", "password": "SecurePassword123!"}),
        None,
    )
    .await;
    let body = get_body_json(response).await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(&app, "/auth/refresh", json!({}), Some(&refresh_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = get_body_json(response).await;
    let new_access = body["access_token"].as_str().unwrap();

    // The refreshed token is accepted by protected routes
    let response = get_with_token(&app, "/auth/info", Some(new_access)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Garbage is not
    let response = post_json(&app, "/auth/refresh", json!({}), Some("garbage.token.here")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// Pagination limits and links behave as documented
#[tokio::test]
async fn test_user_list_pagination() {
    let app = test_app().await;
    let admin_token = register_and_login_admin(&app).await;

    for i in 0..4 {
        let response = post_json(
            &app,
            "/api/v1/users",
            json!({
                "nickname": format!("user_{}", i),
                "email": format!("user{}@example.com", i),
                "password": "SecurePassword123!",
                "role": "AUTHENTICATED"
            }),
            Some(&admin_token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // 4 created users plus the admin
    let response = get_with_token(&app, "/api/v1/users?limit=2&offset=0", Some(&admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = get_body_json(response).await;
    assert_eq!(body["total_count"], 5);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert!(body["next"].as_str().unwrap().contains("offset=2"));
    assert!(body.get("previous").is_none() || body["previous"].is_null());
}

// Concurrent registrations do not corrupt the store
#[tokio::test]
async fn test_concurrent_user_registrations() {
    let app = test_app().await;

    // Claim the bootstrap admin slot first so the concurrent batch
    // races only over ordinary accounts
    post_json(&app, "/register", register_body("admin_user", "admin@example.com"), None).await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let body = register_body(&format!("concurrent_{}", i), &format!("concurrent{}@example.com", i));
            let request = Request::builder()
                .method(Method::POST)
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    // All ten accounts exist exactly once
    let token = {
        let response = post_json(
            &app,
            "/auth/login",
            json!({"email": "admin@example.com", "password": "SecurePassword123!"}),
            None,
        )
        .await;
        get_body_json(response).await["access_token"].as_str().unwrap().to_string()
    };

    let response = get_with_token(&app, "/api/v1/users?limit=100", Some(&token)).await;
    let body = get_body_json(response).await;
    assert_eq!(body["total_count"], 11);

    let emails: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    let unique: std::collections::HashSet<&str> = emails.iter().copied().collect();
    assert_eq!(unique.len(), emails.len(), "emails should be unique");
}

// The OpenAPI document is served
#[tokio::test]
async fn test_openapi_json_served() {
    let app = test_app().await;

    let response = get_with_token(&app, "/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc = get_body_json(response).await;
    assert_eq!(doc["info"]["title"], "UserHub API");
    assert!(doc["paths"]["/api/v1/users"].is_object());
}
