use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum::Router;
use axum_test::TestServer;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{json, Value};

use crate::auth::seed_admin;
use crate::config::AppConfig;
use crate::router::create_router;
use crate::schemas::{ApiResponse, AppState};

pub const TEST_PASSWORD: &str = "password123";

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: "test-secret".to_string(),
        jwt_expiry_hours: 1,
        upload_dir: std::env::temp_dir()
            .join("taxtrack-test-uploads")
            .to_string_lossy()
            .into_owned(),
        admin_email: "admin@taxtrack.local".to_string(),
        admin_password: "admin".to_string(),
    }
}

/// Create an in-memory SQLite database for testing.
/// A single pooled connection: every pooled connection to `:memory:`
/// would otherwise get its own empty database.
pub async fn setup_test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("Failed to connect to in-memory database");

    // Run migrations
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing, with the admin account seeded
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;
    let config = test_config();

    seed_admin(&db, &config)
        .await
        .expect("Failed to seed admin user");

    AppState { db, config }
}

/// Create axum app for testing
pub async fn setup_test_app() -> Router {
    let state = setup_test_app_state().await;
    create_router(state)
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).expect("Invalid bearer token")
}

/// Register a user; returns (user id, registration token). The account
/// starts unapproved.
pub async fn register_user(server: &TestServer, name: &str, email: &str) -> (i64, String) {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: ApiResponse<Value> = response.json();
    let user_id = body.data["user"]["id"].as_i64().expect("Missing user id");
    let token = body.data["token"]
        .as_str()
        .expect("Missing token")
        .to_string();
    (user_id, token)
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status(StatusCode::OK);

    let body: ApiResponse<Value> = response.json();
    body.data["token"]
        .as_str()
        .expect("Missing token")
        .to_string()
}

/// Log in as the seeded admin account
pub async fn admin_token(server: &TestServer) -> String {
    let config = test_config();
    login(server, &config.admin_email, &config.admin_password).await
}

pub async fn approve_user(server: &TestServer, admin_token: &str, user_id: i64) {
    let response = server
        .patch(&format!("/api/users/approve/{user_id}"))
        .add_header(AUTHORIZATION, bearer(admin_token))
        .await;
    response.assert_status(StatusCode::OK);
}

/// Register, approve and log in a user; returns a usable session token
pub async fn approved_user_token(server: &TestServer, name: &str, email: &str) -> String {
    let (user_id, _) = register_user(server, name, email).await;
    let admin = admin_token(server).await;
    approve_user(server, &admin, user_id).await;
    login(server, email, TEST_PASSWORD).await
}

/// Create a tax category as admin; returns its id
pub async fn create_tax_category(
    server: &TestServer,
    admin_token: &str,
    name: &str,
    tax_percentage: &str,
) -> i64 {
    let response = server
        .post("/api/tax-categories")
        .add_header(AUTHORIZATION, bearer(admin_token))
        .json(&json!({
            "name": name,
            "description": "Test category",
            "tax_percentage": tax_percentage,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: ApiResponse<Value> = response.json();
    body.data["id"].as_i64().expect("Missing category id")
}

/// Save a payment method; returns its id
pub async fn create_payment_method(
    server: &TestServer,
    token: &str,
    card_number: &str,
    is_default: bool,
) -> i64 {
    let response = server
        .post("/api/payment-methods")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({
            "cardNumber": card_number,
            "cardType": "visa",
            "cvv": "987",
            "expiryDate": "04/27",
            "isDefault": is_default,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: ApiResponse<Value> = response.json();
    body.data["id"].as_i64().expect("Missing payment method id")
}
