use anyhow::Result;
use sea_orm::Database;

use crate::schemas::AppState;

/// Runtime configuration resolved from the environment once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Secret used to sign session tokens.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub jwt_expiry_hours: i64,
    /// Directory receipt uploads are written to and served from.
    pub upload_dir: String,
    /// Bootstrapped admin account, seeded on startup if absent.
    pub admin_email: String,
    pub admin_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "taxtrack-dev-secret".to_string()),
            jwt_expiry_hours: std::env::var("JWT_EXPIRY_HOURS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(24),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@taxtrack.local".to_string()),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string()),
        }
    }
}

/// Initialize application state against a specific database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    Ok(AppState {
        db,
        config: AppConfig::from_env(),
    })
}
