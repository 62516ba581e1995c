use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use model::entities::user::{self, Role};
use sea_orm::{ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::schemas::AppState;

/// bcrypt cost factor for password hashing.
const BCRYPT_COST: u32 = 10;

/// Claims embedded in session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - user id.
    pub sub: i32,
    /// Role at issuance time ("admin" or "user").
    pub role: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| ApiError::Internal(format!("Failed to verify password: {e}")))
}

/// Issues a signed, time-limited session token for a user.
pub fn issue_token(user: &user::Model, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: user.id,
        role: user.role.to_value(),
        iat: now,
        exp: now + config.jwt_expiry_hours * 3600,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
}

/// Verifies a token's signature and expiry and returns its claims.
pub fn decode_token(token: &str, config: &AppConfig) -> Result<TokenClaims, ApiError> {
    jsonwebtoken::decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Not authorized, token failed".to_string()))
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".to_string()))
}

/// Extractor for routes that only need verified claims, without touching
/// the users table. `/api/auth/me` uses this so a token whose user has
/// vanished can answer 404 instead of 401.
#[async_trait]
impl FromRequestParts<AppState> for TokenClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        decode_token(token, &state.config)
    }
}

/// The authenticated user behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = TokenClaims::from_request_parts(parts, state).await?;

        let current_user = user::Entity::find_by_id(claims.sub)
            .one(&state.db)
            .await?
            .ok_or_else(|| {
                ApiError::Unauthorized("User belonging to this token no longer exists".to_string())
            })?;

        Ok(AuthUser(current_user))
    }
}

/// An [`AuthUser`] that additionally holds the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(current_user) = AuthUser::from_request_parts(parts, state).await?;

        if current_user.role != Role::Admin {
            return Err(ApiError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ));
        }

        Ok(AdminUser(current_user))
    }
}

/// One-time idempotent admin seed: if no user with the configured admin
/// email exists, create one approved admin account. Runs at startup, not
/// as part of request handling.
pub async fn seed_admin(db: &DatabaseConnection, config: &AppConfig) -> anyhow::Result<()> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(config.admin_email.as_str()))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let admin = user::ActiveModel {
        name: Set("Admin".to_string()),
        email: Set(config.admin_email.clone()),
        password_hash: Set(hash_password(&config.admin_password)?),
        role: Set(Role::Admin),
        is_approved: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    admin.insert(db).await?;

    info!("Admin user created successfully: {}", config.admin_email);
    Ok(())
}
