use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use model::entities::user::{self, Role};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{self, TokenClaims};
use crate::error::ApiError;
use crate::handlers::users::UserResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for registering a new user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
}

/// Request body for logging in
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session token plus public profile
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Register a new user account
///
/// The account starts unapproved: a token is issued immediately, but
/// login stays locked until an admin approves the registration.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    debug!("Registering user with email: {}", request.email);

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.as_str()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        warn!("Registration rejected, email already exists: {}", request.email);
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let new_user = user::ActiveModel {
        name: Set(request.name),
        email: Set(request.email),
        password_hash: Set(auth::hash_password(&request.password)?),
        address: Set(request.address),
        contact_number: Set(request.contact_number),
        gender: Set(request.gender),
        nationality: Set(request.nationality),
        id_number: Set(request.id_number),
        role: Set(Role::User),
        is_approved: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let user_model = new_user.insert(&state.db).await?;

    info!("User registered with ID: {}, email: {}", user_model.id, user_model.email);

    let token = auth::issue_token(&user_model, &state.config)?;
    let response = ApiResponse {
        data: AuthResponse {
            token,
            user: UserResponse::from(user_model),
        },
        message: "User registered successfully".to_string(),
        success: true,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password
///
/// Unknown email and wrong password answer identically; an unapproved
/// account gets 403 until an admin flips the approval gate.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account not approved yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    debug!("Login attempt for email: {}", request.email);

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(request.email.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !auth::verify_password(&request.password, &user_model.password_hash)? {
        warn!("Password mismatch for email: {}", request.email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user_model.is_approved {
        warn!("Login rejected for unapproved account: {}", request.email);
        return Err(ApiError::Forbidden(
            "Account not approved yet. Please wait for admin approval.".to_string(),
        ));
    }

    info!("Login successful for user ID: {}", user_model.id);

    let token = auth::issue_token(&user_model, &state.config)?;
    Ok(Json(ApiResponse {
        data: AuthResponse {
            token,
            user: UserResponse::from(user_model),
        },
        message: "Login successful".to_string(),
        success: true,
    }))
}

/// Resolve the current user from the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user resolved", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Token refers to a user that no longer exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, claims))]
pub async fn me(
    claims: TokenClaims,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user_model = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse {
        data: UserResponse::from(user_model),
        message: "User retrieved successfully".to_string(),
        success: true,
    }))
}
