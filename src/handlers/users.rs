use axum::{
    extract::{Path, State},
    response::Json,
};
use model::entities::user::{self, Role};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveEnum, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Public projection of a user; the password hash never leaves the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
    pub role: String,
    pub is_approved: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            address: model.address,
            contact_number: model.contact_number,
            gender: model.gender,
            nationality: model.nationality,
            id_number: model.id_number,
            role: model.role.to_value(),
            is_approved: model.is_approved,
        }
    }
}

/// Get all non-admin users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn get_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = user::Entity::find()
        .filter(user::Column::Role.ne(Role::Admin))
        .all(&state.db)
        .await?;

    debug!("Retrieved {} non-admin users", users.len());

    Ok(Json(ApiResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
        message: "Users retrieved successfully".to_string(),
        success: true,
    }))
}

/// Approve a registered user, unlocking login
#[utoipa::path(
    patch,
    path = "/api/users/approve/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User approved successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn approve_user(
    _admin: AdminUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    set_approval(&state, user_id, true).await?;

    info!("User {} approved", user_id);
    Ok(Json(ApiResponse {
        data: format!("User {} approved", user_id),
        message: "User approved successfully".to_string(),
        success: true,
    }))
}

/// Revoke a user's approval, locking them out of login
#[utoipa::path(
    patch,
    path = "/api/users/reject/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User approval canceled successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn reject_user(
    _admin: AdminUser,
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    set_approval(&state, user_id, false).await?;

    info!("User {} approval canceled", user_id);
    Ok(Json(ApiResponse {
        data: format!("User {} approval canceled", user_id),
        message: "User approval canceled successfully".to_string(),
        success: true,
    }))
}

async fn set_approval(state: &AppState, user_id: i32, approved: bool) -> Result<(), ApiError> {
    let result = user::Entity::update_many()
        .col_expr(user::Column::IsApproved, Expr::value(approved))
        .filter(user::Column::Id.eq(user_id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        warn!("User {} not found for approval update", user_id);
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(())
}
