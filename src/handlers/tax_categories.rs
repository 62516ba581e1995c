use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use model::entities::{expense, tax_category};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request structure for creating a tax category
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateTaxCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    /// Non-negative percentage rate, e.g. "5.00".
    pub tax_percentage: Decimal,
    pub is_active: Option<bool>,
}

/// Request structure for updating a tax category; absent fields are left
/// unchanged, so toggling `is_active` alone is a one-field request.
#[derive(Debug, Deserialize, Serialize, ToSchema, Default)]
pub struct UpdateTaxCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tax_percentage: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Response structure for tax category operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaxCategoryResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub tax_percentage: Decimal,
    pub is_active: bool,
}

impl From<tax_category::Model> for TaxCategoryResponse {
    fn from(model: tax_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            tax_percentage: model.tax_percentage,
            is_active: model.is_active,
        }
    }
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Name and tax percentage are required".to_string(),
        ));
    }
    Ok(())
}

fn validate_percentage(tax_percentage: Decimal) -> Result<(), ApiError> {
    if tax_percentage < Decimal::ZERO {
        return Err(ApiError::Validation(
            "Tax percentage must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

/// Get all tax categories
#[utoipa::path(
    get,
    path = "/api/tax-categories",
    tag = "tax-categories",
    responses(
        (status = 200, description = "Tax categories retrieved successfully", body = ApiResponse<Vec<TaxCategoryResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_tax_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TaxCategoryResponse>>>, ApiError> {
    let categories = tax_category::Entity::find().all(&state.db).await?;

    debug!("Retrieved {} tax categories", categories.len());

    Ok(Json(ApiResponse {
        data: categories.into_iter().map(TaxCategoryResponse::from).collect(),
        message: "Tax categories retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a single tax category by ID
#[utoipa::path(
    get,
    path = "/api/tax-categories/{category_id}",
    tag = "tax-categories",
    params(
        ("category_id" = i32, Path, description = "Tax category ID"),
    ),
    responses(
        (status = 200, description = "Tax category retrieved successfully", body = ApiResponse<TaxCategoryResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Tax category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _user))]
pub async fn get_tax_category(
    _user: AuthUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TaxCategoryResponse>>, ApiError> {
    let category = tax_category::Entity::find_by_id(category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tax category not found".to_string()))?;

    Ok(Json(ApiResponse {
        data: TaxCategoryResponse::from(category),
        message: "Tax category retrieved successfully".to_string(),
        success: true,
    }))
}

/// Create a new tax category
#[utoipa::path(
    post,
    path = "/api/tax-categories",
    tag = "tax-categories",
    request_body = CreateTaxCategoryRequest,
    responses(
        (status = 201, description = "Tax category created successfully", body = ApiResponse<TaxCategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn create_tax_category(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(request): Json<CreateTaxCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TaxCategoryResponse>>), ApiError> {
    validate_name(&request.name)?;
    validate_percentage(request.tax_percentage)?;

    let new_category = tax_category::ActiveModel {
        name: Set(request.name),
        description: Set(request.description),
        tax_percentage: Set(request.tax_percentage),
        is_active: Set(request.is_active.unwrap_or(true)),
        ..Default::default()
    };
    let category = new_category.insert(&state.db).await?;

    info!("Tax category created with ID: {}", category.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: TaxCategoryResponse::from(category),
            message: "Tax category created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Update a tax category
#[utoipa::path(
    put,
    path = "/api/tax-categories/{category_id}",
    tag = "tax-categories",
    params(
        ("category_id" = i32, Path, description = "Tax category ID"),
    ),
    request_body = UpdateTaxCategoryRequest,
    responses(
        (status = 200, description = "Tax category updated successfully", body = ApiResponse<TaxCategoryResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Tax category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn update_tax_category(
    _admin: AdminUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateTaxCategoryRequest>,
) -> Result<Json<ApiResponse<TaxCategoryResponse>>, ApiError> {
    let existing = tax_category::Entity::find_by_id(category_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tax category not found".to_string()))?;

    let mut category_active: tax_category::ActiveModel = existing.clone().into();

    if let Some(name) = request.name {
        validate_name(&name)?;
        category_active.name = Set(name);
    }
    if let Some(description) = request.description {
        category_active.description = Set(Some(description));
    }
    if let Some(tax_percentage) = request.tax_percentage {
        validate_percentage(tax_percentage)?;
        category_active.tax_percentage = Set(tax_percentage);
    }
    if let Some(is_active) = request.is_active {
        // Toggling activity never touches existing expenses.
        category_active.is_active = Set(is_active);
    }

    let updated = if category_active.is_changed() {
        category_active.update(&state.db).await?
    } else {
        existing
    };

    info!("Tax category {} updated", category_id);

    Ok(Json(ApiResponse {
        data: TaxCategoryResponse::from(updated),
        message: "Tax category updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a tax category
///
/// Hard delete, restricted: a category referenced by any expense cannot
/// be removed.
#[utoipa::path(
    delete,
    path = "/api/tax-categories/{category_id}",
    tag = "tax-categories",
    params(
        ("category_id" = i32, Path, description = "Tax category ID"),
    ),
    responses(
        (status = 200, description = "Tax category deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Tax category not found", body = ErrorResponse),
        (status = 409, description = "Tax category is referenced by expenses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn delete_tax_category(
    _admin: AdminUser,
    Path(category_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let referencing = expense::Entity::find()
        .filter(expense::Column::CategoryId.eq(category_id))
        .count(&state.db)
        .await?;
    if referencing > 0 {
        warn!(
            "Refusing to delete tax category {} referenced by {} expenses",
            category_id, referencing
        );
        return Err(ApiError::Conflict(
            "Tax category is referenced by existing expenses".to_string(),
        ));
    }

    let result = tax_category::Entity::delete_by_id(category_id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound("Tax category not found".to_string()));
    }

    info!("Tax category {} deleted", category_id);

    Ok(Json(ApiResponse {
        data: format!("Tax category {} deleted", category_id),
        message: "Tax category deleted successfully".to_string(),
        success: true,
    }))
}
