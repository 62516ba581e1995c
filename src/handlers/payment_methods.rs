use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use model::entities::payment_method::{self, Status};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for saving a new card
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentMethodRequest {
    pub card_number: String,
    pub card_type: String,
    pub cvv: String,
    /// "MM/YY"
    pub expiry_date: String,
    pub nickname: Option<String>,
    pub is_default: Option<bool>,
}

/// Request body for updating a saved card. Card number, type and cvv are
/// immutable once created; only nickname, default flag and expiry move.
#[derive(Debug, Deserialize, Serialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentMethodRequest {
    pub nickname: Option<String>,
    pub is_default: Option<bool>,
    /// "MM/YY"
    pub expiry_date: Option<String>,
    /// "active" or "canceled"; canceling here behaves like a delete.
    pub status: Option<String>,
}

/// Masked view of a saved card. The raw number and cvv never appear in
/// any response after creation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodResponse {
    pub id: i32,
    pub nickname: Option<String>,
    pub card_type: String,
    /// Last four digits only, e.g. "•••• •••• •••• 1111"
    pub masked_number: String,
    /// "MM/20YY"
    pub expiry_date: String,
    pub is_default: bool,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<payment_method::Model> for PaymentMethodResponse {
    fn from(model: payment_method::Model) -> Self {
        Self {
            id: model.id,
            nickname: model.nickname,
            card_type: model.card_type,
            masked_number: common::mask_number(&model.card_number),
            expiry_date: format!("{}/{}", model.expiry_month, model.expiry_year),
            is_default: model.is_default,
            status: model.status.to_value(),
            created_at: model.created_at,
        }
    }
}

fn parse_expiry(expiry_date: &str) -> Result<(String, String), ApiError> {
    common::parse_expiry(expiry_date).ok_or_else(|| {
        ApiError::Validation("Invalid expiry date format. Use MM/YY".to_string())
    })
}

/// Clears the default flag on all of a user's payment methods. Always
/// runs inside the caller's transaction so clear-then-set is one atomic
/// unit per user.
async fn clear_default(txn: &DatabaseTransaction, user_id: i32) -> Result<(), ApiError> {
    payment_method::Entity::update_many()
        .col_expr(payment_method::Column::IsDefault, Expr::value(false))
        .filter(payment_method::Column::UserId.eq(user_id))
        .exec(txn)
        .await?;
    Ok(())
}

/// Get the caller's active payment methods, default first then newest
#[utoipa::path(
    get,
    path = "/api/payment-methods",
    tag = "payment-methods",
    responses(
        (status = 200, description = "Payment methods retrieved successfully", body = ApiResponse<Vec<PaymentMethodResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_payment_methods(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<PaymentMethodResponse>>>, ApiError> {
    let AuthUser(user) = user;

    let methods = payment_method::Entity::find()
        .filter(payment_method::Column::UserId.eq(user.id))
        .filter(payment_method::Column::Status.eq(Status::Active))
        .order_by_desc(payment_method::Column::IsDefault)
        .order_by_desc(payment_method::Column::CreatedAt)
        .all(&state.db)
        .await?;

    debug!("Retrieved {} payment methods for user {}", methods.len(), user.id);

    Ok(Json(ApiResponse {
        data: methods.into_iter().map(PaymentMethodResponse::from).collect(),
        message: "Payment methods retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a single payment method owned by the caller
#[utoipa::path(
    get,
    path = "/api/payment-methods/{payment_method_id}",
    tag = "payment-methods",
    params(
        ("payment_method_id" = i32, Path, description = "Payment method ID"),
    ),
    responses(
        (status = 200, description = "Payment method retrieved successfully", body = ApiResponse<PaymentMethodResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Payment method not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_payment_method(
    user: AuthUser,
    Path(payment_method_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaymentMethodResponse>>, ApiError> {
    let AuthUser(user) = user;

    let method = payment_method::Entity::find_by_id(payment_method_id)
        .filter(payment_method::Column::UserId.eq(user.id))
        .filter(payment_method::Column::Status.eq(Status::Active))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    Ok(Json(ApiResponse {
        data: PaymentMethodResponse::from(method),
        message: "Payment method retrieved successfully".to_string(),
        success: true,
    }))
}

/// Save a new card
#[utoipa::path(
    post,
    path = "/api/payment-methods",
    tag = "payment-methods",
    request_body = CreatePaymentMethodRequest,
    responses(
        (status = 201, description = "Payment method added successfully", body = ApiResponse<PaymentMethodResponse>),
        (status = 400, description = "Missing required card details", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user, request))]
pub async fn create_payment_method(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentMethodRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentMethodResponse>>), ApiError> {
    let AuthUser(user) = user;

    if request.card_number.trim().is_empty()
        || request.card_type.trim().is_empty()
        || request.cvv.trim().is_empty()
        || request.expiry_date.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Missing required card details".to_string(),
        ));
    }
    let (expiry_month, expiry_year) = parse_expiry(&request.expiry_date)?;
    let is_default = request.is_default.unwrap_or(false);

    let txn = state.db.begin().await?;

    if is_default {
        clear_default(&txn, user.id).await?;
    }

    let new_method = payment_method::ActiveModel {
        user_id: Set(user.id),
        nickname: Set(request.nickname),
        card_type: Set(request.card_type),
        card_number: Set(request.card_number),
        expiry_month: Set(expiry_month),
        expiry_year: Set(expiry_year),
        cvv: Set(request.cvv),
        is_default: Set(is_default),
        status: Set(Status::Active),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let method = new_method.insert(&txn).await?;

    txn.commit().await?;

    info!(
        "Payment method created with ID: {} for user {}",
        method.id, user.id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PaymentMethodResponse::from(method),
            message: "Payment method added successfully".to_string(),
            success: true,
        }),
    ))
}

/// Update a saved card's nickname, default flag or expiry
#[utoipa::path(
    put,
    path = "/api/payment-methods/{payment_method_id}",
    tag = "payment-methods",
    params(
        ("payment_method_id" = i32, Path, description = "Payment method ID"),
    ),
    request_body = UpdatePaymentMethodRequest,
    responses(
        (status = 200, description = "Payment method updated successfully", body = ApiResponse<PaymentMethodResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Payment method not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_payment_method(
    user: AuthUser,
    Path(payment_method_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdatePaymentMethodRequest>,
) -> Result<Json<ApiResponse<PaymentMethodResponse>>, ApiError> {
    let AuthUser(user) = user;

    let expiry = request
        .expiry_date
        .as_deref()
        .map(parse_expiry)
        .transpose()?;
    let status = request
        .status
        .map(|raw| {
            Status::try_from_value(&raw)
                .map_err(|_| ApiError::Validation(format!("Invalid status: {raw}")))
        })
        .transpose()?;

    let txn = state.db.begin().await?;

    let existing = payment_method::Entity::find_by_id(payment_method_id)
        .filter(payment_method::Column::UserId.eq(user.id))
        .filter(payment_method::Column::Status.eq(Status::Active))
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    if request.is_default == Some(true) {
        clear_default(&txn, user.id).await?;
    }

    let mut method_active: payment_method::ActiveModel = existing.clone().into();

    if let Some(nickname) = request.nickname {
        method_active.nickname = Set(Some(nickname));
    }
    if let Some((expiry_month, expiry_year)) = expiry {
        method_active.expiry_month = Set(expiry_month);
        method_active.expiry_year = Set(expiry_year);
    }
    if let Some(is_default) = request.is_default {
        method_active.is_default = Set(is_default);
    }
    if let Some(status) = status {
        method_active.status = Set(status);
        if status == Status::Canceled {
            // A canceled card never keeps the default slot.
            method_active.is_default = Set(false);
        }
    }

    let updated = if method_active.is_changed() {
        method_active.update(&txn).await?
    } else {
        existing
    };

    txn.commit().await?;

    info!("Payment method {} updated by user {}", payment_method_id, user.id);

    Ok(Json(ApiResponse {
        data: PaymentMethodResponse::from(updated),
        message: "Payment method updated successfully".to_string(),
        success: true,
    }))
}

/// Soft-delete a saved card
///
/// The row stays for history with `status = canceled`; it disappears
/// from listings and is no longer a valid auto-pay target. The default
/// flag is cleared so no canceled card shadows the default slot.
#[utoipa::path(
    delete,
    path = "/api/payment-methods/{payment_method_id}",
    tag = "payment-methods",
    params(
        ("payment_method_id" = i32, Path, description = "Payment method ID"),
    ),
    responses(
        (status = 200, description = "Payment method deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Payment method not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_payment_method(
    user: AuthUser,
    Path(payment_method_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let AuthUser(user) = user;

    let result = payment_method::Entity::update_many()
        .col_expr(payment_method::Column::Status, Expr::value(Status::Canceled))
        .col_expr(payment_method::Column::IsDefault, Expr::value(false))
        .filter(payment_method::Column::Id.eq(payment_method_id))
        .filter(payment_method::Column::UserId.eq(user.id))
        .filter(payment_method::Column::Status.eq(Status::Active))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            "Payment method {} not found (or not owned) for user {}",
            payment_method_id, user.id
        );
        return Err(ApiError::NotFound("Payment method not found".to_string()));
    }

    info!(
        "Payment method {} canceled by user {}",
        payment_method_id, user.id
    );

    Ok(Json(ApiResponse {
        data: format!("Payment method {} deleted", payment_method_id),
        message: "Payment method deleted successfully".to_string(),
        success: true,
    }))
}

/// Make a card the single default for the caller
///
/// Clear-then-set runs inside one transaction scoped by user id, so at
/// most one active method per user ends up flagged default even under
/// concurrent calls.
#[utoipa::path(
    patch,
    path = "/api/payment-methods/{payment_method_id}/set-default",
    tag = "payment-methods",
    params(
        ("payment_method_id" = i32, Path, description = "Payment method ID"),
    ),
    responses(
        (status = 200, description = "Default payment method updated successfully", body = ApiResponse<PaymentMethodResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Payment method not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn set_default_payment_method(
    user: AuthUser,
    Path(payment_method_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PaymentMethodResponse>>, ApiError> {
    let AuthUser(user) = user;

    let txn = state.db.begin().await?;

    let target = payment_method::Entity::find_by_id(payment_method_id)
        .filter(payment_method::Column::UserId.eq(user.id))
        .filter(payment_method::Column::Status.eq(Status::Active))
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    clear_default(&txn, user.id).await?;

    let mut target_active: payment_method::ActiveModel = target.into();
    target_active.is_default = Set(true);
    let updated = target_active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Payment method {} set as default for user {}",
        payment_method_id, user.id
    );

    Ok(Json(ApiResponse {
        data: PaymentMethodResponse::from(updated),
        message: "Default payment method updated successfully".to_string(),
        success: true,
    }))
}
