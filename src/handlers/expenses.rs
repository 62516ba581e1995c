use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use model::entities::expense::{self, ExpenseType};
use model::entities::payment_method::{self, Status};
use model::entities::tax_category;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Optional, conjunctive expense filters. No filter present returns all
/// of the caller's expenses; ranges are inclusive on both ends.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    /// Exact tax category match
    pub category: Option<i32>,
    /// Earliest date (inclusive, YYYY-MM-DD)
    pub date_from: Option<NaiveDate>,
    /// Latest date (inclusive, YYYY-MM-DD)
    pub date_to: Option<NaiveDate>,
    /// Minimum amount (inclusive)
    pub amount_min: Option<Decimal>,
    /// Maximum amount (inclusive)
    pub amount_max: Option<Decimal>,
}

/// Request body for updating an expense; absent fields stay unchanged.
#[derive(Debug, Deserialize, Serialize, ToSchema, Default)]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i32>,
    pub expense_type: Option<String>,
    pub recurring_day: Option<i32>,
    pub payment_method_id: Option<i32>,
}

/// Expense with joined category data and the derived tax amount.
/// `tax_amount` is recomputed from the current category rate on every
/// read; it is never stored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: i32,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: i32,
    pub category_name: String,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub expense_type: String,
    pub is_recurring: bool,
    pub recurring_day: Option<i32>,
    pub receipt_path: Option<String>,
    pub payment_method_id: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ExpenseResponse {
    fn from_joined(model: expense::Model, category: &tax_category::Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            amount: model.amount,
            date: model.date,
            category_id: model.category_id,
            category_name: category.name.clone(),
            tax_percentage: category.tax_percentage,
            tax_amount: common::tax_amount(model.amount, category.tax_percentage),
            expense_type: model.expense_type.to_value(),
            is_recurring: model.is_recurring,
            recurring_day: model.recurring_day,
            receipt_path: model.receipt_path,
            payment_method_id: model.payment_method_id,
            created_at: model.created_at,
        }
    }
}

/// Accumulates multipart form fields for expense creation.
#[derive(Debug, Default)]
struct ExpenseForm {
    description: Option<String>,
    amount: Option<String>,
    date: Option<String>,
    category: Option<String>,
    expense_type: Option<String>,
    recurring_day: Option<String>,
    payment_method: Option<String>,
    receipt_file_name: Option<String>,
    receipt_bytes: Option<Vec<u8>>,
}

async fn read_expense_form(multipart: &mut Multipart) -> Result<ExpenseForm, ApiError> {
    let mut form = ExpenseForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "receipt" => {
                form.receipt_file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Failed to read receipt: {e}")))?;
                form.receipt_bytes = Some(bytes.to_vec());
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("Malformed field '{name}': {e}")))?;
                match name.as_str() {
                    "description" => form.description = Some(value),
                    "amount" => form.amount = Some(value),
                    "date" => form.date = Some(value),
                    "category" => form.category = Some(value),
                    "expenseType" => form.expense_type = Some(value),
                    "recurringDay" => form.recurring_day = Some(value),
                    "selectedPaymentMethod" => form.payment_method = Some(value),
                    // Unknown fields are ignored.
                    _ => debug!("Ignoring unknown multipart field: {}", name),
                }
            }
        }
    }

    Ok(form)
}

fn parse_amount(raw: &str) -> Result<Decimal, ApiError> {
    let amount = Decimal::from_str(raw)
        .map_err(|_| ApiError::Validation("Amount must be a positive number".to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "Amount must be a positive number".to_string(),
        ));
    }
    Ok(amount)
}

fn parse_expense_type(raw: Option<&str>) -> Result<ExpenseType, ApiError> {
    match raw {
        None => Ok(ExpenseType::OneTime),
        Some(value) => ExpenseType::try_from_value(&value.to_string())
            .map_err(|_| ApiError::Validation(format!("Invalid expense type: {value}"))),
    }
}

/// A recurring expense needs a day of month bounded to 1-28 so every
/// month has the charge day; other types carry no recurring day.
fn resolve_recurring_day(
    expense_type: ExpenseType,
    recurring_day: Option<i32>,
) -> Result<Option<i32>, ApiError> {
    if expense_type != ExpenseType::Recurring {
        return Ok(None);
    }
    let day = recurring_day.ok_or_else(|| {
        ApiError::Validation("Recurring expenses require a recurring day".to_string())
    })?;
    if !(1..=28).contains(&day) {
        return Err(ApiError::Validation(
            "Recurring day must be between 1 and 28".to_string(),
        ));
    }
    Ok(Some(day))
}

async fn load_category(
    db: &DatabaseConnection,
    category_id: i32,
) -> Result<tax_category::Model, ApiError> {
    tax_category::Entity::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Validation(format!("Tax category {category_id} not found")))
}

/// An auto-pay reference is only valid when the card exists, belongs to
/// the calling user and has not been canceled.
async fn validate_payment_method(
    db: &DatabaseConnection,
    user_id: i32,
    payment_method_id: i32,
) -> Result<(), ApiError> {
    let owned = payment_method::Entity::find_by_id(payment_method_id)
        .filter(payment_method::Column::UserId.eq(user_id))
        .filter(payment_method::Column::Status.eq(Status::Active))
        .one(db)
        .await?;
    if owned.is_none() {
        return Err(ApiError::Validation(
            "Payment method does not belong to the current user".to_string(),
        ));
    }
    Ok(())
}

async fn store_receipt(
    upload_dir: &str,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<String, ApiError> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create upload dir: {e}")))?;

    let extension = file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .unwrap_or("bin");
    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);

    let path = std::path::Path::new(upload_dir).join(&stored_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store receipt: {e}")))?;

    Ok(format!("{upload_dir}/{stored_name}"))
}

/// Get the caller's expenses, newest first, with optional filters
#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "expenses",
    params(ExpenseListQuery),
    responses(
        (status = 200, description = "Expenses retrieved successfully", body = ApiResponse<Vec<ExpenseResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn get_expenses(
    user: AuthUser,
    Query(filters): Query<ExpenseListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ExpenseResponse>>>, ApiError> {
    let AuthUser(user) = user;

    let mut query = expense::Entity::find().filter(expense::Column::UserId.eq(user.id));

    if let Some(category) = filters.category {
        query = query.filter(expense::Column::CategoryId.eq(category));
    }
    if let Some(date_from) = filters.date_from {
        query = query.filter(expense::Column::Date.gte(date_from));
    }
    if let Some(date_to) = filters.date_to {
        query = query.filter(expense::Column::Date.lte(date_to));
    }
    if let Some(amount_min) = filters.amount_min {
        query = query.filter(expense::Column::Amount.gte(amount_min));
    }
    if let Some(amount_max) = filters.amount_max {
        query = query.filter(expense::Column::Amount.lte(amount_max));
    }

    let rows = query
        .order_by_desc(expense::Column::Date)
        .find_also_related(tax_category::Entity)
        .all(&state.db)
        .await?;

    debug!("Retrieved {} expenses for user {}", rows.len(), user.id);

    let mut expenses = Vec::with_capacity(rows.len());
    for (expense_model, category) in rows {
        let category = category.ok_or_else(|| {
            ApiError::Internal(format!(
                "Expense {} references a missing tax category",
                expense_model.id
            ))
        })?;
        expenses.push(ExpenseResponse::from_joined(expense_model, &category));
    }

    Ok(Json(ApiResponse {
        data: expenses,
        message: "Expenses retrieved successfully".to_string(),
        success: true,
    }))
}

/// Create an expense (multipart, with an optional `receipt` file part)
#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "expenses",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Fields: description, amount, date, category, expenseType, recurringDay, selectedPaymentMethod, and an optional `receipt` file part"
    ),
    responses(
        (status = 201, description = "Expense created successfully", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user, multipart))]
pub async fn create_expense(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), ApiError> {
    let AuthUser(user) = user;
    let form = read_expense_form(&mut multipart).await?;

    let description = form
        .description
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Description is required".to_string()))?;
    let amount = parse_amount(
        form.amount
            .as_deref()
            .ok_or_else(|| ApiError::Validation("Amount is required".to_string()))?,
    )?;
    let date = form
        .date
        .as_deref()
        .ok_or_else(|| ApiError::Validation("Date is required".to_string()))?
        .parse::<NaiveDate>()
        .map_err(|_| ApiError::Validation("Date must be in YYYY-MM-DD format".to_string()))?;
    let category_id = form
        .category
        .as_deref()
        .ok_or_else(|| ApiError::Validation("Category is required".to_string()))?
        .parse::<i32>()
        .map_err(|_| ApiError::Validation("Category must be a numeric ID".to_string()))?;

    let expense_type = parse_expense_type(form.expense_type.as_deref())?;
    let recurring_day = form
        .recurring_day
        .as_deref()
        .map(|raw| {
            raw.parse::<i32>()
                .map_err(|_| ApiError::Validation("Recurring day must be a number".to_string()))
        })
        .transpose()?;
    let recurring_day = resolve_recurring_day(expense_type, recurring_day)?;

    let payment_method_id = form
        .payment_method
        .as_deref()
        .map(|raw| {
            raw.parse::<i32>().map_err(|_| {
                ApiError::Validation("Payment method must be a numeric ID".to_string())
            })
        })
        .transpose()?;

    let category = load_category(&state.db, category_id).await?;
    if let Some(payment_method_id) = payment_method_id {
        validate_payment_method(&state.db, user.id, payment_method_id).await?;
    }

    let receipt_path = match form.receipt_bytes {
        Some(bytes) if !bytes.is_empty() => Some(
            store_receipt(
                &state.config.upload_dir,
                form.receipt_file_name.as_deref(),
                &bytes,
            )
            .await?,
        ),
        _ => None,
    };

    let new_expense = expense::ActiveModel {
        user_id: Set(user.id),
        description: Set(description),
        amount: Set(amount),
        date: Set(date),
        category_id: Set(category_id),
        expense_type: Set(expense_type),
        receipt_path: Set(receipt_path),
        is_recurring: Set(expense_type == ExpenseType::Recurring),
        recurring_day: Set(recurring_day),
        payment_method_id: Set(payment_method_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let expense_model = new_expense.insert(&state.db).await?;

    info!(
        "Expense created with ID: {} for user {}",
        expense_model.id, user.id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ExpenseResponse::from_joined(expense_model, &category),
            message: "Expense created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Update an expense owned by the caller
///
/// A non-owned or absent id answers 404 either way, so existence of
/// other users' expenses never leaks.
#[utoipa::path(
    put,
    path = "/api/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated successfully", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn update_expense(
    user: AuthUser,
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, ApiError> {
    let AuthUser(user) = user;

    let existing = expense::Entity::find_by_id(expense_id)
        .filter(expense::Column::UserId.eq(user.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Expense not found".to_string()))?;

    let expense_type = match request.expense_type.as_deref() {
        Some(raw) => parse_expense_type(Some(raw))?,
        None => existing.expense_type,
    };
    let recurring_day =
        resolve_recurring_day(expense_type, request.recurring_day.or(existing.recurring_day))?;

    if let Some(amount) = request.amount {
        if amount <= Decimal::ZERO {
            return Err(ApiError::Validation(
                "Amount must be a positive number".to_string(),
            ));
        }
    }

    let category_id = request.category_id.unwrap_or(existing.category_id);
    let category = load_category(&state.db, category_id).await?;
    if let Some(payment_method_id) = request.payment_method_id {
        validate_payment_method(&state.db, user.id, payment_method_id).await?;
    }

    let mut expense_active: expense::ActiveModel = existing.into();

    if let Some(description) = request.description {
        if description.trim().is_empty() {
            return Err(ApiError::Validation("Description is required".to_string()));
        }
        expense_active.description = Set(description);
    }
    if let Some(amount) = request.amount {
        expense_active.amount = Set(amount);
    }
    if let Some(date) = request.date {
        expense_active.date = Set(date);
    }
    expense_active.category_id = Set(category_id);
    expense_active.expense_type = Set(expense_type);
    expense_active.is_recurring = Set(expense_type == ExpenseType::Recurring);
    expense_active.recurring_day = Set(recurring_day);
    if let Some(payment_method_id) = request.payment_method_id {
        expense_active.payment_method_id = Set(Some(payment_method_id));
    }

    let updated = expense_active.update(&state.db).await?;

    info!("Expense {} updated by user {}", expense_id, user.id);

    Ok(Json(ApiResponse {
        data: ExpenseResponse::from_joined(updated, &category),
        message: "Expense updated successfully".to_string(),
        success: true,
    }))
}

/// Delete an expense owned by the caller
#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user))]
pub async fn delete_expense(
    user: AuthUser,
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let AuthUser(user) = user;

    let result = expense::Entity::delete_many()
        .filter(expense::Column::Id.eq(expense_id))
        .filter(expense::Column::UserId.eq(user.id))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            "Expense {} not found (or not owned) for user {}",
            expense_id, user.id
        );
        return Err(ApiError::NotFound("Expense not found".to_string()));
    }

    info!("Expense {} deleted by user {}", expense_id, user.id);

    Ok(Json(ApiResponse {
        data: format!("Expense {} deleted", expense_id),
        message: "Expense deleted successfully".to_string(),
        success: true,
    }))
}
