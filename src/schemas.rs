use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Runtime configuration (token signing, upload dir, admin seed)
    pub config: AppConfig,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

use crate::handlers::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::handlers::expenses::{ExpenseResponse, UpdateExpenseRequest};
use crate::handlers::payment_methods::{
    CreatePaymentMethodRequest, PaymentMethodResponse, UpdatePaymentMethodRequest,
};
use crate::handlers::tax_categories::{
    CreateTaxCategoryRequest, TaxCategoryResponse, UpdateTaxCategoryRequest,
};
use crate::handlers::users::UserResponse;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::users::get_users,
        crate::handlers::users::approve_user,
        crate::handlers::users::reject_user,
        crate::handlers::tax_categories::get_tax_categories,
        crate::handlers::tax_categories::get_tax_category,
        crate::handlers::tax_categories::create_tax_category,
        crate::handlers::tax_categories::update_tax_category,
        crate::handlers::tax_categories::delete_tax_category,
        crate::handlers::expenses::get_expenses,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::payment_methods::get_payment_methods,
        crate::handlers::payment_methods::get_payment_method,
        crate::handlers::payment_methods::create_payment_method,
        crate::handlers::payment_methods::update_payment_method,
        crate::handlers::payment_methods::delete_payment_method,
        crate::handlers::payment_methods::set_default_payment_method,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            CreateTaxCategoryRequest,
            UpdateTaxCategoryRequest,
            TaxCategoryResponse,
            UpdateExpenseRequest,
            ExpenseResponse,
            CreatePaymentMethodRequest,
            UpdatePaymentMethodRequest,
            PaymentMethodResponse,
            ApiResponse<AuthResponse>,
            ApiResponse<UserResponse>,
            ApiResponse<Vec<UserResponse>>,
            ApiResponse<TaxCategoryResponse>,
            ApiResponse<Vec<TaxCategoryResponse>>,
            ApiResponse<ExpenseResponse>,
            ApiResponse<Vec<ExpenseResponse>>,
            ApiResponse<PaymentMethodResponse>,
            ApiResponse<Vec<PaymentMethodResponse>>,
            ApiResponse<String>,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and session resolution"),
        (name = "users", description = "Admin user management endpoints"),
        (name = "tax-categories", description = "Tax category CRUD endpoints"),
        (name = "expenses", description = "Expense CRUD and filtering endpoints"),
        (name = "payment-methods", description = "Saved payment method endpoints"),
    ),
    info(
        title = "TaxTrack API",
        description = "Tax and expense management API - expense tracking against tax categories with saved payment methods",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
