use crate::handlers::{
    auth::{login, me, register},
    expenses::{create_expense, delete_expense, get_expenses, update_expense},
    health::health_check,
    payment_methods::{
        create_payment_method, delete_payment_method, get_payment_method, get_payment_methods,
        set_default_payment_method, update_payment_method,
    },
    tax_categories::{
        create_tax_category, delete_tax_category, get_tax_categories, get_tax_category,
        update_tax_category,
    },
    users::{approve_user, get_users, reject_user},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let upload_dir = state.config.upload_dir.clone();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        // Admin user management routes
        .route("/api/users", get(get_users))
        .route("/api/users/approve/:user_id", patch(approve_user))
        .route("/api/users/reject/:user_id", patch(reject_user))
        // Tax category CRUD routes
        .route("/api/tax-categories", get(get_tax_categories))
        .route("/api/tax-categories", post(create_tax_category))
        .route("/api/tax-categories/:category_id", get(get_tax_category))
        .route("/api/tax-categories/:category_id", put(update_tax_category))
        .route("/api/tax-categories/:category_id", delete(delete_tax_category))
        // Expense CRUD routes
        .route("/api/expenses", get(get_expenses))
        .route("/api/expenses", post(create_expense))
        .route("/api/expenses/:expense_id", put(update_expense))
        .route("/api/expenses/:expense_id", delete(delete_expense))
        // Payment method routes
        .route("/api/payment-methods", get(get_payment_methods))
        .route("/api/payment-methods", post(create_payment_method))
        .route("/api/payment-methods/:payment_method_id", get(get_payment_method))
        .route("/api/payment-methods/:payment_method_id", put(update_payment_method))
        .route("/api/payment-methods/:payment_method_id", delete(delete_payment_method))
        .route(
            "/api/payment-methods/:payment_method_id/set-default",
            patch(set_default_payment_method),
        )
        // Receipt uploads
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
