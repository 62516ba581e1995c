#[cfg(test)]
mod integration_tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::{
        admin_token, approve_user, approved_user_token, bearer, create_payment_method,
        create_tax_category, login, register_user, setup_test_app, TEST_PASSWORD,
    };
    use axum::http::{header::AUTHORIZATION, StatusCode};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    fn expense_form(description: &str, amount: &str, date: &str, category_id: i64) -> MultipartForm {
        MultipartForm::new()
            .add_text("description", description)
            .add_text("amount", amount)
            .add_text("date", date)
            .add_text("category", category_id.to_string())
    }

    async fn list_expenses(server: &TestServer, token: &str) -> Vec<Value> {
        let response = server
            .get("/api/expenses")
            .add_header(AUTHORIZATION, bearer(token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        body.data
    }

    async fn list_payment_methods(server: &TestServer, token: &str) -> Vec<Value> {
        let response = server
            .get("/api/payment-methods")
            .add_header(AUTHORIZATION, bearer(token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        body.data
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_returns_token_and_profile() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "name": "Alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
                "nationality": "NL",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        assert!(!body.data["token"].as_str().unwrap().is_empty());
        assert_eq!(body.data["user"]["email"], "alice@example.com");
        assert_eq!(body.data["user"]["role"], "user");
        assert_eq!(body.data["user"]["is_approved"], false);

        // The password hash must never be serialized.
        let text = response.text();
        assert!(!text.contains("password"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflict() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        register_user(&server, "Alice", "alice@example.com").await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "name": "Another Alice",
                "email": "alice@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "name": "Bob",
                "email": "not-an-email",
                "password": TEST_PASSWORD,
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_requires_admin_approval() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let (user_id, _) = register_user(&server, "Alice", "alice@example.com").await;

        // Unapproved account cannot log in.
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": "alice@example.com", "password": TEST_PASSWORD }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Admin approval unlocks login.
        let admin = admin_token(&server).await;
        approve_user(&server, &admin, user_id).await;

        let token = login(&server, "alice@example.com", TEST_PASSWORD).await;
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": "nobody@example.com", "password": "whatever" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        register_user(&server, "Alice", "alice@example.com").await;
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": "alice@example.com", "password": "wrong-password" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_resolves_current_user() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;

        let response = server
            .get("/api/auth/me")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["email"], "alice@example.com");

        // Missing and malformed tokens are rejected.
        server.get("/api/auth/me").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/auth/me")
            .add_header(AUTHORIZATION, bearer("not-a-real-token"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_listing_requires_admin() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_token = approved_user_token(&server, "Alice", "alice@example.com").await;
        let response = server
            .get("/api/users")
            .add_header(AUTHORIZATION, bearer(&user_token))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let admin = admin_token(&server).await;
        let response = server
            .get("/api/users")
            .add_header(AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);

        let body: ApiResponse<Vec<Value>> = response.json();
        assert!(body.data.iter().all(|user| user["role"] != "admin"));
        assert!(body.data.iter().any(|user| user["email"] == "alice@example.com"));
    }

    #[tokio::test]
    async fn test_approve_unknown_user_not_found() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let response = server
            .patch("/api/users/approve/99999")
            .add_header(AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tax_category_crud() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let category_id = create_tax_category(&server, &admin, "Travel", "7.50").await;

        // Listing is public.
        let response = server.get("/api/tax-categories").await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<Value>> = response.json();
        assert!(body.data.iter().any(|c| c["name"] == "Travel"));

        // Toggling is_active alone leaves the rate untouched.
        let response = server
            .put(&format!("/api/tax-categories/{category_id}"))
            .add_header(AUTHORIZATION, bearer(&admin))
            .json(&json!({ "is_active": false }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["is_active"], false);
        let rate: f64 = body.data["tax_percentage"].as_str().unwrap().parse().unwrap();
        assert_eq!(rate, 7.5);

        // Delete, then reads answer 404.
        let response = server
            .delete(&format!("/api/tax-categories/{category_id}"))
            .add_header(AUTHORIZATION, bearer(&admin))
            .await;
        response.assert_status(StatusCode::OK);

        let user_token = approved_user_token(&server, "Alice", "alice@example.com").await;
        server
            .get(&format!("/api/tax-categories/{category_id}"))
            .add_header(AUTHORIZATION, bearer(&user_token))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tax_category_mutation_is_admin_only() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let user_token = approved_user_token(&server, "Alice", "alice@example.com").await;
        let response = server
            .post("/api/tax-categories")
            .add_header(AUTHORIZATION, bearer(&user_token))
            .json(&json!({ "name": "Travel", "tax_percentage": "5.00" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_tax_category_validation() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;

        let response = server
            .post("/api/tax-categories")
            .add_header(AUTHORIZATION, bearer(&admin))
            .json(&json!({ "name": "", "tax_percentage": "5.00" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post("/api/tax-categories")
            .add_header(AUTHORIZATION, bearer(&admin))
            .json(&json!({ "name": "Negative", "tax_percentage": "-1" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expense_tax_amount_is_derived() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let category_id = create_tax_category(&server, &admin, "Office", "5.00").await;
        let token = approved_user_token(&server, "Alice", "alice@example.com").await;

        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token))
            .multipart(expense_form("Office chair", "100", "2025-03-01", category_id))
            .await;
        response.assert_status(StatusCode::CREATED);

        let expenses = list_expenses(&server, &token).await;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0]["tax_amount"], "5.00");
        assert_eq!(expenses[0]["category_name"], "Office");
        assert_eq!(expenses[0]["expense_type"], "one-time");
        assert_eq!(expenses[0]["is_recurring"], false);
    }

    #[tokio::test]
    async fn test_expense_filters_are_conjunctive_and_idempotent() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let office = create_tax_category(&server, &admin, "Office", "5.00").await;
        let travel = create_tax_category(&server, &admin, "Travel", "10.00").await;
        let token = approved_user_token(&server, "Alice", "alice@example.com").await;

        for (description, amount, date, category) in [
            ("Desk", "100", "2025-01-10", office),
            ("Monitor", "300", "2025-02-10", office),
            ("Train ticket", "50", "2025-03-01", travel),
        ] {
            server
                .post("/api/expenses")
                .add_header(AUTHORIZATION, bearer(&token))
                .multipart(expense_form(description, amount, date, category))
                .await
                .assert_status(StatusCode::CREATED);
        }

        // No filters: everything, newest first.
        let all = list_expenses(&server, &token).await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[0]["description"], "Train ticket");
        assert_eq!(all[2]["description"], "Desk");

        // Category filter.
        let response = server
            .get("/api/expenses")
            .add_query_param("category", office)
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 2);

        // Date range is inclusive on both ends.
        let response = server
            .get("/api/expenses")
            .add_query_param("dateFrom", "2025-01-10")
            .add_query_param("dateTo", "2025-01-10")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0]["description"], "Desk");

        // Amount range combined with category.
        let response = server
            .get("/api/expenses")
            .add_query_param("category", office)
            .add_query_param("amountMin", "100")
            .add_query_param("amountMax", "300")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 2);

        // Applying the same filters twice yields the same result set.
        let repeat = server
            .get("/api/expenses")
            .add_query_param("category", office)
            .add_query_param("amountMin", "100")
            .add_query_param("amountMax", "300")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        let repeat_body: ApiResponse<Vec<Value>> = repeat.json();
        let ids = |rows: &[Value]| rows.iter().map(|r| r["id"].as_i64().unwrap()).collect::<Vec<_>>();
        assert_eq!(ids(&body.data), ids(&repeat_body.data));

        // Clearing filters returns the full list again.
        assert_eq!(list_expenses(&server, &token).await.len(), 3);
    }

    #[tokio::test]
    async fn test_recurring_expense_day_bounds() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let category_id = create_tax_category(&server, &admin, "Subscriptions", "0.00").await;
        let token = approved_user_token(&server, "Alice", "alice@example.com").await;

        // Recurring without a day is rejected.
        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token))
            .multipart(
                expense_form("Streaming", "15", "2025-03-01", category_id)
                    .add_text("expenseType", "recurring"),
            )
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Day 30 is out of bounds.
        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token))
            .multipart(
                expense_form("Streaming", "15", "2025-03-01", category_id)
                    .add_text("expenseType", "recurring")
                    .add_text("recurringDay", "30"),
            )
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Day 15 is accepted.
        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token))
            .multipart(
                expense_form("Streaming", "15", "2025-03-01", category_id)
                    .add_text("expenseType", "recurring")
                    .add_text("recurringDay", "15"),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["recurring_day"], 15);
        assert_eq!(body.data["is_recurring"], true);
    }

    #[tokio::test]
    async fn test_expense_ownership_is_enforced() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let category_id = create_tax_category(&server, &admin, "Office", "5.00").await;
        let token_a = approved_user_token(&server, "Alice", "alice@example.com").await;
        let token_b = approved_user_token(&server, "Bob", "bob@example.com").await;

        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token_a))
            .multipart(expense_form("Desk", "100", "2025-01-10", category_id))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let expense_id = body.data["id"].as_i64().unwrap();

        // Another user's update and delete behave as if the row is absent.
        server
            .put(&format!("/api/expenses/{expense_id}"))
            .add_header(AUTHORIZATION, bearer(&token_b))
            .json(&json!({ "amount": "1" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/expenses/{expense_id}"))
            .add_header(AUTHORIZATION, bearer(&token_b))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // The owner's data is unchanged.
        let expenses = list_expenses(&server, &token_a).await;
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0]["amount"], "100");

        // The owner can update and delete.
        let response = server
            .put(&format!("/api/expenses/{expense_id}"))
            .add_header(AUTHORIZATION, bearer(&token_a))
            .json(&json!({ "amount": "150" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["amount"], "150");
        assert_eq!(body.data["tax_amount"], "7.50");

        server
            .delete(&format!("/api/expenses/{expense_id}"))
            .add_header(AUTHORIZATION, bearer(&token_a))
            .await
            .assert_status(StatusCode::OK);
        assert!(list_expenses(&server, &token_a).await.is_empty());
    }

    #[tokio::test]
    async fn test_expense_auto_pay_reference_must_be_owned() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let category_id = create_tax_category(&server, &admin, "Office", "5.00").await;
        let token_a = approved_user_token(&server, "Alice", "alice@example.com").await;
        let token_b = approved_user_token(&server, "Bob", "bob@example.com").await;

        let bobs_card = create_payment_method(&server, &token_b, "4222222222222222", false).await;

        // Referencing another user's card is rejected.
        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token_a))
            .multipart(
                expense_form("Desk", "100", "2025-01-10", category_id)
                    .add_text("selectedPaymentMethod", bobs_card.to_string()),
            )
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // The caller's own active card is accepted.
        let alices_card = create_payment_method(&server, &token_a, "4111111111111111", false).await;
        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token_a))
            .multipart(
                expense_form("Desk", "100", "2025-01-10", category_id)
                    .add_text("selectedPaymentMethod", alices_card.to_string()),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["payment_method_id"].as_i64().unwrap(), alices_card);
    }

    #[tokio::test]
    async fn test_receipt_upload_roundtrip() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let category_id = create_tax_category(&server, &admin, "Office", "5.00").await;
        let token = approved_user_token(&server, "Alice", "alice@example.com").await;

        let receipt = b"fake-receipt-bytes".to_vec();
        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token))
            .multipart(
                expense_form("Printer ink", "42", "2025-03-01", category_id).add_part(
                    "receipt",
                    Part::bytes(receipt.clone())
                        .file_name("receipt.png")
                        .mime_type("image/png"),
                ),
            )
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: ApiResponse<Value> = response.json();
        let receipt_path = body.data["receipt_path"].as_str().unwrap();
        let stored_name = receipt_path.rsplit('/').next().unwrap();

        // The stored file is served back under /uploads.
        let response = server.get(&format!("/uploads/{stored_name}")).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.as_bytes().as_ref(), receipt.as_slice());
    }

    #[tokio::test]
    async fn test_payment_method_masked_roundtrip() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;
        create_payment_method(&server, &token, "4111111111111111", false).await;

        let response = server
            .get("/api/payment-methods")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;
        response.assert_status(StatusCode::OK);

        // Masked number keeps the submitted last four; the raw number and
        // cvv never appear anywhere in the payload.
        let body: ApiResponse<Vec<Value>> = response.json();
        assert_eq!(body.data.len(), 1);
        let method = &body.data[0];
        assert!(method["masked_number"].as_str().unwrap().ends_with("1111"));
        assert!(method.get("card_number").is_none());
        assert!(method.get("cvv").is_none());

        let text = response.text();
        assert!(!text.contains("4111111111111111"));
    }

    #[tokio::test]
    async fn test_payment_method_single_default_invariant() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;
        create_payment_method(&server, &token, "4111111111111111", true).await;
        let second = create_payment_method(&server, &token, "4222222222222222", false).await;

        // Switching the default clears the previous one.
        server
            .patch(&format!("/api/payment-methods/{second}/set-default"))
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::OK);

        let methods = list_payment_methods(&server, &token).await;
        let defaults: Vec<i64> = methods
            .iter()
            .filter(|m| m["is_default"] == true)
            .map(|m| m["id"].as_i64().unwrap())
            .collect();
        assert_eq!(defaults, vec![second]);

        // Creating a new default card also swaps atomically.
        let third = create_payment_method(&server, &token, "4333333333333333", true).await;
        let methods = list_payment_methods(&server, &token).await;
        let defaults: Vec<i64> = methods
            .iter()
            .filter(|m| m["is_default"] == true)
            .map(|m| m["id"].as_i64().unwrap())
            .collect();
        assert_eq!(defaults, vec![third]);
    }

    #[tokio::test]
    async fn test_concurrent_set_default_keeps_single_default() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;
        let first = create_payment_method(&server, &token, "4111111111111111", false).await;
        let second = create_payment_method(&server, &token, "4222222222222222", false).await;
        let third = create_payment_method(&server, &token, "4333333333333333", false).await;

        let f1 = server
            .patch(&format!("/api/payment-methods/{first}/set-default"))
            .add_header(AUTHORIZATION, bearer(&token));
        let f2 = server
            .patch(&format!("/api/payment-methods/{second}/set-default"))
            .add_header(AUTHORIZATION, bearer(&token));
        let f3 = server
            .patch(&format!("/api/payment-methods/{third}/set-default"))
            .add_header(AUTHORIZATION, bearer(&token));

        let (r1, r2, r3) = tokio::join!(f1, f2, f3);
        r1.assert_status(StatusCode::OK);
        r2.assert_status(StatusCode::OK);
        r3.assert_status(StatusCode::OK);

        let methods = list_payment_methods(&server, &token).await;
        let default_count = methods.iter().filter(|m| m["is_default"] == true).count();
        assert_eq!(default_count, 1);
    }

    #[tokio::test]
    async fn test_payment_method_soft_delete() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;
        let first = create_payment_method(&server, &token, "4111111111111111", false).await;
        let second = create_payment_method(&server, &token, "4222222222222222", true).await;

        server
            .delete(&format!("/api/payment-methods/{second}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::OK);

        // Canceled methods vanish from listings and leave no default
        // behind unless one is reassigned.
        let methods = list_payment_methods(&server, &token).await;
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0]["id"].as_i64().unwrap(), first);
        assert!(methods.iter().all(|m| m["is_default"] == false));

        // Reads and updates of the canceled card answer 404.
        server
            .get(&format!("/api/payment-methods/{second}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .put(&format!("/api/payment-methods/{second}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "nickname": "ghost" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api/payment-methods/{second}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payment_method_validation() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;

        let response = server
            .post("/api/payment-methods")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({
                "cardNumber": "4111111111111111",
                "cardType": "visa",
                "cvv": "",
                "expiryDate": "04/27",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post("/api/payment-methods")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({
                "cardNumber": "4111111111111111",
                "cardType": "visa",
                "cvv": "987",
                "expiryDate": "4/27",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_payment_method_update_keeps_card_immutable() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;
        let id = create_payment_method(&server, &token, "4111111111111111", false).await;

        let response = server
            .put(&format!("/api/payment-methods/{id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&json!({ "nickname": "Work card", "expiryDate": "05/30" }))
            .await;
        response.assert_status(StatusCode::OK);

        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["nickname"], "Work card");
        assert_eq!(body.data["expiry_date"], "05/2030");
        assert!(body.data["masked_number"].as_str().unwrap().ends_with("1111"));
    }

    #[tokio::test]
    async fn test_set_default_unknown_id_not_found() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let token = approved_user_token(&server, "Alice", "alice@example.com").await;
        server
            .patch("/api/payment-methods/99999/set-default")
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tax_category_delete_restricted_when_referenced() {
        let app = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let admin = admin_token(&server).await;
        let category_id = create_tax_category(&server, &admin, "Office", "5.00").await;
        let token = approved_user_token(&server, "Alice", "alice@example.com").await;

        let response = server
            .post("/api/expenses")
            .add_header(AUTHORIZATION, bearer(&token))
            .multipart(expense_form("Desk", "100", "2025-01-10", category_id))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        let expense_id = body.data["id"].as_i64().unwrap();

        // Referenced category cannot be deleted.
        server
            .delete(&format!("/api/tax-categories/{category_id}"))
            .add_header(AUTHORIZATION, bearer(&admin))
            .await
            .assert_status(StatusCode::CONFLICT);

        // Once the referencing expense is gone the delete goes through.
        server
            .delete(&format!("/api/expenses/{expense_id}"))
            .add_header(AUTHORIZATION, bearer(&token))
            .await
            .assert_status(StatusCode::OK);
        server
            .delete(&format!("/api/tax-categories/{category_id}"))
            .add_header(AUTHORIZATION, bearer(&admin))
            .await
            .assert_status(StatusCode::OK);
    }
}
