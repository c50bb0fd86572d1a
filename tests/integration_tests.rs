//! End-to-end tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL=postgresql://... cargo test -- --ignored`.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use std::sync::atomic::{AtomicU64, Ordering};
use tower::ServiceExt;

use budget_tracker::app::{AppState, create_router};
use budget_tracker::config::Config;
use budget_tracker::repositories::user_repository::{PostgresUserRepository, UserRepository};

/// Global counter for generating unique test emails
static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique email for each test to avoid conflicts
fn unique_email(prefix: &str) -> String {
    let count = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}{}_{}@test.example.com", prefix, count, timestamp)
}

/// Test fixture owning the pool and the fully wired router
struct TestContext {
    pool: sqlx::PgPool,
    app: Router,
}

impl TestContext {
    async fn new() -> Self {
        dotenv::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/budget_tracker".to_string());

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let config = Config {
            database_url,
            jwt_secret: "test_secret".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            database_max_connections: 5,
            jwt_expiration_hours: 1,
        };
        let app = create_router(AppState::from_pool(pool.clone(), &config));

        Self { pool, app }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Register and log in a fresh user, returning the bearer token
    async fn sign_in(&self, prefix: &str) -> String {
        let email = unique_email(prefix);
        let (status, _) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "name": "Test User", "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn category_id(&self, token: &str, name: &str, kind: &str) -> String {
        let (_, body) = self
            .request("GET", &format!("/api/categories?type={}", kind), Some(token), None)
            .await;
        body.as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .map(|c| c["id"].as_str().unwrap().to_string())
            .expect("category should exist")
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_register_persists_user_with_default_categories() {
    let ctx = TestContext::new().await;
    let email = unique_email("register");

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Test User", "email": email, "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], email.as_str());
    assert!(body["createdAt"].is_string());
    assert!(body.get("passwordHash").is_none());

    let users = PostgresUserRepository::new(ctx.pool.clone());
    let user = users.find_by_email(&email).await.unwrap().unwrap();
    assert!(user.password_hash.starts_with("$2"));

    let seeded: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM categories WHERE user_id = $1 AND is_default",
    )
    .bind(user.id)
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(seeded, 13);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_register_duplicate_email() {
    let ctx = TestContext::new().await;
    let payload = json!({
        "email": unique_email("duplicate"),
        "password": "password123"
    });

    let (status, _) = ctx
        .request("POST", "/api/auth/register", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx
        .request("POST", "/api/auth/register", None, Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_email");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_login_wrong_password() {
    let ctx = TestContext::new().await;
    let email = unique_email("wrong_password");
    ctx.request(
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;

    let (status, body) = ctx
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "wrongpassword" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_expense_lifecycle_and_analytics() {
    let ctx = TestContext::new().await;
    let token = ctx.sign_in("lifecycle").await;
    let employment = ctx.category_id(&token, "Employment", "income").await;
    let food = ctx.category_id(&token, "Food", "expense").await;

    let (status, sub) = ctx
        .request(
            "POST",
            "/api/subcategories",
            Some(&token),
            Some(json!({ "name": "Groceries", "categoryId": food })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .request(
            "POST",
            "/api/income",
            Some(&token),
            Some(json!({
                "name": "Salary",
                "amount": "1000.00",
                "date": "2024-03-01",
                "categoryId": employment,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, expense) = ctx
        .request(
            "POST",
            "/api/expenses",
            Some(&token),
            Some(json!({
                "name": "Weekly shop",
                "amount": "400.00",
                "date": "2024-03-05",
                "categoryId": food,
                "subcategoryId": sub["id"],
                "paymentMethod": "debit_card",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(expense["subcategory"]["name"], "Groceries");
    let expense_uri = format!("/api/expenses/{}", expense["id"].as_str().unwrap());

    let (status, listed) = ctx
        .request(
            "GET",
            &format!("/api/expenses?categoryId={}", food),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, summary) = ctx
        .request(
            "GET",
            "/api/analytics/summary?startDate=2024-03-01&endDate=2024-03-31",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let rate: rust_decimal::Decimal = summary["savingsRate"].as_str().unwrap().parse().unwrap();
    assert_eq!(rate, rust_decimal::Decimal::from(60));

    // The subcategory cannot go while an expense references it
    let (status, _) = ctx
        .request(
            "DELETE",
            &format!("/api/subcategories/{}", sub["id"].as_str().unwrap()),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = ctx
        .request(
            "PATCH",
            &expense_uri,
            Some(&token),
            Some(json!({ "amount": "450.00", "notes": "incl. snacks" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "incl. snacks");

    let (status, _) = ctx.request("DELETE", &expense_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.request("GET", &expense_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_users_cannot_see_each_other() {
    let ctx = TestContext::new().await;
    let alice = ctx.sign_in("alice").await;
    let bob = ctx.sign_in("bob").await;
    let housing = ctx.category_id(&alice, "Housing", "expense").await;

    let (_, expense) = ctx
        .request(
            "POST",
            "/api/expenses",
            Some(&alice),
            Some(json!({
                "name": "Rent",
                "amount": 900,
                "date": "2024-03-01",
                "categoryId": housing,
            })),
        )
        .await;
    let uri = format!("/api/expenses/{}", expense["id"].as_str().unwrap());

    let (status, _) = ctx.request("GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = ctx.request("GET", "/api/expenses", Some(&bob), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}
