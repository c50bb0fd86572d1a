use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, patch, post},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::ErrorResponse;
use crate::handlers::analytics_handlers::{
    categories_handler, history_handler, recent_handler, summary_handler,
};
use crate::handlers::auth_handlers::{login_handler, register_handler};
use crate::handlers::category_handlers::{
    create_category_handler, create_subcategory_handler, delete_category_handler,
    delete_subcategory_handler, list_categories_handler, update_category_handler,
    update_subcategory_handler,
};
use crate::handlers::transaction_handlers::{
    create_expense_handler, create_income_handler, delete_expense_handler, delete_income_handler,
    get_expense_handler, get_income_handler, list_expenses_handler, list_income_handler,
    list_transactions_handler, update_expense_handler, update_income_handler,
};
use crate::middleware::auth_middleware::auth_middleware;
use crate::models::analytics::{CategoryBreakdown, HistoryBucket, HistoryPeriod, Summary};
use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::category::{
    Category, CategoryWithSubcategories, CreateCategoryRequest, TransactionType,
    UpdateCategoryRequest,
};
use crate::models::subcategory::{
    CreateSubcategoryRequest, Subcategory, UpdateSubcategoryRequest,
};
use crate::models::transaction::{
    CreateExpenseRequest, CreateIncomeRequest, IncomeFrequency, PaymentMethod, Transaction,
    TransactionDetails, UpdateExpenseRequest, UpdateIncomeRequest,
};
use crate::models::user::{CreateUserRequest, User};
use crate::repositories::category_repository::PostgresCategoryRepository;
use crate::repositories::subcategory_repository::PostgresSubcategoryRepository;
use crate::repositories::transaction_repository::PostgresTransactionRepository;
use crate::repositories::user_repository::PostgresUserRepository;
use crate::services::analytics_service::{AnalyticsService, AnalyticsServiceImpl};
use crate::services::auth_service::{AuthService, AuthServiceImpl};
use crate::services::category_service::{CategoryService, CategoryServiceImpl};
use crate::services::transaction_service::{TransactionService, TransactionServiceImpl};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth_handlers::register_handler,
        crate::handlers::auth_handlers::login_handler,
        crate::handlers::category_handlers::list_categories_handler,
        crate::handlers::category_handlers::create_category_handler,
        crate::handlers::category_handlers::update_category_handler,
        crate::handlers::category_handlers::delete_category_handler,
        crate::handlers::category_handlers::create_subcategory_handler,
        crate::handlers::category_handlers::update_subcategory_handler,
        crate::handlers::category_handlers::delete_subcategory_handler,
        crate::handlers::transaction_handlers::list_income_handler,
        crate::handlers::transaction_handlers::create_income_handler,
        crate::handlers::transaction_handlers::get_income_handler,
        crate::handlers::transaction_handlers::update_income_handler,
        crate::handlers::transaction_handlers::delete_income_handler,
        crate::handlers::transaction_handlers::list_expenses_handler,
        crate::handlers::transaction_handlers::create_expense_handler,
        crate::handlers::transaction_handlers::get_expense_handler,
        crate::handlers::transaction_handlers::update_expense_handler,
        crate::handlers::transaction_handlers::delete_expense_handler,
        crate::handlers::transaction_handlers::list_transactions_handler,
        crate::handlers::analytics_handlers::summary_handler,
        crate::handlers::analytics_handlers::categories_handler,
        crate::handlers::analytics_handlers::history_handler,
        crate::handlers::analytics_handlers::recent_handler,
    ),
    components(
        schemas(
            User, CreateUserRequest, LoginRequest, AuthToken, ErrorResponse,
            TransactionType, Category, CategoryWithSubcategories, CreateCategoryRequest,
            UpdateCategoryRequest, Subcategory, CreateSubcategoryRequest,
            UpdateSubcategoryRequest, IncomeFrequency, PaymentMethod, Transaction,
            TransactionDetails, CreateIncomeRequest, CreateExpenseRequest,
            UpdateIncomeRequest, UpdateExpenseRequest, Summary, CategoryBreakdown,
            HistoryPeriod, HistoryBucket,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "categories", description = "Income and expense categories"),
        (name = "subcategories", description = "Subcategories nested under a category"),
        (name = "income", description = "Income records"),
        (name = "expenses", description = "Expense records"),
        (name = "transactions", description = "Income and expenses combined"),
        (name = "analytics", description = "Summaries, breakdowns and history"),
    ),
    info(
        title = "Budget Tracker API",
        version = "0.1.0",
        description = "REST API for tracking personal income and expenses",
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Services shared by every handler; each handler extracts the one it needs
#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub category_service: Arc<dyn CategoryService>,
    pub transaction_service: Arc<dyn TransactionService>,
    pub analytics_service: Arc<dyn AnalyticsService>,
}

impl AppState {
    /// Wire the PostgreSQL repositories into the services
    pub fn from_pool(pool: PgPool, config: &Config) -> Self {
        let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
        let category_repository = Arc::new(PostgresCategoryRepository::new(pool.clone()));
        let subcategory_repository = Arc::new(PostgresSubcategoryRepository::new(pool.clone()));
        let transaction_repository = Arc::new(PostgresTransactionRepository::new(pool));

        let auth_service = AuthServiceImpl::new(
            user_repository,
            category_repository.clone(),
            config.jwt_secret.clone(),
        )
        .with_token_lifetime(config.jwt_expiration_hours);

        Self {
            auth_service: Arc::new(auth_service),
            category_service: Arc::new(CategoryServiceImpl::new(
                category_repository.clone(),
                subcategory_repository.clone(),
                transaction_repository.clone(),
            )),
            transaction_service: Arc::new(TransactionServiceImpl::new(
                transaction_repository.clone(),
                category_repository.clone(),
                subcategory_repository,
            )),
            analytics_service: Arc::new(AnalyticsServiceImpl::new(
                transaction_repository,
                category_repository,
            )),
        }
    }
}

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/api/categories/{id}",
            patch(update_category_handler).delete(delete_category_handler),
        )
        .route("/api/subcategories", post(create_subcategory_handler))
        .route(
            "/api/subcategories/{id}",
            patch(update_subcategory_handler).delete(delete_subcategory_handler),
        )
        .route(
            "/api/income",
            get(list_income_handler).post(create_income_handler),
        )
        .route(
            "/api/income/{id}",
            get(get_income_handler)
                .patch(update_income_handler)
                .delete(delete_income_handler),
        )
        .route(
            "/api/expenses",
            get(list_expenses_handler).post(create_expense_handler),
        )
        .route(
            "/api/expenses/{id}",
            get(get_expense_handler)
                .patch(update_expense_handler)
                .delete(delete_expense_handler),
        )
        .route("/api/transactions", get(list_transactions_handler))
        .route("/api/analytics/summary", get(summary_handler))
        .route("/api/analytics/categories", get(categories_handler))
        .route("/api/analytics/history", get(history_handler))
        .route("/api/analytics/recent", get(recent_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
