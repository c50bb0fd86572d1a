use axum::{
    Json,
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::handlers::{ErrorResponse, error_response, internal_error};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::analytics::{
    CategoryAnalyticsQuery, CategoryBreakdown, HistoryBucket, HistoryQuery, Summary,
};
use crate::models::filters::{DateRange, DateRangeQuery, parse_date_range};
use crate::models::transaction::TransactionDetails;
use crate::services::analytics_service::{AnalyticsError, AnalyticsService};

/// Convert AnalyticsError to HTTP response
impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let error_type = match self {
            AnalyticsError::InvalidDate => "invalid_date",
            AnalyticsError::MissingDateRange => "missing_date_range",
            AnalyticsError::MissingType => "missing_type",
            AnalyticsError::DatabaseError(ref msg) => return internal_error(msg),
        };

        error_response(StatusCode::BAD_REQUEST, error_type, &self.to_string())
    }
}

fn required_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, AnalyticsError> {
    parse_date_range(start, end)?.ok_or(AnalyticsError::MissingDateRange)
}

/// Handler for the income/expense summary of a date range
#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    params(
        ("startDate" = String, Query, description = "Range start (RFC 3339 or YYYY-MM-DD)"),
        ("endDate" = String, Query, description = "Range end, inclusive")
    ),
    responses(
        (status = 200, description = "Totals for the range", body = Summary),
        (status = 400, description = "Missing or invalid dates", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "analytics"
)]
pub async fn summary_handler(
    State(service): State<Arc<dyn AnalyticsService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Summary>, Response> {
    let range = required_range(query.start_date.as_deref(), query.end_date.as_deref())
        .map_err(IntoResponse::into_response)?;

    service
        .summary(auth_user.user_id, range)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for per-category totals of one type
#[utoipa::path(
    get,
    path = "/api/analytics/categories",
    params(
        ("type" = String, Query, description = "income or expense"),
        ("startDate" = String, Query, description = "Range start (RFC 3339 or YYYY-MM-DD)"),
        ("endDate" = String, Query, description = "Range end, inclusive")
    ),
    responses(
        (status = 200, description = "Category totals, largest first", body = Vec<CategoryBreakdown>),
        (status = 400, description = "Missing type or dates", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "analytics"
)]
pub async fn categories_handler(
    State(service): State<Arc<dyn AnalyticsService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<CategoryAnalyticsQuery>,
) -> Result<Json<Vec<CategoryBreakdown>>, Response> {
    let kind = query
        .category_type
        .ok_or_else(|| AnalyticsError::MissingType.into_response())?;
    let range = required_range(query.start_date.as_deref(), query.end_date.as_deref())
        .map_err(IntoResponse::into_response)?;

    service
        .categories(auth_user.user_id, kind, range)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for the trailing income/expense history
#[utoipa::path(
    get,
    path = "/api/analytics/history",
    params(
        ("period" = Option<String>, Query, description = "7d, 30d (default) or 1y")
    ),
    responses(
        (status = 200, description = "Zero-filled series in ascending order", body = Vec<HistoryBucket>),
        (status = 400, description = "Unknown period"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "analytics"
)]
pub async fn history_handler(
    State(service): State<Arc<dyn AnalyticsService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryBucket>>, Response> {
    service
        .history(auth_user.user_id, query.period.unwrap_or_default())
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for the five most recent records
#[utoipa::path(
    get,
    path = "/api/analytics/recent",
    responses(
        (status = 200, description = "Latest income and expenses", body = Vec<TransactionDetails>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "analytics"
)]
pub async fn recent_handler(
    State(service): State<Arc<dyn AnalyticsService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<TransactionDetails>>, Response> {
    service
        .recent(auth_user.user_id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}
