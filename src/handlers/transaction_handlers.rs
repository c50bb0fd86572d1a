use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::{ErrorResponse, error_response, internal_error, validate_request};
use crate::middleware::auth_middleware::AuthenticatedUser;
use crate::models::category::TransactionType;
use crate::models::filters::{
    DateRangeQuery, TransactionFilters, TransactionListQuery, parse_date_range,
};
use crate::models::transaction::{
    CreateExpenseRequest, CreateIncomeRequest, Transaction, TransactionDetails,
    UpdateExpenseRequest, UpdateIncomeRequest,
};
use crate::services::transaction_service::{TransactionError, TransactionService};

/// Convert TransactionError to HTTP response
impl IntoResponse for TransactionError {
    fn into_response(self) -> Response {
        let (status, error_type) = match self {
            TransactionError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            TransactionError::InvalidCategory(_) => (StatusCode::BAD_REQUEST, "invalid_category"),
            TransactionError::InvalidSubcategory => {
                (StatusCode::BAD_REQUEST, "invalid_subcategory")
            }
            TransactionError::InvalidDate => (StatusCode::BAD_REQUEST, "invalid_date"),
            TransactionError::MissingDateRange => (StatusCode::BAD_REQUEST, "missing_date_range"),
            TransactionError::DatabaseError(ref msg) => return internal_error(msg),
        };

        error_response(status, error_type, &self.to_string())
    }
}

fn list_filters(
    kind: TransactionType,
    query: TransactionListQuery,
) -> Result<TransactionFilters, TransactionError> {
    let date_range = parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())?;

    Ok(TransactionFilters {
        date_range,
        category_id: query.category_id,
        payment_method: query
            .payment_method
            .filter(|_| kind == TransactionType::Expense),
        ..Default::default()
    })
}

async fn list(
    service: Arc<dyn TransactionService>,
    user_id: Uuid,
    kind: TransactionType,
    query: TransactionListQuery,
) -> Result<Json<Vec<TransactionDetails>>, Response> {
    let filters = list_filters(kind, query).map_err(IntoResponse::into_response)?;

    service
        .list_transactions(user_id, kind, filters)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for listing income
///
/// The date range applies only when both `startDate` and `endDate` are given.
#[utoipa::path(
    get,
    path = "/api/income",
    params(
        ("startDate" = Option<String>, Query, description = "Range start (RFC 3339 or YYYY-MM-DD)"),
        ("endDate" = Option<String>, Query, description = "Range end, inclusive"),
        ("categoryId" = Option<Uuid>, Query, description = "Only records in this category")
    ),
    responses(
        (status = 200, description = "Income records, newest first", body = Vec<TransactionDetails>),
        (status = 400, description = "Invalid date", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "income"
)]
pub async fn list_income_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionDetails>>, Response> {
    list(service, auth_user.user_id, TransactionType::Income, query).await
}

/// Handler for recording income
#[utoipa::path(
    post,
    path = "/api/income",
    request_body = CreateIncomeRequest,
    responses(
        (status = 201, description = "Income recorded", body = TransactionDetails),
        (status = 400, description = "Validation error, invalid date or category", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "income"
)]
pub async fn create_income_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateIncomeRequest>,
) -> Result<(StatusCode, Json<TransactionDetails>), Response> {
    validate_request(&request)?;

    match service
        .create_transaction(auth_user.user_id, request.into())
        .await
    {
        Ok(details) => Ok((StatusCode::CREATED, Json(details))),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/income/{id}",
    params(
        ("id" = Uuid, Path, description = "Income ID")
    ),
    responses(
        (status = 200, description = "Income record", body = TransactionDetails),
        (status = 404, description = "Income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "income"
)]
pub async fn get_income_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDetails>, Response> {
    service
        .get_transaction(auth_user.user_id, TransactionType::Income, id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for updating income; only provided fields change
#[utoipa::path(
    patch,
    path = "/api/income/{id}",
    params(
        ("id" = Uuid, Path, description = "Income ID")
    ),
    request_body = UpdateIncomeRequest,
    responses(
        (status = 200, description = "Income updated", body = TransactionDetails),
        (status = 400, description = "Validation error, invalid date or category", body = ErrorResponse),
        (status = 404, description = "Income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "income"
)]
pub async fn update_income_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIncomeRequest>,
) -> Result<Json<TransactionDetails>, Response> {
    validate_request(&request)?;

    service
        .update_transaction(auth_user.user_id, TransactionType::Income, id, request.into())
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

#[utoipa::path(
    delete,
    path = "/api/income/{id}",
    params(
        ("id" = Uuid, Path, description = "Income ID")
    ),
    responses(
        (status = 200, description = "Income deleted", body = Transaction),
        (status = 404, description = "Income not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "income"
)]
pub async fn delete_income_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, Response> {
    service
        .delete_transaction(auth_user.user_id, TransactionType::Income, id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for listing expenses
///
/// The date range applies only when both `startDate` and `endDate` are given.
#[utoipa::path(
    get,
    path = "/api/expenses",
    params(
        ("startDate" = Option<String>, Query, description = "Range start (RFC 3339 or YYYY-MM-DD)"),
        ("endDate" = Option<String>, Query, description = "Range end, inclusive"),
        ("categoryId" = Option<Uuid>, Query, description = "Only records in this category"),
        ("paymentMethod" = Option<String>, Query, description = "Only records paid this way")
    ),
    responses(
        (status = 200, description = "Expense records, newest first", body = Vec<TransactionDetails>),
        (status = 400, description = "Invalid date", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn list_expenses_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionDetails>>, Response> {
    list(service, auth_user.user_id, TransactionType::Expense, query).await
}

/// Handler for recording an expense
#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = TransactionDetails),
        (status = 400, description = "Validation error, invalid date or category", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn create_expense_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<TransactionDetails>), Response> {
    validate_request(&request)?;

    match service
        .create_transaction(auth_user.user_id, request.into())
        .await
    {
        Ok(details) => Ok((StatusCode::CREATED, Json(details))),
        Err(e) => Err(e.into_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/expenses/{id}",
    params(
        ("id" = Uuid, Path, description = "Expense ID")
    ),
    responses(
        (status = 200, description = "Expense record", body = TransactionDetails),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn get_expense_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionDetails>, Response> {
    service
        .get_transaction(auth_user.user_id, TransactionType::Expense, id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for updating an expense; only provided fields change
#[utoipa::path(
    patch,
    path = "/api/expenses/{id}",
    params(
        ("id" = Uuid, Path, description = "Expense ID")
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = TransactionDetails),
        (status = 400, description = "Validation error, invalid date or category", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn update_expense_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<Json<TransactionDetails>, Response> {
    validate_request(&request)?;

    service
        .update_transaction(auth_user.user_id, TransactionType::Expense, id, request.into())
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    params(
        ("id" = Uuid, Path, description = "Expense ID")
    ),
    responses(
        (status = 200, description = "Expense deleted", body = Transaction),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "expenses"
)]
pub async fn delete_expense_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, Response> {
    service
        .delete_transaction(auth_user.user_id, TransactionType::Expense, id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for the merged income and expense list
///
/// Both `startDate` and `endDate` are required.
#[utoipa::path(
    get,
    path = "/api/transactions",
    params(
        ("startDate" = String, Query, description = "Range start (RFC 3339 or YYYY-MM-DD)"),
        ("endDate" = String, Query, description = "Range end, inclusive")
    ),
    responses(
        (status = 200, description = "Income and expenses, newest first", body = Vec<TransactionDetails>),
        (status = 400, description = "Missing or invalid dates", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "transactions"
)]
pub async fn list_transactions_handler(
    State(service): State<Arc<dyn TransactionService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<TransactionDetails>>, Response> {
    let range = parse_date_range(query.start_date.as_deref(), query.end_date.as_deref())
        .map_err(|e| TransactionError::from(e).into_response())?
        .ok_or_else(|| TransactionError::MissingDateRange.into_response())?;

    service
        .list_merged(auth_user.user_id, range)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::PaymentMethod;

    #[test]
    fn test_list_filters_ignore_half_open_range() {
        let query = TransactionListQuery {
            start_date: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        let filters = list_filters(TransactionType::Income, query).unwrap();
        assert!(filters.date_range.is_none());
    }

    #[test]
    fn test_list_filters_drop_payment_method_for_income() {
        let query = TransactionListQuery {
            payment_method: Some(PaymentMethod::Online),
            ..Default::default()
        };
        let filters = list_filters(TransactionType::Income, query.clone()).unwrap();
        assert!(filters.payment_method.is_none());

        let filters = list_filters(TransactionType::Expense, query).unwrap();
        assert_eq!(filters.payment_method, Some(PaymentMethod::Online));
    }

    #[test]
    fn test_list_filters_reject_bad_dates() {
        let query = TransactionListQuery {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("last week".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            list_filters(TransactionType::Expense, query),
            Err(TransactionError::InvalidDate)
        ));
    }

    #[test]
    fn test_error_statuses() {
        let cases = [
            (
                TransactionError::NotFound(TransactionType::Income),
                StatusCode::NOT_FOUND,
            ),
            (
                TransactionError::InvalidCategory(TransactionType::Expense),
                StatusCode::BAD_REQUEST,
            ),
            (TransactionError::InvalidSubcategory, StatusCode::BAD_REQUEST),
            (TransactionError::MissingDateRange, StatusCode::BAD_REQUEST),
            (
                TransactionError::DatabaseError("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_error_messages_name_the_kind() {
        assert_eq!(
            TransactionError::NotFound(TransactionType::Expense).to_string(),
            "Expense not found"
        );
        assert_eq!(
            TransactionError::InvalidCategory(TransactionType::Income).to_string(),
            "Invalid income category"
        );
    }
}
