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
use crate::models::category::{
    Category, CategoryListQuery, CategoryWithSubcategories, CreateCategoryRequest,
    UpdateCategoryRequest,
};
use crate::models::subcategory::{
    CreateSubcategoryRequest, Subcategory, UpdateSubcategoryRequest,
};
use crate::services::category_service::{CategoryError, CategoryService};

/// Convert CategoryError to HTTP response
impl IntoResponse for CategoryError {
    fn into_response(self) -> Response {
        let status = match self {
            CategoryError::CategoryNotFound | CategoryError::SubcategoryNotFound => {
                StatusCode::NOT_FOUND
            }
            CategoryError::CannotRenameDefault => StatusCode::BAD_REQUEST,
            CategoryError::DuplicateName
            | CategoryError::DuplicateSubcategoryName
            | CategoryError::DefaultCategory
            | CategoryError::CategoryInUse
            | CategoryError::HasSubcategories
            | CategoryError::SubcategoryInUse => StatusCode::CONFLICT,
            CategoryError::DatabaseError(ref msg) => return internal_error(msg),
        };

        let error_type = match self {
            CategoryError::CategoryNotFound => "category_not_found",
            CategoryError::SubcategoryNotFound => "subcategory_not_found",
            CategoryError::CannotRenameDefault => "default_category",
            CategoryError::DuplicateName | CategoryError::DuplicateSubcategoryName => {
                "duplicate_name"
            }
            CategoryError::DefaultCategory => "default_category",
            CategoryError::CategoryInUse
            | CategoryError::HasSubcategories
            | CategoryError::SubcategoryInUse => "in_use",
            CategoryError::DatabaseError(_) => "internal_error",
        };

        error_response(status, error_type, &self.to_string())
    }
}

/// Handler for listing categories
///
/// Returns the user's categories ordered by name, each with its subcategories.
#[utoipa::path(
    get,
    path = "/api/categories",
    params(
        ("type" = Option<String>, Query, description = "Only categories of this type (income or expense)")
    ),
    responses(
        (status = 200, description = "List of categories", body = Vec<CategoryWithSubcategories>),
        (status = 400, description = "Unknown type", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "categories"
)]
pub async fn list_categories_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<CategoryWithSubcategories>>, Response> {
    category_service
        .list_categories(auth_user.user_id, query.category_type)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for creating a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Category with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "categories"
)]
pub async fn create_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), Response> {
    validate_request(&request)?;

    match category_service
        .create_category(auth_user.user_id, request)
        .await
    {
        Ok(category) => Ok((StatusCode::CREATED, Json(category))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for updating a category
///
/// Default categories accept color and icon changes only.
#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Validation error or rename of a default category", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "categories"
)]
pub async fn update_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(category_id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, Response> {
    validate_request(&request)?;

    category_service
        .update_category(auth_user.user_id, category_id, request)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for deleting a category
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category is default or still in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "categories"
)]
pub async fn delete_category_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<Category>, Response> {
    category_service
        .delete_category(auth_user.user_id, category_id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for creating a subcategory under one of the user's categories
#[utoipa::path(
    post,
    path = "/api/subcategories",
    request_body = CreateSubcategoryRequest,
    responses(
        (status = 201, description = "Subcategory created", body = Subcategory),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Subcategory with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "subcategories"
)]
pub async fn create_subcategory_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(request): Json<CreateSubcategoryRequest>,
) -> Result<(StatusCode, Json<Subcategory>), Response> {
    validate_request(&request)?;

    match category_service
        .create_subcategory(auth_user.user_id, request)
        .await
    {
        Ok(subcategory) => Ok((StatusCode::CREATED, Json(subcategory))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for renaming a subcategory
#[utoipa::path(
    patch,
    path = "/api/subcategories/{id}",
    params(
        ("id" = Uuid, Path, description = "Subcategory ID")
    ),
    request_body = UpdateSubcategoryRequest,
    responses(
        (status = 200, description = "Subcategory updated", body = Subcategory),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Subcategory not found", body = ErrorResponse),
        (status = 409, description = "Subcategory with this name already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "subcategories"
)]
pub async fn update_subcategory_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(subcategory_id): Path<Uuid>,
    Json(request): Json<UpdateSubcategoryRequest>,
) -> Result<Json<Subcategory>, Response> {
    validate_request(&request)?;

    category_service
        .update_subcategory(auth_user.user_id, subcategory_id, request)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

/// Handler for deleting a subcategory
#[utoipa::path(
    delete,
    path = "/api/subcategories/{id}",
    params(
        ("id" = Uuid, Path, description = "Subcategory ID")
    ),
    responses(
        (status = 200, description = "Subcategory deleted", body = Subcategory),
        (status = 404, description = "Subcategory not found", body = ErrorResponse),
        (status = 409, description = "Subcategory is still in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "subcategories"
)]
pub async fn delete_subcategory_handler(
    State(category_service): State<Arc<dyn CategoryService>>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(subcategory_id): Path<Uuid>,
) -> Result<Json<Subcategory>, Response> {
    category_service
        .delete_subcategory(auth_user.user_id, subcategory_id)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}
