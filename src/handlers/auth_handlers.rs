use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::handlers::{ErrorResponse, error_response, internal_error, validate_request};
use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::user::{CreateUserRequest, User};
use crate::services::auth_service::{AuthError, AuthService};

/// Convert AuthError to HTTP response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AuthError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "duplicate_email",
                "Email already exists",
            ),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password",
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid authentication token",
            ),
            AuthError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Authentication token has expired",
            ),
            AuthError::DatabaseError(ref msg) => return internal_error(msg),
        };

        error_response(status, error_type, message)
    }
}

/// Handler for user registration
///
/// Creates a new user account and seeds its default categories.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User successfully registered", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), Response> {
    validate_request(&request)?;

    match auth_service.register(request).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(e.into_response()),
    }
}

/// Handler for user login
///
/// Authenticates a user and returns a JWT token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthToken),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<dyn AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthToken>, Response> {
    auth_service
        .login(request)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestServices;

    fn auth_service() -> Arc<dyn AuthService> {
        TestServices::new().auth_service
    }

    fn register_request(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: Some("Test User".to_string()),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_handler_success() {
        let auth_service = auth_service();

        let result =
            register_handler(State(auth_service), Json(register_request("test@example.com"))).await;

        let (status, Json(user)) = result.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.name.as_deref(), Some("Test User"));
        assert_eq!(user.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_register_handler_validation_error() {
        let auth_service = auth_service();

        let mut request = register_request("invalid-email");
        request.password = "short".to_string();

        let response = register_handler(State(auth_service), Json(request))
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body_json["error"], "validation_error");
        let message = body_json["message"].as_str().unwrap();
        assert!(message.contains("email: Invalid email format"));
        assert!(message.contains("password: Password must be at least 8 characters"));
    }

    #[tokio::test]
    async fn test_register_handler_duplicate_email() {
        let auth_service = auth_service();

        let (status, _) = register_handler(
            State(auth_service.clone()),
            Json(register_request("test@example.com")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let response =
            register_handler(State(auth_service), Json(register_request("test@example.com")))
                .await
                .unwrap_err();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_handler_success_and_invalid_credentials() {
        let auth_service = auth_service();
        let (status, _) = register_handler(
            State(auth_service.clone()),
            Json(register_request("test@example.com")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(token) = login_handler(
            State(auth_service.clone()),
            Json(LoginRequest {
                email: "test@example.com".to_string(),
                password: "password123".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!token.token.is_empty());

        let response = login_handler(
            State(auth_service),
            Json(LoginRequest {
                email: "test@example.com".to_string(),
                password: "wrongpassword".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_database_error_is_generic_500() {
        let response = AuthError::DatabaseError("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
