use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use tracing::error;

/// JSON error body: `{"error": <message>, "code": <camelCase code>}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self { status, code, msg: msg.into() }
    }

    pub fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
    }

    pub fn shop_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "shopNotFound", "Shop not found")
    }

    pub fn account_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "accountNotFound", "No account found. Please sign up.")
    }

    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "tooManyRequests", "Too many requests. Slow down.")
    }

    /// Store or internal failure. The detail goes to the log, not the client.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "somethingWentWrong", "Something went wrong.")
    }

    /// Ledger error on a shop-scoped route.
    pub fn shop(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => Self::shop_not_found(),
            other => other.into(),
        }
    }

    /// Ledger error on a user-scoped route.
    pub fn account(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => Self::account_not_found(),
            other => other.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::bad_request("invalidInput", msg),
            ServiceError::Model(models::errors::ModelError::Validation(msg)) => Self::bad_request("invalidInput", msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "notFound", msg),
            other => Self::internal(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => Self::bad_request("invalidInput", msg),
            AuthError::Conflict => {
                Self::new(StatusCode::CONFLICT, "accountExists", "Account already exists. Please login.")
            }
            AuthError::NotFound => Self::account_not_found(),
            AuthError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, "invalidPassword", "Invalid password."),
            other => {
                let code = other.code();
                Self::internal(format!("auth error {code}: {other}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.msg, "code": self.code}))).into_response()
    }
}
