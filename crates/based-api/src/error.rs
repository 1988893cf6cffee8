use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use based_context::{CacheError, ContextError};
use based_persist::PersistError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("User not found")]
    UserNotFound,

    #[error("Chat {0} not found")]
    ConversationNotFound(i64),

    #[error("Chat {0} does not belong to the current user")]
    AccessDenied(i64),

    #[error("User has no chat credits")]
    InsufficientCredits,

    #[error("Chat {0} is already being processed")]
    ConversationBusy(i64),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Persistence error: {0}")]
    Persist(PersistError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::UserNotFound(_) => ApiError::UserNotFound,
            PersistError::ConversationNotFound(id) => ApiError::ConversationNotFound(id),
            other => ApiError::Persist(other),
        }
    }
}

impl From<ContextError> for ApiError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cache(e) => ApiError::Cache(e),
            ContextError::Persist(e) => e.into(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UserNotFound | ApiError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AccessDenied(_) => StatusCode::FORBIDDEN,
            ApiError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            ApiError::ConversationBusy(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Persist(_) | ApiError::Cache(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::UserNotFound | ApiError::ConversationNotFound(_) => "not_found",
            ApiError::AccessDenied(_) => "access_denied",
            ApiError::InsufficientCredits => "insufficient_credits",
            ApiError::ConversationBusy(_) => "rate_limit_error",
            ApiError::Unauthorized(_) => "authentication_error",
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::Persist(_) | ApiError::Cache(_) => "service_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match self {
            ApiError::Persist(ref e) => {
                tracing::error!(error = %e, "Persistence error");
                "Storage service unavailable".to_string()
            }
            ApiError::Cache(ref e) => {
                tracing::error!(error = %e, "Cache error");
                "Cache service unavailable".to_string()
            }
            ApiError::Internal(ref msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
            ref other => other.to_string(),
        };

        let body = Json(json!({
            "detail": detail,
            "type": self.kind(),
        }));

        (self.status(), body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
