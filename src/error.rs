//! Request-level error taxonomy. Every variant maps to an HTTP status and a
//! JSON `{"error": ...}` body. All errors are terminal for the current
//! request; nothing here triggers a retry.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidPayload(&'static str),

    #[error("Authorization header required")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Admin privileges required")]
    AdminRequired,

    // Redemption rejections (spec'd reasons, surfaced as authorization failures).
    #[error("Order code not found")]
    OrderNotFound,

    #[error("Order code already used")]
    OrderAlreadyUsed,

    #[error("Order has not been delivered yet")]
    OrderNotDelivered,

    #[error("No active case available")]
    NoActiveCase,

    #[error("OAuth login is not configured")]
    OAuthUnavailable,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error")]
    Internal,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingAuth | ApiError::InvalidToken | ApiError::UserNotFound => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::OrderNotFound
            | ApiError::OrderAlreadyUsed
            | ApiError::OrderNotDelivered => StatusCode::UNAUTHORIZED,
            ApiError::AdminRequired => StatusCode::FORBIDDEN,
            ApiError::NoActiveCase | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::OAuthUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "brew_detective", error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
