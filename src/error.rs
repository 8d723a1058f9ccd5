use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
///
/// Authentication-adjacent variants are deliberately coarse on the wire:
/// a caller must not be able to tell an unknown token from a bad signature
/// (see `IntoResponse` below). Internally the variants stay distinct so the
/// refresh flow can branch on them.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A pool configuration error.
    #[error("Pool build error: {0}")]
    PoolBuild(#[from] deadpool_postgres::CreatePoolError),

    /// An authentication failure: bad credentials or an unregistered /
    /// stale refresh token. Recoverable by re-authenticating.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Refresh-token reuse was detected and the session has been revoked.
    /// The caller must perform a fresh login; retrying is never valid.
    #[error("Forbidden")]
    Forbidden,

    /// A token whose signature does not verify against the session key.
    #[error("Invalid token")]
    InvalidToken,

    /// A token that verified but is past its expiry.
    #[error("Token expired")]
    TokenExpired,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness conflict (e.g. email already registered).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }

            AppError::PoolBuild(ref e) => {
                tracing::error!("Pool build error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                // The reason stays in the logs, never in the body.
                (StatusCode::UNAUTHORIZED, "Authentication failed".to_string())
            }

            AppError::Forbidden => {
                tracing::warn!("Refresh token reuse detected, session revoked");
                (StatusCode::FORBIDDEN, "Relogin required".to_string())
            }

            AppError::InvalidToken => {
                tracing::warn!("Token signature rejected");
                (StatusCode::UNAUTHORIZED, "Authentication failed".to_string())
            }

            AppError::TokenExpired => {
                tracing::debug!("Token expired");
                (StatusCode::UNAUTHORIZED, "Token expired".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_share_one_status_and_message() {
        // An attacker probing /refresh must not learn which check failed.
        let unknown = AppError::Authentication("token not registered".to_string())
            .into_response();
        let bad_sig = AppError::InvalidToken.into_response();
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(bad_sig.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn reuse_detection_maps_to_forbidden() {
        let resp = AppError::Forbidden.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
