//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache engines, strategies and HTTP layer.
///
/// Expiry is never reported through this type: an expired entry is a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Write cannot fit even after eviction
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Eviction strategy name is not registered
    #[error("Unknown eviction strategy: {0}")]
    UnknownStrategy(String),

    /// The physical storage medium is absent or not registered
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Underlying file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::CapacityExceeded(_) => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::UnknownStrategy(_) => StatusCode::BAD_REQUEST,
            CacheError::EngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Io(_) | CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_exceeded_status() {
        let response = CacheError::CapacityExceeded("too big".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
    }

    #[test]
    fn test_unknown_strategy_status() {
        let response = CacheError::UnknownStrategy("clock".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_io_error_converts() {
        let err: CacheError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(err, CacheError::Io(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
