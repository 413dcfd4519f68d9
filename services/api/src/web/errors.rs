//! services/api/src/web/errors.rs
//!
//! Maps core errors onto HTTP responses. Every failure is rendered as a status
//! code plus a message the client can show inline.

use axum::http::StatusCode;
use study_companion_core::ports::{AiFailure, PortError};
use study_companion_core::store::RecordStore;
use tracing::{error, warn};

/// The error half of every handler result.
pub type HandlerError = (StatusCode, String);

pub fn error_response(e: PortError) -> HandlerError {
    let status = match &e {
        PortError::DuplicateUser => StatusCode::CONFLICT,
        PortError::WeakPassword => StatusCode::BAD_REQUEST,
        PortError::InvalidCredentials | PortError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Ai(AiFailure::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
        PortError::Ai(_) => StatusCode::BAD_GATEWAY,
        PortError::Storage(_) | PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {:?}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (status, e.to_string())
}

pub fn bad_request(message: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, message.into())
}

/// Returns the current username or a 401.
pub async fn require_user(store: &RecordStore) -> Result<String, HandlerError> {
    store
        .current_user()
        .await
        .ok_or_else(|| error_response(PortError::NotAuthenticated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_auth_errors() {
        assert_eq!(error_response(PortError::DuplicateUser).0, StatusCode::CONFLICT);
        assert_eq!(error_response(PortError::WeakPassword).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            error_response(PortError::InvalidCredentials).0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn maps_ai_failures() {
        let (status, message) = error_response(PortError::Ai(AiFailure::RateLimited));
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(message, AiFailure::RateLimited.user_message());
        assert_eq!(
            error_response(PortError::Ai(AiFailure::Blocked)).0,
            StatusCode::BAD_GATEWAY
        );
    }
}
