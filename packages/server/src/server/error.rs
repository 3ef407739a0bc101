//! HTTP error mapping.
//!
//! Every handler error becomes `{"error": ..., "status_code": ...}` with the
//! matching HTTP status.

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::domains::auth::AuthError;
use crate::domains::chatrooms::ChatError;
use crate::domains::matching::{MatchError, MatchmakingError};
use crate::domains::prompts::UnknownTopic;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Matchmaking(#[from] MatchmakingError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    UnknownTopic(#[from] UnknownTopic),

    #[error("Not signed in")]
    Unauthorized,

    #[error("User not yet matched. Please run /matchmaking so that they can be matched.")]
    NotMatched,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::EmailExists | AuthError::UsernameExists => StatusCode::CONFLICT,
                AuthError::UnknownEmail => StatusCode::NOT_FOUND,
                AuthError::WrongPassword | AuthError::AuthenticationRequired => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Matchmaking(e) => match e {
                MatchmakingError::NotSignedIn => StatusCode::UNAUTHORIZED,
                MatchmakingError::Profile(_) => StatusCode::SERVICE_UNAVAILABLE,
                MatchmakingError::Match(MatchError::Unavailable(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                MatchmakingError::Match(MatchError::NotMatchedYet) => StatusCode::REQUEST_TIMEOUT,
                MatchmakingError::Match(MatchError::Cancelled | MatchError::Withdrawn) => {
                    StatusCode::CONFLICT
                }
            },
            ApiError::Chat(e) => match e {
                ChatError::NotSignedIn => StatusCode::UNAUTHORIZED,
                ChatError::NotParticipant => StatusCode::FORBIDDEN,
                ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
                ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::UnknownTopic(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized | ApiError::NotMatched => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Details of 5xx errors stay in the logs
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = ?self, "request failed");
                "Internal server error".to_string()
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                error!(error = ?self, "matchmaking unavailable");
                "Matchmaking temporarily unavailable".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "status_code": status.as_u16(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::matching::PoolError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(AuthError::EmailExists).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::UnknownEmail).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(MatchmakingError::from(MatchError::NotMatchedYet)).status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            ApiError::from(ChatError::NotParticipant).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_unavailable_sets_retry_after() {
        let error = MatchError::Unavailable(PoolError::Storage(anyhow::anyhow!("down")));
        let response = ApiError::from(MatchmakingError::from(error)).into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "1");
    }
}
