use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{db::query_timeout::QueryTimeoutError, error::HttpError};

/// Failure talking to one of the assignment collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Provider transport error: {0}")]
    Transport(String),
}

impl From<sqlx::Error> for ProviderError {
    fn from(err: sqlx::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Ticket {0} not found")]
    TicketNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("User {0} is not an active agent")]
    NotAnAgent(Uuid),

    #[error("Comment {0} not found")]
    CommentNotFound(Uuid),

    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),

    #[error("Agent performance data not found for {0}")]
    PerformanceNotFound(Uuid),

    #[error("User {0} is not authorized to perform this action")]
    Forbidden(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already exists")]
    EmailExists,

    #[error("No agents available for assignment")]
    NoAgentsAvailable,

    #[error("Upstream provider unavailable: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Query error: {0}")]
    Query(#[from] QueryTimeoutError),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if status.is_server_error() {
            tracing::error!("{}", error);
        }
        HttpError::new(error.to_string(), status)
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::TicketNotFound(_)
            | ServiceError::UserNotFound(_)
            | ServiceError::CommentNotFound(_)
            | ServiceError::NotificationNotFound(_)
            | ServiceError::PerformanceNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::NotAnAgent(_)
            | ServiceError::Validation(_)
            | ServiceError::NoAgentsAvailable => StatusCode::BAD_REQUEST,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::EmailExists => StatusCode::CONFLICT,

            ServiceError::Provider(_) => StatusCode::BAD_GATEWAY,

            ServiceError::Database(_)
            | ServiceError::Query(_)
            | ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn maps_service_errors_to_http_statuses() {
        let id = Uuid::new_v4();
        let cases = vec![
            (ServiceError::TicketNotFound(id), StatusCode::NOT_FOUND),
            (ServiceError::CommentNotFound(id), StatusCode::NOT_FOUND),
            (ServiceError::NotAnAgent(id), StatusCode::BAD_REQUEST),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Forbidden(id), StatusCode::FORBIDDEN),
            (ServiceError::EmailExists, StatusCode::CONFLICT),
            (
                ServiceError::Provider(ProviderError::Timeout(Duration::from_secs(2))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ServiceError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let http: HttpError = error.into();
            assert_eq!(http.status, expected);
        }
    }

    #[test]
    fn provider_message_does_not_name_a_collaborator() {
        let message = ServiceError::Provider(ProviderError::Transport("reset".into())).to_string();
        assert_eq!(message, "Upstream provider unavailable: Provider transport error: reset");
        assert!(!message.contains("directory"));
    }

    #[test]
    fn provider_error_wraps_database_failures() {
        let err: ProviderError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
