use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::TableName;

/// Failure of a backing medium's raw load or save
#[derive(Error, Debug)]
pub enum MediumError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Content encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),
}

/// Errors surfaced by the table store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{table}: record {id} not found")]
    NotFound { table: TableName, id: String },

    #[error("{table}: record {id} already exists")]
    AlreadyExists { table: TableName, id: String },

    #[error("{table}: backing medium unavailable: {source}")]
    MediumUnavailable {
        table: TableName,
        #[source]
        source: MediumError,
    },

    #[error("{table}: malformed snapshot: {source}")]
    MalformedSnapshot {
        table: TableName,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Resource is not owned by the current user")]
    Forbidden,

    #[error("Unauthorized")]
    Unauthorized,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Store(StoreError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Store(StoreError::AlreadyExists { .. }) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Store(StoreError::MediumUnavailable { ref source, table }) => {
                tracing::error!("Medium error on {}: {:?}", table, source);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage temporarily unavailable".to_string(),
                )
            }
            AppError::Store(StoreError::MalformedSnapshot { ref source, table }) => {
                tracing::error!("Malformed snapshot for {}: {:?}", table, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let not_found = AppError::from(StoreError::NotFound {
            table: TableName::Users,
            id: "u1".to_string(),
        });
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let exists = AppError::from(StoreError::AlreadyExists {
            table: TableName::Orders,
            id: "o1".to_string(),
        });
        assert_eq!(exists.into_response().status(), StatusCode::CONFLICT);

        let medium = AppError::from(StoreError::MediumUnavailable {
            table: TableName::Products,
            source: MediumError::Api {
                status: 403,
                message: "rate limited".to_string(),
            },
        });
        assert_eq!(
            medium.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_error_messages_name_the_table() {
        let err = StoreError::NotFound {
            table: TableName::Comments,
            id: "c9".to_string(),
        };
        assert_eq!(err.to_string(), "comments: record c9 not found");
        assert!(err.is_not_found());
        assert!(!err.is_already_exists());
    }
}
