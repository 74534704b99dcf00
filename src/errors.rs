use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum YokedError {
    #[error("Invalid request: {0}")]
    #[diagnostic(code(yoked::invalid_request))]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(yoked::not_found))]
    NotFound(String),

    #[error("User `{username}` has no {missing} assigned")]
    #[diagnostic(
        code(yoked::incomplete_user),
        help("Assign a shell and an access level with PUT /v1/user/{{id}}")
    )]
    IncompleteUserRecord {
        username: String,
        missing: &'static str,
    },

    #[error("Database error: {0}")]
    #[diagnostic(code(yoked::db))]
    Storage(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    #[diagnostic(code(yoked::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(yoked::config))]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(yoked::serde))]
    Serde(#[from] serde_json::Error),
}

impl YokedError {
    fn status(&self) -> StatusCode {
        match self {
            YokedError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            YokedError::NotFound(_) => StatusCode::NOT_FOUND,
            YokedError::IncompleteUserRecord { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            YokedError::InvalidRequest(_) => "invalid_request",
            YokedError::NotFound(_) => "not_found",
            YokedError::IncompleteUserRecord { .. } => "incomplete_user_record",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for YokedError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = json!({ "error": self.code(), "error_description": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            YokedError::InvalidRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            YokedError::NotFound("group 7".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            YokedError::IncompleteUserRecord {
                username: "bob".into(),
                missing: "shell",
            }
            .into_response()
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            YokedError::Storage(sea_orm::DbErr::Custom("boom".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_incomplete_user_message_names_field() {
        let err = YokedError::IncompleteUserRecord {
            username: "bob".into(),
            missing: "access level",
        };
        assert_eq!(err.to_string(), "User `bob` has no access level assigned");
    }
}
