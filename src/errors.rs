use axum::http::StatusCode;
use std::path::Path;
use thiserror::Error;

/// Rejections raised while turning raw input into a `SleepRecord`.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("invalid {field} date '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("invalid {field} time '{value}', expected HH:MM")]
    InvalidTime { field: &'static str, value: String },

    #[error("sleep ends more than a day before it starts")]
    EndBeforeStart,

    #[error("duration {0} is not a non-negative number of hours")]
    InvalidDuration(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("no record with id {0}")]
    RecordNotFound(i64),

    #[error("duplicate record id {0} in import")]
    DuplicateId(i64),

    #[error("record {id} rejected: {source}")]
    InvalidImport { id: i64, source: RecordError },

    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    pub fn storage(path: &Path, err: std::io::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("failed to write {}: {err}", path.display()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UnknownUser(_) | SessionError::RecordNotFound(_) => {
                Self::not_found(err.to_string())
            }
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
