use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Profile errors
/// - E3xxx: Feed/matching errors
/// - E4xxx: Messaging errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,

    // Auth (E1xxx)
    TokenExpired,
    TokenInvalid,
    UserBanned,

    // Profile (E2xxx)
    ProfileNotFound,
    PersonalNotFound,
    PersonalAlreadyExists,
    TooManyInterests,
    NotEnoughPhotos,
    PhotoUploadFailed,
    PhotoNotFound,

    // Feed/matching (E3xxx)
    CannotLikeSelf,
    MatchNotFound,

    // Messaging (E4xxx)
    MessageNotFound,
    MessageEmpty,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",

            // Auth
            Self::TokenExpired => "E1001",
            Self::TokenInvalid => "E1002",
            Self::UserBanned => "E1003",

            // Profile
            Self::ProfileNotFound => "E2001",
            Self::PersonalNotFound => "E2002",
            Self::PersonalAlreadyExists => "E2003",
            Self::TooManyInterests => "E2004",
            Self::NotEnoughPhotos => "E2005",
            Self::PhotoUploadFailed => "E2006",
            Self::PhotoNotFound => "E2007",

            // Feed/matching
            Self::CannotLikeSelf => "E3001",
            Self::MatchNotFound => "E3002",

            // Messaging
            Self::MessageNotFound => "E4001",
            Self::MessageEmpty => "E4002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::TooManyInterests
            | Self::NotEnoughPhotos | Self::MessageEmpty
            | Self::PhotoUploadFailed => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ProfileNotFound | Self::PersonalNotFound
            | Self::MatchNotFound | Self::MessageNotFound | Self::PhotoNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::UserBanned | Self::CannotLikeSelf => StatusCode::FORBIDDEN,
            Self::PersonalAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_target_codes_are_not_defined() {
        // Already-discarded / already-unmatched are success flags, never codes.
        // Only genuine failures carry an ErrorCode; spot-check the mapping.
        assert_eq!(ErrorCode::MatchNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::PersonalAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::UserBanned.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn codes_are_stable_strings() {
        assert_eq!(ErrorCode::InternalError.code(), "E0001");
        assert_eq!(ErrorCode::ProfileNotFound.code(), "E2001");
        assert_eq!(ErrorCode::MatchNotFound.code(), "E3002");
        assert_eq!(ErrorCode::MessageEmpty.code(), "E4002");
    }
}
