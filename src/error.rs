// Error taxonomy shared by the stores, the shopping list pipeline and the API

use thiserror::Error;

use crate::export::ExportError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication credentials were not provided or are invalid")]
    NotAuthenticated,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} is already in the list")]
    AlreadyMember(String),

    #[error("{0} is not in the list")]
    NotMember(String),

    #[error("Rendering failed: {0}")]
    Rendering(#[from] ExportError),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Errors that are the server's fault rather than the caller's
    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::Rendering(_) | AppError::Storage(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(feature = "server")]
mod response {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use serde::Serialize;
    use tracing::error;

    use super::AppError;

    #[derive(Serialize)]
    struct ErrorBody {
        success: bool,
        error: String,
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = match self {
                AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                AppError::Forbidden => StatusCode::FORBIDDEN,
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
                AppError::Validation(_)
                | AppError::AlreadyMember(_)
                | AppError::NotMember(_) => StatusCode::BAD_REQUEST,
                AppError::Rendering(_) | AppError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };

            let message = if self.is_internal() {
                error!("Request failed: {self}");
                "Internal server error".to_string()
            } else {
                self.to_string()
            };

            let body = ErrorBody {
                success: false,
                error: message,
            };

            (status, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        assert!(AppError::Storage(rusqlite::Error::QueryReturnedNoRows).is_internal());
        assert!(!AppError::NotAuthenticated.is_internal());
        assert!(!AppError::validation("bad").is_internal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(AppError::not_found("Recipe").to_string(), "Recipe not found");
        assert_eq!(
            AppError::AlreadyMember("Recipe".into()).to_string(),
            "Recipe is already in the list"
        );
    }
}
