//! Error types and their HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the inquiry service
#[derive(Error, Debug)]
pub enum AppError {
    /// A required field is missing or malformed
    #[error("Invalid input ({field}): {message}")]
    Validation { field: String, message: String },

    /// The mail transport could not deliver a message
    #[error("Delivery error: {message}")]
    Delivery { message: String },

    /// The browser-side client could not reach the service
    #[error("Network error: {message}")]
    Network { message: String },

    /// Email template rendering failed
    #[error("Template error: {source}")]
    Template {
        #[from]
        source: askama::Error,
    },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl AppError {
    /// Create a new validation error for the given field
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new delivery error
    pub fn delivery<S: Into<String>>(message: S) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create a new client-side network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } | AppError::Delivery { message } => {
                message.clone()
            }
            AppError::Network { .. } => "Something went wrong. Please try again.".to_string(),
            AppError::Template { .. } | AppError::Config { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let field = match &self {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            error: self.user_message(),
            field,
        };

        (self.status(), Json(body)).into_response()
    }
}
