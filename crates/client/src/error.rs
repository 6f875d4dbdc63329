//! Client error types.

use domain::services::GatewayError;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by the remote repository.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Not signed in")]
    NotSignedIn,
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ClientError {
    /// Builds an API error from a status and whatever body came with it.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ClientError::Api {
                status,
                code: parsed.error,
                message: parsed.message,
            },
            Err(_) => ClientError::Api {
                status,
                code: "http_error".to_string(),
                message: body.trim().to_string(),
            },
        }
    }
}

impl From<ClientError> for GatewayError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api {
                status: 404,
                message,
                ..
            } => GatewayError::NotFound(message),
            ClientError::Api {
                status: 400,
                message,
                ..
            } => GatewayError::Validation(message),
            ClientError::Api {
                status: 401,
                message,
                ..
            } => GatewayError::Unauthorized(message),
            ClientError::Api {
                status: 403,
                message,
                ..
            } => GatewayError::Forbidden(message),
            ClientError::Api {
                status: 409,
                message,
                ..
            } => GatewayError::Conflict(message),
            ClientError::NotSignedIn => GatewayError::Unauthorized("Not signed in".to_string()),
            other => GatewayError::Storage(other.to_string()),
        }
    }
}
