use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::users::{repo::StoreError, validation::EMAIL_TAKEN};

/// Body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct FailureEnvelope {
    #[schema(example = false)]
    pub status: bool,
    #[schema(example = "Validation failed!")]
    pub message: String,
    #[schema(example = "The email has already been taken.")]
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// First failing validation rule; the message is shown to the client.
    #[error("{0}")]
    Validation(String),

    #[error("user {0} not found")]
    NotFound(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Cause is logged where it happened and never sent to the client.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn envelope(&self) -> FailureEnvelope {
        let (message, error) = match self {
            ApiError::Validation(msg) => ("Validation failed!", msg.clone()),
            ApiError::MalformedBody(_) => (
                "Validation failed!",
                "The request body must be a valid JSON object.".to_string(),
            ),
            ApiError::NotFound(id) => ("User not found!", format!("No user with id {id}")),
            ApiError::Internal => ("Something went wrong!", "Internal server error".to_string()),
        };
        FailureEnvelope {
            status: false,
            message: message.to_string(),
            error,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(email) => {
                warn!(%email, "store rejected duplicate email");
                ApiError::Validation(EMAIL_TAKEN.to_string())
            }
            StoreError::NotFound(id) => ApiError::NotFound(id.to_string()),
            StoreError::Database(e) => {
                error!(error = %e, "store operation failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}
