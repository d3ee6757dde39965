use std::error::Error as _;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use image_optimizer_core::{EngineError, RetrievalError};

use crate::state::AppState;
use crate::storage::StorageError;

const UNEXPECTED: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid API key. Please provide a valid API key.")]
    Unauthorized,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Engine(e) => match e {
                EngineError::Validation(_) | EngineError::InvalidData(_) => StatusCode::BAD_REQUEST,
                EngineError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                EngineError::Oversize { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                EngineError::Processing(_) => StatusCode::UNPROCESSABLE_ENTITY,
                EngineError::Retrieval(RetrievalError::Download { .. }) => StatusCode::BAD_REQUEST,
                EngineError::Retrieval(RetrievalError::Read { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized => "INVALID_API_KEY",
            ApiError::Engine(e) => e.code(),
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Caller-facing message. Internal error text only reaches `details`.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Unauthorized => self.to_string(),
            ApiError::Engine(e) => match e {
                EngineError::Validation(_) => e.to_string(),
                EngineError::InvalidData(_) => "Invalid image data".into(),
                EngineError::UnsupportedFormat(_) => "Unsupported file type".into(),
                EngineError::Oversize { .. } => "File too large".into(),
                EngineError::Processing(_) => "Error processing the image".into(),
                EngineError::Retrieval(RetrievalError::Download { .. }) => {
                    "Could not download the image from the provided URL".into()
                }
                EngineError::Retrieval(RetrievalError::Read { .. }) => UNEXPECTED.into(),
            },
            ApiError::Storage(_) | ApiError::Internal(_) => UNEXPECTED.into(),
        }
    }

    fn chain(&self) -> String {
        let mut details = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            details.push_str(": ");
            details.push_str(&err.to_string());
            source = err.source();
        }
        details
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// JSON error body. The full version, details included, rides along in the
/// response extensions until [`expose_details`] decides whether to show it.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub status: StatusBody,
    pub error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self.chain());
        } else {
            log::warn!("{} ({})", self, status);
        }

        let envelope = ErrorEnvelope {
            status: StatusBody {
                code: -i32::from(status.as_u16()),
                message: self.public_message(),
            },
            error: ErrorBody {
                code: self.code(),
                details: None,
            },
        };

        let mut full = envelope.clone();
        full.error.details = Some(self.chain());

        let mut response = (status, Json(envelope)).into_response();
        response.extensions_mut().insert(full);
        response
    }
}

/// Re-render error bodies with their details in development.
pub async fn expose_details(State(state): State<AppState>, response: Response) -> Response {
    if !state.config.is_development() {
        return response;
    }
    match response.extensions().get::<ErrorEnvelope>().cloned() {
        Some(full) => (response.status(), Json(full)).into_response(),
        None => response,
    }
}
