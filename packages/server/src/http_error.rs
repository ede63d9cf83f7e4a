//! HTTP error handling
//!
//! A business rejection answers `400` whose body is the message itself as a
//! JSON string, e.g. `"Parent 9999 does not exist."`. Faults answer `500` with
//! `{"message": ..., "code": ..., "details": ...}`. Either way the code is
//! also sent in the `x-error-code` header.

use animaltree_core::TreeServiceError;
use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// Response header carrying the machine-readable error code
pub const ERROR_CODE_HEADER: HeaderName = HeaderName::from_static("x-error-code");

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "PARENT_NOT_FOUND" | "ANIMAL_NOT_FOUND" | "ANIMAL_IS_PARENT"
            | "CANNOT_DELETE_ROOT" | "WOULD_CREATE_CYCLE" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = HeaderValue::from_str(&self.code).ok();

        let mut response = if status == StatusCode::BAD_REQUEST {
            (status, Json(self.message)).into_response()
        } else {
            (status, Json(self)).into_response()
        };
        if let Some(code) = code {
            response.headers_mut().insert(ERROR_CODE_HEADER, code);
        }
        response
    }
}

impl From<TreeServiceError> for HttpError {
    fn from(err: TreeServiceError) -> Self {
        let message = err.to_string();
        match err {
            TreeServiceError::ParentNotFound { .. } => HttpError::new(message, "PARENT_NOT_FOUND"),
            TreeServiceError::AnimalNotFound { .. } => HttpError::new(message, "ANIMAL_NOT_FOUND"),
            TreeServiceError::AnimalIsParent { .. } => HttpError::new(message, "ANIMAL_IS_PARENT"),
            TreeServiceError::CannotDeleteRoot => HttpError::new(message, "CANNOT_DELETE_ROOT"),
            TreeServiceError::WouldCreateCycle { .. } => {
                HttpError::new(message, "WOULD_CREATE_CYCLE")
            }
            TreeServiceError::RootMissing => HttpError::new(message, "TREE_INVARIANT_VIOLATED"),
            TreeServiceError::Storage(source) => {
                tracing::error!("Storage failure while serving request: {:#}", source);
                HttpError::with_details(
                    "Storage operation failed",
                    "DATABASE_ERROR",
                    format!("{:#}", source),
                )
            }
            TreeServiceError::Render(source) => {
                tracing::error!("Failed to render tree: {}", source);
                HttpError::with_details("Failed to render tree", "RENDER_ERROR", source.to_string())
            }
        }
    }
}
