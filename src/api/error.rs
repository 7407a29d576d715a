use crate::settings::SettingsError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// JSON error body: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        let status = match &e {
            SettingsError::DomainExists(_) | SettingsError::PromptExists(_) => StatusCode::CONFLICT,
            SettingsError::DomainNotFound(_) | SettingsError::PromptNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SettingsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        if !e.is_validation() {
            tracing::error!("Settings operation failed: {}", e);
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Store operation failed: {}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}
