use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Per-field validation messages, collected across the whole payload before
/// the request is rejected.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("caller address is not on the allow-list")]
    Forbidden,
    #[error("JSON parse error - {0}")]
    Parse(String),
    #[error("invalid inbound mail payload")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
    #[error("unable to store attachment: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<ValidationErrors> for WebhookError {
    fn from(errors: ValidationErrors) -> Self {
        WebhookError::Validation(errors)
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "detail": "You do not have permission to perform this action."
                })),
            )
                .into_response(),
            WebhookError::Parse(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            WebhookError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            WebhookError::Database(err) => {
                error!(error = %err, "failed to persist inbound mail");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error." })),
                )
                    .into_response()
            }
            WebhookError::Storage(err) => {
                error!(error = %err, "failed to store attachment");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error." })),
                )
                    .into_response()
            }
        }
    }
}
