use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Missing required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No appointment found")]
    NotFound,

    #[error("Store operation failed")]
    Store(#[from] StoreError),

    #[error("Failed to render page")]
    Render(#[from] askama::Error),
}

impl AppointmentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppointmentError::Validation(_) => StatusCode::BAD_REQUEST,
            AppointmentError::NotFound => StatusCode::NOT_FOUND,
            AppointmentError::Store(_) | AppointmentError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to hand back to clients; store and render causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppointmentError::Validation(e) => e.to_string(),
            AppointmentError::NotFound => "No appointment found.".into(),
            AppointmentError::Store(_) | AppointmentError::Render(_) => {
                "An unexpected error occurred".into()
            }
        }
    }
}

impl IntoResponse for AppointmentError {
    fn into_response(self) -> Response {
        if let AppointmentError::Render(e) = &self {
            tracing::error!("Template rendering failed: {:?}", e);
        }

        let body = Json(json!({
            "error": self.public_message(),
        }));

        (self.status_code(), body).into_response()
    }
}
