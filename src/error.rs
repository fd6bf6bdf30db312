use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::render;

/// Failure of a single upstream call. Carries the endpoint path, never the
/// full URL, so the API key stays out of logs and error pages.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            FetchError::Transport { endpoint, .. }
            | FetchError::Status { endpoint, .. }
            | FetchError::Decode { endpoint, .. } => endpoint,
        }
    }
}

/// Errors surfaced by the HTTP handlers.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Fetch {
        message: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("{0}")]
    NotFound(String),
}

impl AppError {
    pub fn fetch(message: &'static str, source: FetchError) -> Self {
        AppError::Fetch { message, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Fetch { message, source } => {
                error!("{}: {}", message, source);
                (StatusCode::BAD_GATEWAY, message.to_string())
            }
            AppError::Render(e) => {
                error!("Template rendering failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong while rendering this page.".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        match render::error_page(&message) {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, message).into_response(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
