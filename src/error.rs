//! Error handling

use axum::response::IntoResponse;
use tracing::info;

use crate::constants::GENERIC_FAILURE_MESSAGE;

/// Error definitions for the zidu application.
#[derive(Debug)]
pub enum ZiduError {
    /// When you didn't do the right thing
    BadRequest,
    /// Missing or invalid session token
    Unauthorized,
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),

    /// The Gemini API key is not configured
    Configuration(String),
    /// An uploaded file could not be read or isn't a supported image
    Read(String),
    /// The Gemini call failed or returned no image
    Generation(String),
}

impl std::fmt::Display for ZiduError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest => write!(f, "Bad request"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::InternalServerError(message) => write!(f, "Internal server error: {message}"),
            Self::Configuration(message) => write!(f, "Configuration error: {message}"),
            Self::Read(message) => write!(f, "Read error: {message}"),
            Self::Generation(message) => write!(f, "Generation error: {message}"),
        }
    }
}

impl std::error::Error for ZiduError {}

impl From<std::io::Error> for ZiduError {
    fn from(err: std::io::Error) -> Self {
        ZiduError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for ZiduError {
    fn from(err: axum::http::Error) -> Self {
        ZiduError::InternalServerError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for ZiduError {
    fn from(err: tower_sessions::session::Error) -> Self {
        ZiduError::InternalServerError(err.to_string())
    }
}

impl From<reqwest::Error> for ZiduError {
    fn from(err: reqwest::Error) -> Self {
        ZiduError::Generation(err.to_string())
    }
}

impl From<url::ParseError> for ZiduError {
    fn from(err: url::ParseError) -> Self {
        ZiduError::Configuration(err.to_string())
    }
}

fn plain_response(status: axum::http::StatusCode, body: &'static str) -> axum::response::Response {
    let mut response = axum::response::Response::new(axum::body::Body::from(body));
    *response.status_mut() = status;
    response
}

impl IntoResponse for ZiduError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ZiduError::BadRequest => {
                info!("Bad request received");
                plain_response(axum::http::StatusCode::BAD_REQUEST, "Bad Request")
            }
            ZiduError::Unauthorized => {
                info!("Unauthorized request received");
                plain_response(
                    axum::http::StatusCode::UNAUTHORIZED,
                    "Unauthorized: invalid or missing session.",
                )
            }
            ZiduError::NotFound(url) => {
                tracing::error!("404 {url}");
                plain_response(axum::http::StatusCode::NOT_FOUND, "Not Found")
            }
            ZiduError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                plain_response(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                )
            }
            err @ (ZiduError::Configuration(_)
            | ZiduError::Read(_)
            | ZiduError::Generation(_)) => {
                tracing::error!("{err}");
                plain_response(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_FAILURE_MESSAGE,
                )
            }
        }
    }
}
