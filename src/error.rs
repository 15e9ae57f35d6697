// src/error.rs

//! Unified error handling for the book import pipeline.

use thiserror::Error;

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Every variant renders as a single human-readable line; that line is what
/// the import session stores as its error message.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required input missing before any call was attempted
    #[error("{0}")]
    Validation(String),

    /// The content-analysis service answered with a non-success status
    #[error("{0}")]
    ExternalService(String),

    /// The content-analysis service answered, but with no usable text
    #[error("{0}")]
    EmptyResponse(String),

    /// The service text could not be parsed as JSON
    #[error("{0}")]
    MalformedPayload(String),

    /// The parsed payload lacked the required fields
    #[error("{0}")]
    IncompletePayload(String),

    /// The backend import call failed
    #[error("{0}")]
    Persistence(String),

    /// An analyze or save is already in flight
    #[error("{0}")]
    Busy(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an external service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalService(message.into())
    }

    /// Create an empty response error.
    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::EmptyResponse(message.into())
    }

    /// Create a malformed payload error.
    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Create an incomplete payload error.
    pub fn incomplete_payload(message: impl Into<String>) -> Self {
        Self::IncompletePayload(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create a single-flight rejection.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The message shown to the user for this error.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether this error was raised before anything went over the wire.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
