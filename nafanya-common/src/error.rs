// ================================================================
// File: nafanya-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Provider routing:
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Provider error: {0}")]
    Provider(String),

    /// The OS randomness source failed. Never recovered from.
    #[error("Entropy source failure: {0}")]
    Entropy(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors that must take the whole process down instead of being
    /// degraded into an apology message for a single event.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Entropy(_) | Error::Config(_))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        // Adapters speak anyhow internally; anything that leaks out of them
        // is a vendor failure.
        Error::Provider(e.to_string())
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::Parse(err.to_string())
    }
}
