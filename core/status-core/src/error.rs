//! Error types for steam-status-core operations.
//!
//! Nothing here is fatal to the host: every variant is either recovered
//! locally (colors, polling) or turned into a one-line user notice.

use std::path::PathBuf;

/// All errors that can occur in the status engine.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    // ─────────────────────────────────────────────────────────────────────
    // Color Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Invalid color format: {0:?}")]
    InvalidColorFormat(String),

    // ─────────────────────────────────────────────────────────────────────
    // Presence Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Presence request failed: {0}")]
    Network(String),

    #[error("Presence endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("ApiKey and SteamId must both be set")]
    MissingCredentials,

    // ─────────────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    // ─────────────────────────────────────────────────────────────────────
    // Host Action Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("External action failed: {target}: {details}")]
    ExternalAction { target: String, details: String },

    #[error("Menu could not be shown: {0}")]
    MenuRender(String),

    #[error("Worker stopped: {0}")]
    WorkerStopped(&'static str),
}

/// Convenience type alias for Results using StatusError.
pub type Result<T> = std::result::Result<T, StatusError>;

impl From<reqwest::Error> for StatusError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => StatusError::HttpStatus {
                status: status.as_u16(),
            },
            None => StatusError::Network(err.to_string()),
        }
    }
}

