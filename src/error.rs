//! Error types for the reporter.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (4=validation, 6=remote, 7=config, 8=io)
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use thiserror::Error;

/// Result type alias for reporter operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (exit 4)
    InvalidArgument,

    // Remote (exit 6)
    RemoteError,
    HttpError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RemoteError => "REMOTE_ERROR",
            Self::HttpError => "HTTP_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::InvalidArgument => 4,
            Self::RemoteError | Self::HttpError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the same operation may succeed on a later attempt.
    ///
    /// Remote and I/O failures are usually transient; the scheduler
    /// retries them on its next tick.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteError | Self::HttpError | Self::IoError)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in reporter operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Http(_) => ErrorCode::HttpError,
            Self::Remote(_) => ErrorCode::RemoteError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for operators.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Config(msg) if msg.contains("GIST_ID") || msg.contains("GITHUB_TOKEN") => Some(
                "Set both variables, e.g.\n  \
                 GIST_ID=<gist id> GITHUB_TOKEN=<token with gist scope> reporter run"
                    .to_string(),
            ),
            Self::Config(msg) if msg.contains("interval") => {
                Some("Use a positive number of seconds, e.g. --interval 180".to_string())
            }
            Self::Remote(msg) if msg.contains("401") || msg.contains("403") => Some(
                "Check that GITHUB_TOKEN is valid and carries the `gist` scope.".to_string(),
            ),
            Self::Remote(msg) if msg.contains("404") => {
                Some("Check that GIST_ID names an existing gist.".to_string())
            }
            Self::Io(_)
            | Self::Json(_)
            | Self::Http(_)
            | Self::Remote(_)
            | Self::Config(_)
            | Self::InvalidArgument(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
