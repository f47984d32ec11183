//! Error types for the OVO energy exporter.
//!
//! Startup errors (`ConfigError`) are fatal and abort the process before the
//! metrics listener starts. Everything the scan pipeline can hit at runtime
//! is an `OvoError`; those are logged and retried or swallowed at the
//! scheduler boundary so upstream flakiness never crashes the process.

use thiserror::Error;

/// Result type alias using our custom error types.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type that encompasses all application errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// OVO API communication and decoding errors
    #[error("OVO error: {0}")]
    Ovo(#[from] OvoError),

    /// Generic errors that don't fit other categories
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration-related errors. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be opened or read
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Config file is not valid JSON or is missing required keys
    #[error("failed to decode config file '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    /// Required configuration value is present but empty
    #[error("config {0} is missing")]
    MissingField(&'static str),

    /// Interval flag could not be parsed as a duration
    #[error("invalid interval '{0}': expected a duration like 30s, 30m or 1h")]
    InvalidInterval(String),

    /// Interval flag is below the enforced minimum
    #[error("update interval must be at least 10 seconds")]
    IntervalTooShort,
}

/// Errors from the scan pipeline against the OVO API.
#[derive(Error, Debug)]
pub enum OvoError {
    /// HTTP transport failure (connection, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Login endpoint rejected the credentials. Aborts the current scan;
    /// only retried on the next scheduled tick.
    #[error("login request failed: {status} {body}")]
    AuthRejected { status: u16, body: String },

    /// A fetch returned 401/403; the session cookie has expired. The
    /// logged-in flag is cleared so the next attempt re-authenticates.
    #[error("session expired (status {status})")]
    SessionExpired { status: u16 },

    /// Any other non-2xx from a fetch
    #[error("request failed: {status} {body}")]
    Fetch { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },

    /// Reading timestamp did not parse; scoped to one point's age metric
    #[error("failed to parse reading time '{text}': {source}")]
    TimeParse {
        text: String,
        source: chrono::ParseError,
    },

    /// Gauge registration failed
    #[error("metric registration failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ConfigError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

impl OvoError {
    /// Maps a non-2xx fetch response to an error. 401 and 403 become
    /// `SessionExpired`; the caller is responsible for clearing the
    /// logged-in flag when it sees that variant.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::SessionExpired {
                status: status.as_u16(),
            },
            _ => Self::Fetch {
                status: status.as_u16(),
                body,
            },
        }
    }

    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { what, source }
    }

    /// True when the error should force a re-login before the next attempt.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}
