//! Error taxonomy for startup and chat failures.
//!
//! Configuration errors stop the program before a session starts. Runtime
//! communication errors end a running session. Leaving the session on
//! purpose (exit command, Ctrl-C, end of input) is not an error and is
//! reported through [`SessionOutcome`](crate::session::SessionOutcome).

use std::path::PathBuf;

use thiserror::Error;

use crate::transcript::TurnOrderError;

/// Errors produced while configuring or running a chat session.
#[derive(Error, Debug)]
pub enum ChatError {
    /// The credential environment variable is unset or empty.
    #[error("{var} environment variable not set")]
    MissingApiKey { var: String },

    /// A required context file could not be read.
    #[error("could not find file {}", path.display())]
    MissingContext { path: PathBuf },

    /// A required context file exists but holds no text.
    #[error("file {} is empty", path.display())]
    EmptyContext { path: PathBuf },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP request never produced a response (connect, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("API HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The endpoint answered 200 but the body carried an error object.
    #[error("API error: {0}")]
    Api(String),

    /// The response body could not be decoded.
    #[error("failed to parse response: {0}")]
    Decode(String),

    /// The response held no choice or no message content.
    #[error("empty completion returned by the API")]
    EmptyCompletion,

    /// Reading from or writing to the console failed.
    #[error("console I/O failed: {0}")]
    Input(String),

    /// A turn was appended out of order.
    #[error("transcript out of order: {0}")]
    TurnOrder(#[from] TurnOrderError),
}

impl ChatError {
    /// Whether this error stops the program before a session can start.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ChatError::MissingApiKey { .. }
                | ChatError::MissingContext { .. }
                | ChatError::EmptyContext { .. }
                | ChatError::InvalidConfig(_)
        )
    }

    /// Whether a retry of the same request could plausibly succeed.
    ///
    /// Rate limits, server-side failures, and transport errors are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            ChatError::Request(_) => true,
            ChatError::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether the request is rejected outright and must never be retried.
    pub fn is_permanent(&self) -> bool {
        match self {
            ChatError::Http { status, .. } => matches!(status, 400 | 401 | 403 | 404 | 422),
            other => other.is_config(),
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        ChatError::Input(e.to_string())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        ChatError::Request(e.to_string())
    }
}
