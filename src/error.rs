//! Error types for chp
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for chp operations
///
/// Variants follow the failure classes of the authentication subsystem:
/// local preconditions, discovery, protocol, transport and token expiry.
#[derive(Error, Debug)]
pub enum ChpError {
    /// No usable token is stored for the current user
    #[error("not logged in. Run: chp login")]
    NotAuthenticated,

    /// A structural precondition was not met; no network call was attempted
    #[error("{0}")]
    Precondition(String),

    /// A user-supplied argument was rejected
    #[error("{0}")]
    InvalidInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authorization server metadata could not be resolved
    #[error("{0}")]
    Discovery(String),

    /// Dynamic client registration failed
    #[error("{0}")]
    Registration(String),

    /// The local redirect listener failed
    #[error("{0}")]
    Callback(String),

    /// The `state` echoed back by the authorization server did not match
    #[error("OAuth state mismatch - possible CSRF attack.")]
    StateMismatch,

    /// The authorization server reported an error on the redirect
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// No redirect arrived before the deadline
    #[error("{0}")]
    Timeout(String),

    /// Authorization code exchange failed
    #[error("{0}")]
    TokenExchange(String),

    /// Refresh token grant failed
    #[error("{0}")]
    Refresh(String),

    /// Transport-level failure, optionally carrying the HTTP status
    #[error("{message}")]
    Api {
        /// HTTP status code; `None` when no response was received
        status: Option<u16>,
        /// Human-readable message, already prefixed with the status
        message: String,
    },

    /// The server rejected the bearer token
    #[error("{0}\nTry: chp login")]
    SessionExpired(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ChpError {
    /// Returns the HTTP status code when this is a transport error carrying one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChpError::Api { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for chp operations
///
/// Uses `anyhow::Error` so context can be attached freely; callers that need
/// to branch on a specific failure use `downcast_ref::<ChpError>()`.
pub type Result<T> = anyhow::Result<T>;
