//! Error types for Servana

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Servana-wide error type
#[derive(Error, Debug)]
pub enum ServanaError {
    /// Credential exchange with a provider failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Remote API answered 429
    #[error("Rate limited by {service}")]
    RateLimited { service: String },

    /// Remote API answered with a non-2xx status other than 404/429
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Remote API answered 404
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Local cache storage failed
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServanaError {
    pub fn auth(msg: impl Into<String>) -> Self {
        ServanaError::Auth(msg.into())
    }

    pub fn rate_limited(service: impl Into<String>) -> Self {
        ServanaError::RateLimited {
            service: service.into(),
        }
    }

    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        ServanaError::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServanaError::NotFound(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        ServanaError::Network(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        ServanaError::Timeout(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        ServanaError::Parse(msg.into())
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        ServanaError::Cache(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ServanaError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ServanaError::Internal(msg.into())
    }

    /// Classify the error for whoever has to tell a user what happened
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServanaError::RateLimited { .. } => ErrorCategory::RateLimited,
            ServanaError::Auth(_) | ServanaError::Config(_) => ErrorCategory::Configuration,
            ServanaError::Network(_) | ServanaError::Timeout(_) => ErrorCategory::Transient,
            ServanaError::Remote { status, .. } if *status >= 500 => ErrorCategory::Transient,
            ServanaError::Remote { .. } | ServanaError::Parse(_) => ErrorCategory::Remote,
            ServanaError::NotFound(_) => ErrorCategory::NotFound,
            ServanaError::Cache(_) => ErrorCategory::Storage,
            ServanaError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Whether retrying the same call later can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimited | ErrorCategory::Transient
        )
    }
}

/// Coarse error classes surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Try again later
    RateLimited,
    /// Credentials or settings need fixing
    Configuration,
    /// Network hiccup, retry
    Transient,
    NotFound,
    Remote,
    Storage,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::RateLimited => "rate limited - try later",
            ErrorCategory::Configuration => "configuration error - fix credentials",
            ErrorCategory::Transient => "transient network failure - retry",
            ErrorCategory::NotFound => "not found",
            ErrorCategory::Remote => "remote service error",
            ErrorCategory::Storage => "local cache failure",
            ErrorCategory::Internal => "internal error",
        };
        write!(f, "{}", s)
    }
}

/// Result type alias for Servana operations
pub type ServanaResult<T> = Result<T, ServanaError>;
