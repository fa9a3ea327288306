use thiserror::Error;

use super::validation::FieldErrors;

/// Failure taxonomy shared by the remote client, the cache and mutations.
///
/// Values are cloned into every reader joined on a coalesced fetch, so the
/// variants carry owned strings rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("Resource not found")]
    NotFound,
    #[error("Server error. Please try again later.")]
    ServerUnavailable,
    #[error("Request timeout. Please check your connection.")]
    Timeout,
    #[error("Please fix the errors in the form")]
    ValidationFailed { errors: FieldErrors },
    #[error("{message}")]
    Unknown { message: String },
}

impl ResourceError {
    pub fn unknown(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            return Self::Unknown {
                message: "An unexpected error occurred".to_string(),
            };
        }
        Self::Unknown { message }
    }

    pub fn validation(errors: FieldErrors) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Stable identifier used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ServerUnavailable => "server_unavailable",
            Self::Timeout => "timeout",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::Unknown { .. } => "unknown",
        }
    }
}
