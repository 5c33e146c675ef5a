//! Error types for RunCloud API operations.
//!
//! Every failure aborts the whole reconciliation run, so there is no retry
//! logic here. Errors are categorized so the front end can pick an exit code
//! and print actionable advice.

use std::fmt;

/// Result type alias for RunCloud API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of errors, used for exit codes and user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network failure, timeout or non-2xx response.
    Transport,
    /// Invalid desired state, rejected before any network call.
    Validation,
    /// A name or id could not be resolved.
    NotFound,
    /// A mutating call did not produce the requested state.
    Convergence,
    /// The operation is not offered for this resource kind.
    Unsupported,
    /// Missing or invalid client configuration.
    Config,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Process exit code for this category.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Transport => 1,
            Self::Validation => 2,
            Self::NotFound => 3,
            Self::Convergence => 4,
            Self::Unsupported => 5,
            Self::Config => 6,
            Self::Other => 1,
        }
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "RunCloud API request failed",
            Self::Validation => "Invalid desired state",
            Self::NotFound => "Lookup failed",
            Self::Convergence => "Remote state did not converge",
            Self::Unsupported => "Unsupported operation",
            Self::Config => "Invalid configuration",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the base URL, your credentials and network access",
            Self::Validation => "Fix the rejected value and run again",
            Self::NotFound => "Verify the name or ID exists on the server",
            Self::Convergence => "Inspect the resource in the RunCloud panel and run again",
            Self::Unsupported => "Remove the resource through the RunCloud panel instead",
            Self::Config => "Set RC_API_KEY and RC_API_SECRET or pass --api-key/--api-secret",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to RunCloud or converging state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed or returned a non-2xx status.
    #[error("{method} {path} failed: {message}")]
    Transport {
        /// HTTP method of the failed request.
        method: String,
        /// API path of the failed request.
        path: String,
        /// HTTP status code if a response was received.
        status: Option<u16>,
        /// Error message (API `message` field when present).
        message: String,
    },

    /// Identifier resolution exhausted the collection without a match.
    #[error("Failed to find {kind} by name or ID.")]
    NotFound {
        /// What was being looked up (e.g. "server", "web application").
        kind: String,
    },

    /// Invalid value supplied in the desired state.
    #[error("invalid {field} '{value}' (expected one of: {expected})")]
    Validation {
        /// Parameter name.
        field: &'static str,
        /// Rejected value.
        value: String,
        /// Accepted values.
        expected: String,
    },

    /// A mutation did not take effect.
    #[error("{0}")]
    Convergence(String),

    /// Operation not offered for this resource kind.
    #[error("{operation} is not supported for {kind}")]
    Unsupported {
        /// Operation name.
        operation: &'static str,
        /// Resource kind.
        kind: &'static str,
    },

    /// Response body did not have the expected shape.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Missing or invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local command execution failed.
    #[error("command failed: {0}")]
    Command(String),
}

impl Error {
    /// Create a transport error.
    pub fn transport(
        method: impl fmt::Display,
        path: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            method: method.to_string(),
            path: path.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error for a lookup.
    pub fn not_found(kind: impl Into<String>) -> Self {
        Self::NotFound { kind: kind.into() }
    }

    /// Create a validation error listing the accepted values.
    pub fn validation(field: &'static str, value: impl Into<String>, expected: &[&str]) -> Self {
        Self::Validation {
            field,
            value: value.into(),
            expected: expected.join(", "),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Convergence(_) => ErrorCategory::Convergence,
            Error::Unsupported { .. } => ErrorCategory::Unsupported,
            Error::InvalidResponse(_) => ErrorCategory::Transport,
            Error::Config(_) => ErrorCategory::Config,
            Error::Command(_) => ErrorCategory::Other,
        }
    }

    /// HTTP status of a transport error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("server");
        assert_eq!(err.to_string(), "Failed to find server by name or ID.");
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_validation_message_lists_choices() {
        let err = Error::validation("protocol", "TLSv1.0", &["TLSv1.1", "TLSv1.2"]);
        let display = err.to_string();
        assert!(display.contains("TLSv1.0"));
        assert!(display.contains("TLSv1.1, TLSv1.2"));
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_transport_constructor() {
        let err = Error::transport("GET", "servers", Some(401), "Unauthenticated.");
        match &err {
            Error::Transport {
                method,
                path,
                status,
                message,
            } => {
                assert_eq!(method, "GET");
                assert_eq!(path, "servers");
                assert_eq!(*status, Some(401));
                assert_eq!(message, "Unauthenticated.");
            }
            _ => panic!("Expected Error::Transport"),
        }
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "GET servers failed: Unauthenticated.");
    }

    #[test]
    fn test_exit_codes_are_distinct_per_fatal_category() {
        let codes = [
            ErrorCategory::Transport.exit_code(),
            ErrorCategory::Validation.exit_code(),
            ErrorCategory::NotFound.exit_code(),
            ErrorCategory::Convergence.exit_code(),
            ErrorCategory::Unsupported.exit_code(),
            ErrorCategory::Config.exit_code(),
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn test_category_advice() {
        assert!(!ErrorCategory::Transport.advice().is_empty());
        assert!(!ErrorCategory::Config.advice().is_empty());
        assert!(format!("{}", ErrorCategory::Convergence).contains("converge"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }
}
