//! Request outcome errors shared by the gateway, interceptor, and API wrappers.
//!
//! ERROR HANDLING
//! ==============
//! Token decode failures never reach this type; they are absorbed by the
//! session oracle. Everything here is something a caller may want to show
//! or branch on.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Failure of an authenticated or authentication request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// An operation that needs a bearer token ran with none stored.
    #[error("no token available")]
    NoToken,

    /// The transport failed, or the server answered with a 5xx.
    #[error("network request failed: {0}")]
    Network(String),

    /// The server answered 401.
    #[error("authorization rejected: {message}")]
    AuthRejected { message: String },

    /// The server answered 403.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Any other non-success status.
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// A request body could not be serialized.
    #[error("request encode failed: {0}")]
    Encode(String),

    /// A response body could not be deserialized.
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build the error matching a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::AuthRejected { message },
            403 => Self::Forbidden { message },
            500..=599 => Self::Network(format!("server returned {status}: {message}")),
            _ => Self::Rejected { status, message },
        }
    }

    /// HTTP status this error came from, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthRejected { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided message, empty when there was none.
    #[must_use]
    pub fn server_message(&self) -> &str {
        match self {
            Self::AuthRejected { message } | Self::Forbidden { message } | Self::Rejected { message, .. } => message,
            _ => "",
        }
    }

    /// Duplicate username/email on user creation.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409) || self.server_message().contains("already exists")
    }
}
