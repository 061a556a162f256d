//! Error types for backend calls, configuration and session storage.
//!
//! Every variant carries an [`ErrorContext`] so a failed request can be logged
//! with the operation and endpoint that produced it.

use std::fmt;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Structured context for client errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "list_courts", "login")
    pub operation: Option<String>,
    /// The endpoint path involved (e.g., "/courts")
    pub endpoint: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether the same request may succeed if retried
    pub retryable: bool,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the endpoint path.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark this error as retryable.
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref endpoint) = self.endpoint {
            parts.push(format!("endpoint={}", endpoint));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("Network error: {message} {context}")]
    Network {
        message: String,
        context: ErrorContext,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message} {context}")]
    Http {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    /// The response body did not match the expected shape.
    #[error("Decode error: {message} {context}")]
    Decode {
        message: String,
        context: ErrorContext,
    },

    /// Configuration file or environment problem.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// The operation needs a signed-in session.
    #[error("Not signed in: {message} {context}")]
    Unauthenticated {
        message: String,
        context: ErrorContext,
    },

    /// Durable token storage failed.
    #[error("Storage error: {message} {context}")]
    Storage {
        message: String,
        context: ErrorContext,
    },
}

impl ClientError {
    /// Create a network error. Network failures are retryable.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            context: ErrorContext::default().retryable(),
        }
    }

    /// Create an HTTP status error.
    ///
    /// 5xx and 429 are marked retryable.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        let context = if status >= 500 || status == 429 {
            ErrorContext::default().retryable()
        } else {
            ErrorContext::default()
        };
        Self::Http {
            status,
            message: message.into(),
            context,
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    /// HTTP status, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Network { context, .. }
            | Self::Http { context, .. }
            | Self::Decode { context, .. }
            | Self::Configuration { context, .. }
            | Self::Unauthenticated { context, .. }
            | Self::Storage { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Network { context, .. }
            | Self::Http { context, .. }
            | Self::Decode { context, .. }
            | Self::Configuration { context, .. }
            | Self::Unauthenticated { context, .. }
            | Self::Storage { context, .. } => context,
        }
    }

    /// Add or update the operation in the error context.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add or update the endpoint in the error context.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.context_mut().endpoint = Some(endpoint.into());
        self
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::decode(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::storage(err.to_string())
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ClientError::http(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            ClientError::decode(err.to_string())
        } else {
            ClientError::network(err.to_string())
        }
    }
}
