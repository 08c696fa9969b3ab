//! Error types for the Sous domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is what the
//! conversation loop and its turn machinery return.

use thiserror::Error;

/// The top-level error type for conversation operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Transport ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A turn failed on the transport and the loop gave up.
    ///
    /// Carries the transcript as it stood before the failing turn.
    #[error("Turn failed: {source}")]
    TurnFailed {
        #[source]
        source: ProviderError,
        transcript: String,
    },

    /// The active request was cancelled (operator interrupt).
    ///
    /// `partial` holds the content committed before cancellation was observed.
    #[error("Request cancelled")]
    Cancelled { partial: String },

    // --- Conversation ---
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    #[error("Compaction failed: {0}")]
    Compaction(String),
}

impl Error {
    /// Whether this error is the cooperative-cancellation kind.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The handler ran and failed. `output` keeps whatever it produced.
    #[error("{tool_name} failed: {reason}")]
    ExecutionFailed {
        tool_name: String,
        reason: String,
        output: String,
    },

    /// The raw argument bag could not be decoded against the tool's schema.
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    /// Output produced before the failure, if any.
    pub fn partial_output(&self) -> &str {
        match self {
            ToolError::ExecutionFailed { output, .. } => output,
            _ => "",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),
}

#[derive(Debug, Clone, Error)]
pub enum ConversationError {
    #[error("Tool message must follow an assistant message with tool calls")]
    OrphanToolMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn execution_failure_keeps_output() {
        let err = ToolError::ExecutionFailed {
            tool_name: "shell".into(),
            reason: "exit status 2".into(),
            output: "ls: cannot access 'nope'".into(),
        };
        assert_eq!(err.to_string(), "shell failed: exit status 2");
        assert_eq!(err.partial_output(), "ls: cannot access 'nope'");
        assert_eq!(ToolError::InvalidArguments("x".into()).partial_output(), "");
    }

    #[test]
    fn cancellation_is_distinguishable() {
        let cancelled = Error::Cancelled { partial: "half".into() };
        assert!(cancelled.is_cancelled());
        assert!(!Error::Compaction("empty".into()).is_cancelled());
    }

    #[test]
    fn turn_failure_exposes_source() {
        let err = Error::TurnFailed {
            source: ProviderError::Network("connection refused".into()),
            transcript: "[]".into(),
        };
        assert!(err.to_string().contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
