//! Error types module
//!
//! All failures of the archive protocol are unified under `ArchiveError`. Variants
//! carry enough context (server, resource path, reason) for an operator to act on
//! them, and never carry credentials.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like a declined confirmation
    Debug,
    /// Warning level - for failures of a single operation
    Warn,
    /// Error level - for failures that abort the whole job
    Error,
}

/// Metadata describing how an error should be surfaced by a job wrapper
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the whole job must abort
    fn is_fatal(&self) -> bool;

    /// Process exit status to use when this error ends a command
    fn exit_code(&self) -> i32;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed for user '{user}' on {server}")]
    Auth { server: String, user: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error against {server}: {message}")]
    Transport { server: String, message: String },

    #[error("No healthy server found after {passes} passes (primary: {primary})")]
    FailoverExhausted { primary: String, passes: u32 },

    #[error("Operation declined by user")]
    UserDeclined,

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

impl ArchiveError {
    pub fn validation(message: impl Into<String>) -> Self {
        ArchiveError::Validation(message.into())
    }

    pub fn transport(server: impl Into<String>, message: impl ToString) -> Self {
        ArchiveError::Transport {
            server: server.into(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: io::Error) -> Self {
        ArchiveError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl ErrorMetadata for ArchiveError {
    fn error_code(&self) -> &'static str {
        match self {
            ArchiveError::Validation(_) => "VALIDATION_ERROR",
            ArchiveError::Auth { .. } => "AUTH_ERROR",
            ArchiveError::NotFound(_) => "NOT_FOUND",
            ArchiveError::Transport { .. } => "TRANSPORT_ERROR",
            ArchiveError::FailoverExhausted { .. } => "FAILOVER_EXHAUSTED",
            ArchiveError::UserDeclined => "USER_DECLINED",
            ArchiveError::Io { .. } => "IO_ERROR",
        }
    }

    fn is_fatal(&self) -> bool {
        matches!(
            self,
            ArchiveError::Validation(_) | ArchiveError::FailoverExhausted { .. }
        )
    }

    fn exit_code(&self) -> i32 {
        match self {
            ArchiveError::UserDeclined => 0,
            ArchiveError::Validation(_) => 1,
            ArchiveError::FailoverExhausted { .. } => 3,
            ArchiveError::Auth { .. }
            | ArchiveError::NotFound(_)
            | ArchiveError::Transport { .. }
            | ArchiveError::Io { .. } => 2,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ArchiveError::UserDeclined => LogLevel::Debug,
            ArchiveError::Validation(_) | ArchiveError::FailoverExhausted { .. } => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}
