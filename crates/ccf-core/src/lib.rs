//! CCF Core Library
//!
//! This crate provides the domain models, error types, configuration and validation
//! shared by the archive client, the job-status services and the command-line tools.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::ArchiveConfig;
pub use error::{ArchiveError, ArchiveResult, ErrorMetadata, LogLevel};
pub use models::{
    Credentials, Protocol, PutOutcome, PutRequest, RemoveOutcome, ResourceFilePath,
    ResourceLocation, RunningState, RunningStatusRecord, ServerCandidate, UploadMode,
};
