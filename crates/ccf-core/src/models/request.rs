use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::location::ResourceLocation;

/// How the archive obtains the bytes of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadMode {
    /// The client sends the local file as the request body
    ByContent,
    /// The archive pulls the file from a path visible to the server process
    ByReference,
}

/// A request to place a file (or a directory of files) into a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRequest {
    pub location: ResourceLocation,
    /// Local path for `ByContent`, server-side path for `ByReference`
    pub source_path: PathBuf,
    pub reason: String,
    pub mode: UploadMode,
    pub overwrite: bool,
    pub replace: bool,
    /// Skip the interactive confirmation
    pub force_confirm: bool,
}

impl PutRequest {
    pub fn new(
        location: ResourceLocation,
        source_path: impl Into<PathBuf>,
        reason: impl Into<String>,
        mode: UploadMode,
    ) -> Self {
        Self {
            location,
            source_path: source_path.into(),
            reason: reason.into(),
            mode,
            overwrite: true,
            replace: true,
            force_confirm: false,
        }
    }

    pub fn force(mut self, force_confirm: bool) -> Self {
        self.force_confirm = force_confirm;
        self
    }
}

/// Result of a PUT as seen by the job wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PutOutcome {
    Uploaded { files: usize },
    SkippedByUser,
    Failed { reason: String },
}

impl PutOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, PutOutcome::Failed { .. })
    }
}

/// Result of removing a file or resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoveOutcome {
    Removed,
    /// Nothing was there to remove
    Absent,
    SkippedByUser,
}

/// One probe result for a front-end server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCandidate {
    pub address: String,
    pub healthy: bool,
    pub probed_at: DateTime<Utc>,
}

impl ServerCandidate {
    pub fn new(address: impl Into<String>, healthy: bool) -> Self {
        Self {
            address: address.into(),
            healthy,
            probed_at: Utc::now(),
        }
    }
}
