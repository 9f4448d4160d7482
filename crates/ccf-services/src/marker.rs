//! RUNNING marker files.
//!
//! A job is considered running against a subject while
//! `{pipeline}.{subject}_{classifier}[_{scan}].RUNNING` exists in the target
//! resource. There is no other state; the archive is the source of truth.

use ccf_core::{
    ArchiveConfig, ArchiveResult, Protocol, PutOutcome, PutRequest, RemoveOutcome,
    ResourceFilePath, ResourceLocation, RunningState, RunningStatusRecord, UploadMode,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::orchestrator::ResourcePutOrchestrator;
use crate::staging::StagingDir;

/// What a status change did to the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", content = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkerTransition {
    Marked(PutOutcome),
    Unmarked(RemoveOutcome),
}

pub struct RunningStatusMarker {
    orchestrator: Arc<ResourcePutOrchestrator>,
    protocol: Protocol,
    server: String,
    project: String,
    scratch_root: PathBuf,
    pipeline_name: String,
}

impl RunningStatusMarker {
    pub fn new(
        orchestrator: Arc<ResourcePutOrchestrator>,
        config: &ArchiveConfig,
        server: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            protocol: config.protocol,
            server: server.into(),
            project: project.into(),
            scratch_root: config.scratch_root.clone(),
            pipeline_name: config.pipeline_name.clone(),
        }
    }

    /// Where the marker for `record` lives in the archive.
    pub fn marker_location(&self, record: &RunningStatusRecord) -> ArchiveResult<ResourceLocation> {
        let resource = ResourceLocation::new(
            self.protocol,
            &self.server,
            &self.project,
            &record.subject,
            &record.classifier,
            &record.resource,
        )?;
        let file = ResourceFilePath::parse(&record.marker_file_name(&self.pipeline_name))?;
        Ok(resource.with_file_path(file))
    }

    /// Apply the state carried by `record`.
    pub async fn apply(&self, record: &RunningStatusRecord) -> ArchiveResult<MarkerTransition> {
        match record.state {
            RunningState::Running => self.mark(record).await.map(MarkerTransition::Marked),
            RunningState::Absent => self.unmark(record).await.map(MarkerTransition::Unmarked),
        }
    }

    /// Upload (or overwrite) the marker.
    ///
    /// The local scratch directory is removed whatever the upload outcome.
    pub async fn mark(&self, record: &RunningStatusRecord) -> ArchiveResult<PutOutcome> {
        record.validate()?;
        let marker = self.marker_location(record)?;
        let resource_root = marker.with_file_path(ResourceFilePath::root());

        let staging = StagingDir::create(
            &self.scratch_root,
            &record.scratch_dir_name(&self.pipeline_name),
        )
        .await?;

        let outcome = match staging
            .write_file(marker.file_path.as_str(), &record.marker_contents())
            .await
        {
            Ok(_) => {
                let request = PutRequest::new(
                    resource_root,
                    staging.path(),
                    record.reason.clone(),
                    UploadMode::ByContent,
                )
                .force(true);
                self.orchestrator.put(&request).await
            }
            Err(e) => Err(e),
        };
        staging.remove().await;

        match &outcome {
            Ok(PutOutcome::Failed { reason }) => {
                tracing::warn!(marker = %marker.describe(), reason = %reason, "Failed to mark job running");
            }
            Ok(_) => {
                tracing::info!(marker = %marker.describe(), user = %record.user, "Marked job running");
            }
            Err(_) => {}
        }
        outcome
    }

    /// Remove the marker if it exists. Absence is not an error.
    pub async fn unmark(&self, record: &RunningStatusRecord) -> ArchiveResult<RemoveOutcome> {
        let marker = self.marker_location(record)?;
        let outcome = self.orchestrator.remove_file(&marker, true).await?;
        tracing::info!(marker = %marker.describe(), outcome = ?outcome, "Unmarked job");
        Ok(outcome)
    }
}
