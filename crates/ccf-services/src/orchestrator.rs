//! Resource PUT orchestration.
//!
//! One call resolves a healthy server, resolves the session id once, asks for
//! confirmation when required, and then drives the client for every staged file.

use ccf_api_client::{ResourceClient, UploadParams};
use ccf_core::validation::is_affirmative;
use ccf_core::{
    ArchiveError, ArchiveResult, Credentials, ErrorMetadata, PutOutcome, PutRequest,
    RemoveOutcome, ResourceFilePath, ResourceLocation, UploadMode,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::failover::ServerFailoverResolver;
use crate::prompt::Prompt;
use crate::staging::collect_files;

/// A single planned upload: where the bytes come from and where they land
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedUpload {
    source: PathBuf,
    target: ResourceFilePath,
}

pub struct ResourcePutOrchestrator {
    client: Arc<dyn ResourceClient>,
    resolver: ServerFailoverResolver,
    prompt: Arc<dyn Prompt>,
    credentials: Credentials,
}

impl ResourcePutOrchestrator {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        resolver: ServerFailoverResolver,
        prompt: Arc<dyn Prompt>,
        credentials: Credentials,
    ) -> Self {
        Self {
            client,
            resolver,
            prompt,
            credentials,
        }
    }

    /// Upload a file or, in `ByContent` mode, every file beneath a directory.
    ///
    /// Validation problems and failover exhaustion are returned as errors and
    /// must abort the job. Auth, lookup and transport failures are reported as
    /// `PutOutcome::Failed`.
    pub async fn put(&self, request: &PutRequest) -> ArchiveResult<PutOutcome> {
        let uploads = plan_uploads(request).await?;

        let (location, session_id) = match self.connect(&request.location).await {
            Ok(connected) => connected,
            Err(e) => return failed_or_fatal(e),
        };

        let question = format!(
            "PUT {} into {} ({} file(s))?",
            request.source_path.display(),
            location.describe(),
            uploads.len()
        );
        match self.confirm(&question, request.force_confirm) {
            Ok(()) => {}
            Err(ArchiveError::UserDeclined) => {
                tracing::info!(resource = %location.describe(), "PUT skipped by user");
                return Ok(PutOutcome::SkippedByUser);
            }
            Err(e) => return Err(e),
        }

        for upload in &uploads {
            let target = location.with_file_path(upload.target.clone());
            let params = UploadParams {
                source: &upload.source,
                reason: &request.reason,
                mode: request.mode,
                overwrite: request.overwrite,
                replace: request.replace,
            };
            if let Err(e) = self
                .client
                .put_file(&target, &session_id, &self.credentials, params)
                .await
            {
                tracing::warn!(
                    target_path = %target.describe(),
                    reason = %request.reason,
                    error = %e,
                    "Resource PUT failed"
                );
                return failed_or_fatal(e);
            }
        }

        tracing::info!(
            resource = %location.describe(),
            files = uploads.len(),
            reason = %request.reason,
            "Resource PUT complete"
        );
        Ok(PutOutcome::Uploaded {
            files: uploads.len(),
        })
    }

    /// Delete one file, after checking that it exists. An absent file is not an error.
    pub async fn remove_file(
        &self,
        location: &ResourceLocation,
        force_confirm: bool,
    ) -> ArchiveResult<RemoveOutcome> {
        if location.file_path.is_root() {
            return Err(ArchiveError::validation(
                "a file path within resource is required to remove a file",
            ));
        }
        let (location, session_id) = self.connect(location).await?;

        if !self
            .client
            .file_exists(&location, &session_id, &self.credentials)
            .await?
        {
            tracing::info!(target_path = %location.describe(), "File not present, nothing to remove");
            return Ok(RemoveOutcome::Absent);
        }

        match self.confirm(&format!("DELETE {}?", location.describe()), force_confirm) {
            Ok(()) => {}
            Err(ArchiveError::UserDeclined) => return Ok(RemoveOutcome::SkippedByUser),
            Err(e) => return Err(e),
        }

        match self
            .client
            .delete_file(&location, &session_id, &self.credentials)
            .await
        {
            Ok(()) => Ok(RemoveOutcome::Removed),
            // Removed by someone else between the check and the delete.
            Err(ArchiveError::NotFound(_)) => Ok(RemoveOutcome::Absent),
            Err(e) => Err(e),
        }
    }

    /// Delete a whole resource container.
    pub async fn remove_resource(
        &self,
        location: &ResourceLocation,
        force_confirm: bool,
    ) -> ArchiveResult<RemoveOutcome> {
        let location = location.with_file_path(ResourceFilePath::root());
        let (location, session_id) = self.connect(&location).await?;

        match self.confirm(
            &format!("DELETE resource {} and all its files?", location.describe()),
            force_confirm,
        ) {
            Ok(()) => {}
            Err(ArchiveError::UserDeclined) => return Ok(RemoveOutcome::SkippedByUser),
            Err(e) => return Err(e),
        }

        match self
            .client
            .delete_resource(&location, &session_id, &self.credentials)
            .await
        {
            Ok(()) => Ok(RemoveOutcome::Removed),
            Err(ArchiveError::NotFound(_)) => Ok(RemoveOutcome::Absent),
            Err(e) => Err(e),
        }
    }

    /// Pick a healthy server and resolve the session id against it.
    async fn connect(&self, location: &ResourceLocation) -> ArchiveResult<(ResourceLocation, String)> {
        let server = self.resolver.resolve(&location.server).await?;
        let location = location.with_server(&server.address)?;
        let session_id = self
            .client
            .resolve_session_id(&location, &self.credentials)
            .await?;
        Ok((location, session_id))
    }

    fn confirm(&self, question: &str, force_confirm: bool) -> ArchiveResult<()> {
        if force_confirm {
            return Ok(());
        }
        match self.prompt.ask(question)? {
            None => Ok(()),
            Some(answer) if is_affirmative(&answer) => Ok(()),
            Some(_) => Err(ArchiveError::UserDeclined),
        }
    }
}

fn failed_or_fatal(error: ArchiveError) -> ArchiveResult<PutOutcome> {
    if error.is_fatal() {
        return Err(error);
    }
    Ok(PutOutcome::Failed {
        reason: error.to_string(),
    })
}

/// Work out which files go where, without touching the network.
async fn plan_uploads(request: &PutRequest) -> ArchiveResult<Vec<PlannedUpload>> {
    let base = &request.location.file_path;
    if request.reason.trim().is_empty() {
        return Err(ArchiveError::validation("--reason is required"));
    }
    if request.source_path.as_os_str().is_empty() {
        return Err(ArchiveError::validation("--file is required"));
    }

    match request.mode {
        UploadMode::ByReference => {
            if base.is_root() {
                return Err(ArchiveError::validation(
                    "--file-path-within-resource is required for a reference upload",
                ));
            }
            Ok(vec![PlannedUpload {
                source: request.source_path.clone(),
                target: base.clone(),
            }])
        }
        UploadMode::ByContent => {
            let metadata = tokio::fs::metadata(&request.source_path).await.map_err(|e| {
                ArchiveError::validation(format!(
                    "cannot read {}: {}",
                    request.source_path.display(),
                    e
                ))
            })?;

            if metadata.is_dir() {
                let files = collect_files(&request.source_path).await?;
                if files.is_empty() {
                    return Err(ArchiveError::validation(format!(
                        "nothing to upload in {}",
                        request.source_path.display()
                    )));
                }
                files
                    .into_iter()
                    .map(|(source, relative)| -> ArchiveResult<PlannedUpload> {
                        Ok(PlannedUpload {
                            source,
                            target: base.join(&relative)?,
                        })
                    })
                    .collect()
            } else if base.is_root() {
                let name = request
                    .source_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        ArchiveError::validation(format!(
                            "cannot derive a file name from {}",
                            request.source_path.display()
                        ))
                    })?;
                Ok(vec![PlannedUpload {
                    source: request.source_path.clone(),
                    target: ResourceFilePath::parse(name)?,
                }])
            } else {
                Ok(vec![PlannedUpload {
                    source: request.source_path.clone(),
                    target: base.clone(),
                }])
            }
        }
    }
}
