//! `ResourceClient` implementation for `XnatClient`.

use async_trait::async_trait;
use ccf_core::{ArchiveError, ArchiveResult, Credentials, ResourceLocation, UploadMode};
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{status_error, ArchiveUrl, ResourceClient, UploadParams, XnatClient};

/// Experiment listing, as returned by `.../experiments?format=json`
#[derive(Debug, Deserialize)]
struct ExperimentListing {
    #[serde(rename = "ResultSet")]
    result_set: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    #[serde(rename = "Result", default)]
    result: Vec<ExperimentRow>,
}

#[derive(Debug, Deserialize)]
struct ExperimentRow {
    #[serde(rename = "ID")]
    id: String,
    label: String,
}

#[async_trait]
impl ResourceClient for XnatClient {
    async fn resolve_session_id(
        &self,
        location: &ResourceLocation,
        credentials: &Credentials,
    ) -> ArchiveResult<String> {
        let session = location.session();
        let url = ArchiveUrl::experiments(location)?
            .query("format", "json")
            .query("columns", "ID,label")
            .build();

        let response = self
            .send(self.client.get(url), location, credentials)
            .await?;
        let listing: ExperimentListing = response.json().await.map_err(|e| {
            ArchiveError::transport(
                &location.server,
                format!("Failed to parse experiment listing: {}", e.without_url()),
            )
        })?;

        let session_id = listing
            .result_set
            .result
            .into_iter()
            .find(|row| row.label == session)
            .map(|row| row.id)
            .ok_or_else(|| {
                ArchiveError::NotFound(format!(
                    "session {} for subject {} in project {}",
                    session, location.subject, location.project
                ))
            })?;

        tracing::debug!(
            session = %session,
            session_id = %session_id,
            "Resolved session id"
        );
        Ok(session_id)
    }

    async fn put_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
        params: UploadParams<'_>,
    ) -> ArchiveResult<()> {
        let mut url = ArchiveUrl::file(location, session_id)?
            .query("overwrite", bool_param(params.overwrite))
            .query("replace", bool_param(params.replace))
            .query("event_reason", params.reason);

        let request = match params.mode {
            UploadMode::ByReference => {
                url = url.query("reference", &params.source.to_string_lossy());
                self.client.put(url.build())
            }
            UploadMode::ByContent => {
                let file = tokio::fs::File::open(params.source)
                    .await
                    .map_err(|e| ArchiveError::io(params.source, e))?;
                let length = file
                    .metadata()
                    .await
                    .map_err(|e| ArchiveError::io(params.source, e))?
                    .len();
                self.client
                    .put(url.build())
                    .header(CONTENT_LENGTH, length)
                    .body(reqwest::Body::from(file))
            }
        };

        self.send(request, location, credentials).await?;

        tracing::info!(
            target_path = %location.describe(),
            mode = ?params.mode,
            reason = %params.reason,
            "Uploaded resource file"
        );
        Ok(())
    }

    async fn delete_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<()> {
        let url = ArchiveUrl::file(location, session_id)?.build();
        self.send(self.client.delete(url), location, credentials)
            .await?;

        tracing::info!(target_path = %location.describe(), "Deleted resource file");
        Ok(())
    }

    async fn file_exists(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<bool> {
        let url = ArchiveUrl::file(location, session_id)?.build();
        let request = self.apply_auth(self.client.head(url), credentials);
        let response = request.send().await.map_err(|e| {
            ArchiveError::transport(
                &location.server,
                format!("request for {} failed: {}", location.describe(), e.without_url()),
            )
        })?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status, location, credentials, "")),
        }
    }

    async fn read_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<Vec<u8>> {
        let url = ArchiveUrl::file(location, session_id)?.build();
        let response = self
            .send(self.client.get(url), location, credentials)
            .await?;
        let bytes = response.bytes().await.map_err(|e| {
            ArchiveError::transport(
                &location.server,
                format!("Failed to read {}: {}", location.describe(), e.without_url()),
            )
        })?;
        Ok(bytes.to_vec())
    }

    async fn delete_resource(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<()> {
        let url = ArchiveUrl::resource(location, session_id)?
            .query("removeFiles", "true")
            .build();
        self.send(self.client.delete(url), location, credentials)
            .await?;

        tracing::info!(resource = %location.describe(), "Deleted resource");
        Ok(())
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
