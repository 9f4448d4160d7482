//! HTTP client for the archive REST API.
//!
//! Provides the `ResourceClient` operations (session lookup, file PUT/DELETE,
//! existence checks, whole-resource delete) and the `ServerProbe` used by
//! failover. Retry policy is left to callers: every failure is returned as a
//! typed `ArchiveError` after a single attempt.

pub mod api;
pub mod probe;
pub mod url;

use async_trait::async_trait;
use ccf_core::{
    ArchiveConfig, ArchiveError, ArchiveResult, Credentials, Protocol, ResourceLocation,
    UploadMode,
};
use reqwest::{redirect, Client, StatusCode};
use std::path::Path;

pub use url::ArchiveUrl;

/// Parameters of a single file upload
#[derive(Debug, Clone, Copy)]
pub struct UploadParams<'a> {
    /// Local file for `ByContent`, server-visible path for `ByReference`
    pub source: &'a Path,
    pub reason: &'a str,
    pub mode: UploadMode,
    pub overwrite: bool,
    pub replace: bool,
}

/// File-level operations against one resource container
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Resolve the archive's opaque session id for `{project, subject, session label}`.
    async fn resolve_session_id(
        &self,
        location: &ResourceLocation,
        credentials: &Credentials,
    ) -> ArchiveResult<String>;

    /// Upload `location.file_path`, replacing any prior content.
    async fn put_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
        params: UploadParams<'_>,
    ) -> ArchiveResult<()>;

    /// Delete `location.file_path`. An absent file yields `ArchiveError::NotFound`.
    async fn delete_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<()>;

    async fn file_exists(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<bool>;

    async fn read_file(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<Vec<u8>>;

    /// Delete the whole resource container and its files.
    async fn delete_resource(
        &self,
        location: &ResourceLocation,
        session_id: &str,
        credentials: &Credentials,
    ) -> ArchiveResult<()>;
}

/// Liveness check for one front-end server
#[async_trait]
pub trait ServerProbe: Send + Sync {
    async fn is_healthy(&self, server: &str) -> bool;
}

/// reqwest-backed archive client
#[derive(Clone, Debug)]
pub struct XnatClient {
    client: Client,
    probe_client: Client,
    protocol: Protocol,
}

impl XnatClient {
    pub fn new(config: &ArchiveConfig) -> ArchiveResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| client_setup_error("HTTP client", e))?;

        // The liveness signature is the 302 itself, so redirects must not be followed.
        let probe_client = Client::builder()
            .timeout(config.probe_timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| client_setup_error("probe HTTP client", e))?;

        Ok(Self {
            client,
            probe_client,
            protocol: config.protocol,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn apply_auth(
        &self,
        request: reqwest::RequestBuilder,
        credentials: &Credentials,
    ) -> reqwest::RequestBuilder {
        request.basic_auth(&credentials.user, Some(credentials.password()))
    }

    /// Send a request and turn non-success statuses into typed errors.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        location: &ResourceLocation,
        credentials: &Credentials,
    ) -> ArchiveResult<reqwest::Response> {
        let response = self
            .apply_auth(request, credentials)
            .send()
            .await
            .map_err(|e| {
                ArchiveError::transport(
                    &location.server,
                    format!("request for {} failed: {}", location.describe(), e.without_url()),
                )
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(status_error(status, location, credentials, &body))
    }
}

/// Building a client fails only on local TLS or runtime setup, never on user input.
fn client_setup_error(what: &str, error: reqwest::Error) -> ArchiveError {
    ArchiveError::transport("local", format!("Failed to create {}: {}", what, error))
}

fn status_error(
    status: StatusCode,
    location: &ResourceLocation,
    credentials: &Credentials,
    body: &str,
) -> ArchiveError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ArchiveError::Auth {
            server: location.server.clone(),
            user: credentials.user.clone(),
        },
        StatusCode::NOT_FOUND => ArchiveError::NotFound(location.describe()),
        _ => ArchiveError::transport(
            &location.server,
            format!(
                "request for {} failed with status {}: {}",
                location.describe(),
                status,
                body.trim()
            ),
        ),
    }
}
