use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{ArchiveUrl, ServerProbe, XnatClient};

#[async_trait]
impl ServerProbe for XnatClient {
    /// A front-end is alive when its root answers with the login redirect (302).
    async fn is_healthy(&self, server: &str) -> bool {
        let url = match ArchiveUrl::server_root(self.protocol, server) {
            Ok(url) => url.build(),
            Err(e) => {
                tracing::warn!(server = %server, error = %e, "Cannot probe malformed server address");
                return false;
            }
        };

        match self.probe_client.get(url).send().await {
            Ok(response) => {
                let healthy = response.status() == StatusCode::FOUND;
                tracing::debug!(
                    server = %server,
                    status = %response.status(),
                    healthy,
                    "Probed server"
                );
                healthy
            }
            Err(e) => {
                tracing::debug!(server = %server, error = %e, "Server probe failed");
                false
            }
        }
    }
}
