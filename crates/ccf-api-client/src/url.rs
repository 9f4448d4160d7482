//! Structured construction of archive REST URLs.
//!
//! Every path component is pushed as its own segment so that values are escaped
//! and cannot introduce extra path levels.

use ccf_core::{ArchiveError, ArchiveResult, Protocol, ResourceLocation};
use reqwest::Url;

const REST_ROOT: &str = "REST";

/// Builder for `{protocol}://{server}/REST/...` URLs
pub struct ArchiveUrl {
    url: Url,
}

impl ArchiveUrl {
    pub fn server_root(protocol: Protocol, server: &str) -> ArchiveResult<Self> {
        let url = Url::parse(&format!("{}://{}/", protocol, server)).map_err(|e| {
            ArchiveError::validation(format!("invalid server address '{}': {}", server, e))
        })?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ArchiveError::validation(format!(
                "invalid server address '{}'",
                server
            )));
        }
        Ok(Self { url })
    }

    /// `/REST/projects/{project}/subjects/{subject}/experiments`
    pub fn experiments(location: &ResourceLocation) -> ArchiveResult<Self> {
        Self::server_root(location.protocol, &location.server)?.segments([
            REST_ROOT,
            "projects",
            &location.project,
            "subjects",
            &location.subject,
            "experiments",
        ])
    }

    /// `/REST/projects/{project}/subjects/{subject}/experiments/{sessionId}/resources/{resource}`
    pub fn resource(location: &ResourceLocation, session_id: &str) -> ArchiveResult<Self> {
        Self::experiments(location)?.segments([session_id, "resources", &location.resource])
    }

    /// Resource URL followed by `/files/{filePathWithinResource}`
    pub fn file(location: &ResourceLocation, session_id: &str) -> ArchiveResult<Self> {
        if location.file_path.is_root() {
            return Err(ArchiveError::validation(format!(
                "a file path within resource '{}' is required",
                location.resource
            )));
        }
        Self::resource(location, session_id)?
            .segments(["files"])?
            .segments(location.file_path.segments())
    }

    pub fn segments<'a, I>(mut self, segments: I) -> ArchiveResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        {
            let mut path = self
                .url
                .path_segments_mut()
                .map_err(|_| ArchiveError::validation("URL cannot take path segments"))?;
            path.pop_if_empty();
            for segment in segments {
                if segment.is_empty() {
                    return Err(ArchiveError::validation("URL path segment must not be empty"));
                }
                path.push(segment);
            }
        }
        Ok(self)
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    pub fn build(self) -> Url {
        self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccf_core::ResourceFilePath;

    fn location() -> ResourceLocation {
        ResourceLocation::new(
            Protocol::Https,
            "db.humanconnectome.org",
            "HCP_1200",
            "100307",
            "3T",
            "Structural_preproc",
        )
        .unwrap()
        .with_file_path(ResourceFilePath::parse("T1w/wmparc.nii.gz").unwrap())
    }

    #[test]
    fn test_file_url() {
        let url = ArchiveUrl::file(&location(), "ConnectomeDB_E1234")
            .unwrap()
            .query("overwrite", "true")
            .query("replace", "true")
            .query("event_reason", "Structural preproc")
            .build();
        assert_eq!(
            url.as_str(),
            "https://db.humanconnectome.org/REST/projects/HCP_1200/subjects/100307/experiments/ConnectomeDB_E1234/resources/Structural_preproc/files/T1w/wmparc.nii.gz?overwrite=true&replace=true&event_reason=Structural+preproc"
        );
    }

    #[test]
    fn test_segments_are_escaped() {
        let loc = ResourceLocation::new(Protocol::Http, "localhost:8080", "P", "S 1", "3T", "R#1")
            .unwrap();
        let url = ArchiveUrl::resource(&loc, "E?1").unwrap().build();
        assert_eq!(
            url.path(),
            "/REST/projects/P/subjects/S%201/experiments/E%3F1/resources/R%231"
        );
        assert_eq!(url.port(), Some(8080));
        assert!(url.query().is_none());
    }

    #[test]
    fn test_reference_value_is_escaped() {
        let url = ArchiveUrl::file(&location(), "E1")
            .unwrap()
            .query("reference", "/data/build/100307 & co/T1w")
            .build();
        assert!(url
            .as_str()
            .ends_with("reference=%2Fdata%2Fbuild%2F100307+%26+co%2FT1w"));
    }

    #[test]
    fn test_file_url_requires_file_path() {
        let loc = location().with_file_path(ResourceFilePath::root());
        assert!(matches!(
            ArchiveUrl::file(&loc, "E1"),
            Err(ArchiveError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_session_id_rejected() {
        assert!(ArchiveUrl::resource(&location(), "").is_err());
    }
}
