use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ArchiveError, ArchiveResult};
use crate::validation::{normalize_server_name, validate_file_path_within_resource};

/// URL scheme used to reach the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of a file relative to its resource container.
///
/// Never begins with `/`. The empty path denotes the resource root and is only
/// meaningful as a base that file names get joined onto.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceFilePath(String);

impl ResourceFilePath {
    pub fn root() -> Self {
        ResourceFilePath(String::new())
    }

    pub fn parse(path: &str) -> ArchiveResult<Self> {
        validate_file_path_within_resource(path)?;
        Ok(ResourceFilePath(path.to_string()))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a relative path (e.g. `T1w/wmparc.nii.gz`) to this one.
    pub fn join(&self, relative: &str) -> ArchiveResult<Self> {
        if self.is_root() {
            return Self::parse(relative);
        }
        Self::parse(&format!("{}/{}", self.0, relative))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceFilePath {
    type Error = ArchiveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Ok(ResourceFilePath::root());
        }
        ResourceFilePath::parse(&value)
    }
}

impl From<ResourceFilePath> for String {
    fn from(value: ResourceFilePath) -> Self {
        value.0
    }
}

impl fmt::Display for ResourceFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address of a file (or of the resource root) inside the archive.
///
/// The session label is always `{subject}_{classifier}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocation {
    pub protocol: Protocol,
    pub server: String,
    pub project: String,
    pub subject: String,
    pub classifier: String,
    pub resource: String,
    pub file_path: ResourceFilePath,
}

impl ResourceLocation {
    pub fn new(
        protocol: Protocol,
        server: &str,
        project: &str,
        subject: &str,
        classifier: &str,
        resource: &str,
    ) -> ArchiveResult<Self> {
        for (name, value) in [
            ("project", project),
            ("subject", subject),
            ("classifier", classifier),
            ("resource", resource),
        ] {
            if value.trim().is_empty() {
                return Err(ArchiveError::validation(format!("{} must not be empty", name)));
            }
            if value.contains('/') {
                return Err(ArchiveError::validation(format!(
                    "{} must not contain '/': {}",
                    name, value
                )));
            }
        }

        Ok(Self {
            protocol,
            server: normalize_server_name(server)?,
            project: project.trim().to_string(),
            subject: subject.trim().to_string(),
            classifier: classifier.trim().to_string(),
            resource: resource.trim().to_string(),
            file_path: ResourceFilePath::root(),
        })
    }

    pub fn session(&self) -> String {
        format!("{}_{}", self.subject, self.classifier)
    }

    pub fn with_file_path(&self, file_path: ResourceFilePath) -> Self {
        Self {
            file_path,
            ..self.clone()
        }
    }

    pub fn with_server(&self, server: &str) -> ArchiveResult<Self> {
        Ok(Self {
            server: normalize_server_name(server)?,
            ..self.clone()
        })
    }

    /// Human-readable path used in logs and error messages.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{}://{}/{}/{}/{}/{}",
            self.protocol,
            self.server,
            self.project,
            self.subject,
            self.session(),
            self.resource
        );
        if !self.file_path.is_root() {
            out.push('/');
            out.push_str(self.file_path.as_str());
        }
        out
    }
}
