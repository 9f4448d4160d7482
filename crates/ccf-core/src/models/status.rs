use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ArchiveResult;
use crate::validation::validate_single_line;

/// Persisted job status. Only the presence of the marker file is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunningState {
    Running,
    Absent,
}

impl fmt::Display for RunningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunningState::Running => f.write_str("RUNNING"),
            RunningState::Absent => f.write_str("ABSENT"),
        }
    }
}

/// Marker for one job against one subject/classifier (and optional scan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningStatusRecord {
    pub subject: String,
    pub classifier: String,
    pub scan: Option<String>,
    pub resource: String,
    pub state: RunningState,
    pub reason: String,
    pub user: String,
}

impl RunningStatusRecord {
    /// `{subject}_{classifier}[_{scan}]`
    fn qualified_subject(&self) -> String {
        match &self.scan {
            Some(scan) => format!("{}_{}_{}", self.subject, self.classifier, scan),
            None => format!("{}_{}", self.subject, self.classifier),
        }
    }

    /// File name of the marker inside the resource, e.g. `MsmAllProcessing.100307_3T.RUNNING`.
    pub fn marker_file_name(&self, pipeline: &str) -> String {
        format!("{}.{}.RUNNING", pipeline, self.qualified_subject())
    }

    /// Name of the local scratch directory the marker is staged in.
    pub fn scratch_dir_name(&self, pipeline: &str) -> String {
        format!(
            "{}.{}.XNAT_MARK_RUNNING_STATUS",
            pipeline,
            self.qualified_subject()
        )
    }

    /// Check that the marker body and name stay on one line.
    pub fn validate(&self) -> ArchiveResult<()> {
        validate_single_line("user", &self.user)?;
        validate_single_line("reason", &self.reason)?;
        if let Some(scan) = &self.scan {
            validate_single_line("scan", scan)?;
        }
        Ok(())
    }

    /// Single-line marker body.
    pub fn marker_contents(&self) -> String {
        format!("User: {}, Reason: {}", self.user, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(scan: Option<&str>) -> RunningStatusRecord {
        RunningStatusRecord {
            subject: "100307".to_string(),
            classifier: "3T".to_string(),
            scan: scan.map(str::to_string),
            resource: "RunningStatus".to_string(),
            state: RunningState::Running,
            reason: "running".to_string(),
            user: "tbbrown".to_string(),
        }
    }

    #[test]
    fn test_marker_naming() {
        let r = record(None);
        assert_eq!(
            r.marker_file_name("MsmAllProcessing"),
            "MsmAllProcessing.100307_3T.RUNNING"
        );
        assert_eq!(
            r.scratch_dir_name("MsmAllProcessing"),
            "MsmAllProcessing.100307_3T.XNAT_MARK_RUNNING_STATUS"
        );
        assert_eq!(r.marker_contents(), "User: tbbrown, Reason: running");
    }

    #[test]
    fn test_multi_line_reason_rejected() {
        assert!(record(None).validate().is_ok());

        let mut r = record(None);
        r.reason = "running\nUser: someone-else".to_string();
        assert!(matches!(r.validate(), Err(crate::ArchiveError::Validation(_))));

        let mut r = record(Some("rfMRI\n"));
        r.reason = "running".to_string();
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_marker_naming_with_scan() {
        let r = record(Some("rfMRI_REST1_LR"));
        assert_eq!(
            r.marker_file_name("FunctionalPreprocessing"),
            "FunctionalPreprocessing.100307_3T_rfMRI_REST1_LR.RUNNING"
        );
    }
}
