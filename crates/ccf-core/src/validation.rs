//! Validation helpers for command parameters and resource paths

use crate::error::{ArchiveError, ArchiveResult};

/// Return the trimmed value of a required parameter, or a validation error naming it.
pub fn require(name: &str, value: Option<&str>) -> ArchiveResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ArchiveError::validation(format!(
            "--{} is required",
            name
        ))),
    }
}

/// Check a path relative to a resource container.
///
/// The path must not start with `/`, and must not contain empty, `.` or `..` segments.
pub fn validate_file_path_within_resource(path: &str) -> ArchiveResult<()> {
    if path.starts_with('/') {
        return Err(ArchiveError::validation(format!(
            "file path within resource must not start with '/': {}",
            path
        )));
    }
    if path.is_empty() {
        return Err(ArchiveError::validation(
            "file path within resource must not be empty",
        ));
    }
    for segment in path.split('/') {
        match segment {
            "" => {
                return Err(ArchiveError::validation(format!(
                    "file path within resource contains an empty segment: {}",
                    path
                )))
            }
            "." | ".." => {
                return Err(ArchiveError::validation(format!(
                    "file path within resource contains a relative segment: {}",
                    path
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Reduce a server given as `https://host[:port]/` (or bare) to `host[:port]`.
pub fn normalize_server_name(raw: &str) -> ArchiveResult<String> {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let host = without_scheme.trim_end_matches('/');

    if host.is_empty() {
        return Err(ArchiveError::validation("server name must not be empty"));
    }
    if host.contains('/') || host.contains(char::is_whitespace) {
        return Err(ArchiveError::validation(format!(
            "server must be a host name with optional port: {}",
            raw
        )));
    }
    Ok(host.to_string())
}

/// Reject values that would break a single-line record (newlines and other control characters).
pub fn validate_single_line(name: &str, value: &str) -> ArchiveResult<()> {
    if value.chars().any(char::is_control) {
        return Err(ArchiveError::validation(format!(
            "{} must be a single line without control characters",
            name
        )));
    }
    Ok(())
}

/// Whether an interactive answer confirms the operation (`y` or `yes`, any case).
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "y" || answer == "yes"
}
