use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MobrevError;

/// The pull request a run was triggered for.
///
/// Built from the event payload by [`PullRequest::from_event_json`]. Missing
/// text fields default to empty strings.
///
/// # Examples
///
/// ```
/// use mobrev_core::PullRequest;
///
/// let json = r#"{"pull_request": {"number": 7, "title": "Fix login"}}"#;
/// let pr = PullRequest::from_event_json(json).unwrap().unwrap();
/// assert_eq!(pr.number, 7);
/// assert_eq!(pr.title, "Fix login");
/// assert!(pr.body.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title as shown on the code host.
    pub title: String,
    /// Description, empty when the author left none.
    pub body: String,
    /// Canonical web URL.
    pub html_url: String,
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    pull_request: Option<RawPullRequest>,
}

#[derive(Deserialize)]
struct RawPullRequest {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

impl PullRequest {
    /// Decode an event payload.
    ///
    /// Returns `Ok(None)` when the event carries no pull request or no
    /// non-zero number: such events are not reviewed.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::Event`] if the payload is not a JSON object
    /// of the expected shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use mobrev_core::PullRequest;
    ///
    /// let push_event = r#"{"ref": "refs/heads/main"}"#;
    /// assert!(PullRequest::from_event_json(push_event).unwrap().is_none());
    /// ```
    pub fn from_event_json(json: &str) -> Result<Option<Self>, MobrevError> {
        let envelope: EventEnvelope = serde_json::from_str(json)
            .map_err(|e| MobrevError::Event(format!("invalid event payload: {e}")))?;

        let Some(raw) = envelope.pull_request else {
            return Ok(None);
        };
        let number = match raw.number {
            Some(n) if n > 0 => n,
            _ => return Ok(None),
        };

        Ok(Some(Self {
            number,
            title: raw.title.unwrap_or_default(),
            body: raw.body.unwrap_or_default(),
            html_url: raw.html_url.unwrap_or_default(),
        }))
    }

    /// Read and decode the event payload at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MobrevError::FileNotFound`] if `path` does not exist,
    /// [`MobrevError::Io`] if it cannot be read, or any error from
    /// [`PullRequest::from_event_json`].
    pub fn from_event_file(path: &Path) -> Result<Option<Self>, MobrevError> {
        if !path.exists() {
            return Err(MobrevError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_event_json(&content)
    }
}

/// How a file changed in a pull request, as reported by the code host.
///
/// # Examples
///
/// ```
/// use mobrev_core::FileStatus;
///
/// let status: FileStatus = serde_json::from_str("\"renamed\"").unwrap();
/// assert_eq!(status, FileStatus::Renamed);
/// assert_eq!(status.to_string(), "renamed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// New file.
    Added,
    /// Existing file edited.
    Modified,
    /// File deleted.
    Removed,
    /// File moved, possibly with edits.
    Renamed,
    /// File copied from another.
    Copied,
    /// Mode or metadata change.
    Changed,
    /// Listed without content changes.
    Unchanged,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Removed => "removed",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
            FileStatus::Changed => "changed",
            FileStatus::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// One entry from the pull request's changed-file listing.
///
/// `patch` is absent for binary files and very large diffs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root.
    pub filename: String,
    /// Change classification.
    pub status: FileStatus,
    /// Lines added.
    #[serde(default)]
    pub additions: u64,
    /// Lines deleted.
    #[serde(default)]
    pub deletions: u64,
    /// Unified diff text for this file.
    #[serde(default)]
    pub patch: Option<String>,
}

/// A changed file that passed filtering, with its patch sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedFile {
    /// Path relative to the repository root.
    pub filename: String,
    /// Change classification.
    pub status: FileStatus,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// Sanitized, non-blank patch text.
    pub patch: String,
}

/// Coarse risk classification extracted from a review.
///
/// # Examples
///
/// ```
/// use mobrev_core::RiskLevel;
///
/// let level: RiskLevel = "High".parse().unwrap();
/// assert_eq!(level, RiskLevel::High);
/// assert_eq!(level.as_str(), "high");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Safe to merge after a normal review.
    #[default]
    Low,
    /// Needs attention before merge.
    Medium,
    /// Should not merge without a closer look.
    High,
}

impl RiskLevel {
    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("unknown risk level: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pull_request_event() {
        let json = r#"{
            "action": "opened",
            "pull_request": {
                "number": 42,
                "title": "Add biometric login",
                "body": "Uses BiometricPrompt",
                "html_url": "https://github.com/acme/app/pull/42"
            }
        }"#;
        let pr = PullRequest::from_event_json(json).unwrap().unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.title, "Add biometric login");
        assert_eq!(pr.body, "Uses BiometricPrompt");
        assert_eq!(pr.html_url, "https://github.com/acme/app/pull/42");
    }

    #[test]
    fn null_body_defaults_to_empty() {
        let json = r#"{"pull_request": {"number": 1, "title": "t", "body": null}}"#;
        let pr = PullRequest::from_event_json(json).unwrap().unwrap();
        assert!(pr.body.is_empty());
    }

    #[test]
    fn missing_pull_request_is_not_a_review() {
        let json = r#"{"issue": {"number": 3}}"#;
        assert!(PullRequest::from_event_json(json).unwrap().is_none());
    }

    #[test]
    fn missing_or_zero_number_is_not_a_review() {
        let no_number = r#"{"pull_request": {"title": "t"}}"#;
        assert!(PullRequest::from_event_json(no_number).unwrap().is_none());
        let zero = r#"{"pull_request": {"number": 0}}"#;
        assert!(PullRequest::from_event_json(zero).unwrap().is_none());
        let null_pr = r#"{"pull_request": null}"#;
        assert!(PullRequest::from_event_json(null_pr).unwrap().is_none());
    }

    #[test]
    fn malformed_event_is_an_error() {
        let err = PullRequest::from_event_json("not json").unwrap_err();
        assert!(matches!(err, MobrevError::Event(_)));
    }

    #[test]
    fn event_file_missing() {
        let err = PullRequest::from_event_file(Path::new("/nonexistent/event.json")).unwrap_err();
        assert!(matches!(err, MobrevError::FileNotFound(_)));
    }

    #[test]
    fn event_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, r#"{"pull_request": {"number": 9}}"#).unwrap();
        let pr = PullRequest::from_event_file(&path).unwrap().unwrap();
        assert_eq!(pr.number, 9);
    }

    #[test]
    fn changed_file_from_github_json() {
        let json = r#"{
            "sha": "abc",
            "filename": "app/src/main/java/MainActivity.kt",
            "status": "modified",
            "additions": 3,
            "deletions": 1,
            "changes": 4,
            "patch": "@@ -1 +1 @@\n-a\n+b"
        }"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.status, FileStatus::Modified);
        assert_eq!(file.additions, 3);
        assert_eq!(file.patch.as_deref(), Some("@@ -1 +1 @@\n-a\n+b"));
    }

    #[test]
    fn binary_file_has_no_patch() {
        let json = r#"{"filename": "logo.png", "status": "added", "additions": 0, "deletions": 0}"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert!(file.patch.is_none());
    }

    #[test]
    fn risk_level_ordering_and_parse() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert_eq!("MEDIUM".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert!("severe".parse::<RiskLevel>().is_err());
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
    }
}
