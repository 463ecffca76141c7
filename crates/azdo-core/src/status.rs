//! Translation between status names and Azure DevOps status codes.
//!
//! Writes are strict: a name that is not in the table is an error. Reads are
//! lenient: a code that is not in the table renders as `"Unknown"`.

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Pull request status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestStatus {
    Active,
    Abandoned,
    Completed,
    All,
}

/// Status of a pull request comment thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentThreadStatus {
    Unknown,
    Active,
    Fixed,
    WontFix,
    Closed,
    ByDesign,
    Pending,
}

/// name -> status, matched exactly.
const PULL_REQUEST_STATUS_NAMES: &[(&str, PullRequestStatus)] = &[
    ("active", PullRequestStatus::Active),
    ("abandoned", PullRequestStatus::Abandoned),
    ("completed", PullRequestStatus::Completed),
    ("all", PullRequestStatus::All),
];

/// Lowercased name -> status.
const THREAD_STATUS_NAMES: &[(&str, CommentThreadStatus)] = &[
    ("unknown", CommentThreadStatus::Unknown),
    ("active", CommentThreadStatus::Active),
    ("fixed", CommentThreadStatus::Fixed),
    ("wontfix", CommentThreadStatus::WontFix),
    ("closed", CommentThreadStatus::Closed),
    ("bydesign", CommentThreadStatus::ByDesign),
    ("pending", CommentThreadStatus::Pending),
];

/// Code -> display name.
const THREAD_STATUS_DISPLAY: &[(i64, &str)] = &[
    (0, "Unknown"),
    (1, "Active"),
    (2, "Fixed"),
    (3, "WontFix"),
    (4, "Closed"),
    (5, "ByDesign"),
    (6, "Pending"),
];

/// Convert a pull request status name. Case-sensitive.
pub fn string_to_pull_request_status(name: &str) -> Result<PullRequestStatus> {
    PULL_REQUEST_STATUS_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, status)| *status)
        .ok_or_else(|| Error::Validation(format!("Invalid pull request status: {}", name)))
}

/// Convert a thread status name. Case-insensitive.
pub fn string_to_thread_status(name: &str) -> Result<CommentThreadStatus> {
    let lowered = name.to_lowercase();
    THREAD_STATUS_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == lowered)
        .map(|(_, status)| *status)
        .ok_or_else(|| Error::Validation(format!("Invalid thread status: {}", name)))
}

/// Render a thread status code. Never fails.
pub fn thread_status_to_string(code: i64) -> &'static str {
    THREAD_STATUS_DISPLAY
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

impl PullRequestStatus {
    /// Name used in `searchCriteria.status` query parameters.
    pub fn api_name(self) -> &'static str {
        match self {
            PullRequestStatus::Active => "active",
            PullRequestStatus::Abandoned => "abandoned",
            PullRequestStatus::Completed => "completed",
            PullRequestStatus::All => "all",
        }
    }
}

impl CommentThreadStatus {
    pub fn code(self) -> i64 {
        match self {
            CommentThreadStatus::Unknown => 0,
            CommentThreadStatus::Active => 1,
            CommentThreadStatus::Fixed => 2,
            CommentThreadStatus::WontFix => 3,
            CommentThreadStatus::Closed => 4,
            CommentThreadStatus::ByDesign => 5,
            CommentThreadStatus::Pending => 6,
        }
    }

    /// Name the REST API uses on the wire.
    pub fn api_name(self) -> &'static str {
        match self {
            CommentThreadStatus::Unknown => "unknown",
            CommentThreadStatus::Active => "active",
            CommentThreadStatus::Fixed => "fixed",
            CommentThreadStatus::WontFix => "wontFix",
            CommentThreadStatus::Closed => "closed",
            CommentThreadStatus::ByDesign => "byDesign",
            CommentThreadStatus::Pending => "pending",
        }
    }
}

impl Serialize for CommentThreadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.api_name())
    }
}
