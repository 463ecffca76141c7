//! Pull request data model shared by the REST client and the MCP tools.
//!
//! These types mirror the JSON shapes of the Azure DevOps Git REST API
//! (camelCase). Fields this crate does not interpret are kept in `extra` so
//! tool output passes the provider's data through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::status::{CommentThreadStatus, PullRequestStatus};

// =============================================================================
// Identities and pull requests
// =============================================================================

/// Azure DevOps identity reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pull request as returned by the Git API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPullRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<IdentityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Search filter for listing pull requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PullRequestSearchCriteria {
    pub status: Option<PullRequestStatus>,
    pub creator_id: Option<String>,
    pub reviewer_id: Option<String>,
    pub source_ref_name: Option<String>,
    pub target_ref_name: Option<String>,
    pub include_links: Option<bool>,
}

// =============================================================================
// Comment threads
// =============================================================================

/// Line/offset position inside a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl CommentPosition {
    pub fn new(line: i64, offset: i64) -> Self {
        Self {
            line: Some(line),
            offset: Some(offset),
        }
    }
}

/// File anchoring of a thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_file_start: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_file_end: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_file_start: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_file_end: Option<CommentPosition>,
}

impl ThreadContext {
    /// Context anchored on the right-hand side of `file_path` at a single line.
    pub fn at_line(file_path: impl Into<String>, line: i64) -> Self {
        let position = CommentPosition::new(line, 1);
        Self {
            file_path: Some(file_path.into()),
            right_file_start: Some(position),
            right_file_end: Some(position),
            ..Default::default()
        }
    }
}

/// A single comment inside a thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_comment_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<IdentityRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Comment {
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.display_name.as_deref())
    }
}

/// A pull request comment thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    /// Numeric status code; REST status names are resolved on read.
    #[serde(
        default,
        deserialize_with = "lenient::thread_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_context: Option<ThreadContext>,
    /// `None` when absent, `Some(None)` when explicitly `null`.
    #[serde(
        default,
        deserialize_with = "lenient::explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub pull_request_thread_context: Option<Option<Value>>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Request bodies
// =============================================================================

/// Comment type sent with new comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentType {
    Text,
}

/// Body for a new comment, either inside a new thread or as a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_type: Option<CommentType>,
}

/// Body for creating a thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentThread {
    pub comments: Vec<NewComment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_context: Option<ThreadContext>,
}

/// Body for editing a comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentUpdate {
    pub content: String,
}

/// Body for changing a thread's status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadUpdate {
    pub status: CommentThreadStatus,
}

// =============================================================================
// Iterations and changes
// =============================================================================

/// A pull request iteration (one pushed revision of the source branch).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestIteration {
    #[serde(
        default,
        deserialize_with = "lenient::integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One changed file in an iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_tracking_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Changes of an iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_entries: Option<Vec<PullRequestChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_skip: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_top: Option<i64>,
}

/// Deserializers that accept whatever the provider sends and keep only what
/// has the expected shape.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::status::string_to_thread_status;

    /// Integer if the value is an integral number, otherwise `None`.
    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| v.as_i64()))
    }

    /// Numeric thread status; names are resolved through the status table.
    pub fn thread_status<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(name)) => string_to_thread_status(&name).ok().map(|s| s.code()),
            _ => None,
        })
    }

    /// Distinguishes an explicit `null` from a missing field (the latter is
    /// handled by `#[serde(default)]`).
    pub fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Some(Option::<Value>::deserialize(deserializer)?))
    }
}
