//! Tool argument types and their JSON input schemas.
//!
//! Arguments are decoded with serde straight from the `tools/call` payload.
//! Anything serde rejects (missing field, wrong JSON type, non-integer id)
//! and anything [`ToolArgs::validate`] rejects becomes [`Error::Validation`]
//! before an operation runs. Unknown extra properties are ignored.

use azdo_core::{string_to_pull_request_status, Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::protocol::ToolDefinition;

/// Thread status names accepted by `update_pr_thread_status`, matched exactly.
pub const THREAD_STATUS_CHOICES: &[&str] = &[
    "Unknown", "Active", "Fixed", "WontFix", "Closed", "ByDesign", "Pending",
];

/// Pull request status names accepted by `list_pull_requests`.
pub const PULL_REQUEST_STATUS_CHOICES: &[&str] = &["active", "abandoned", "completed", "all"];

/// Arguments of one MCP tool.
pub trait ToolArgs: DeserializeOwned {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn input_schema() -> Value;

    /// Checks serde cannot express.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn definition() -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            input_schema: Self::input_schema(),
        }
    }
}

/// Decode and validate tool arguments.
pub fn parse_args<T: ToolArgs>(arguments: Value) -> Result<T> {
    let args: T = serde_json::from_value(arguments)
        .map_err(|e| Error::Validation(format!("Invalid arguments for {}: {}", T::NAME, e)))?;
    args.validate()?;
    Ok(args)
}

/// Definitions of every tool, in the order they are listed to clients.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        GetPullRequestArgs::definition(),
        ListPullRequestsArgs::definition(),
        ListPrCommentsArgs::definition(),
        UpdatePrCommentArgs::definition(),
        UpdatePrThreadStatusArgs::definition(),
        CreatePrCommentArgs::definition(),
        ReplyToPrCommentArgs::definition(),
        GetPrFilesArgs::definition(),
    ]
}

/// Build an object schema from property definitions and required names.
fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn repository_id() -> Value {
    json!({"type": "string", "description": "Repository ID or name"})
}

fn project_id() -> Value {
    json!({"type": "string", "description": "Project ID or name"})
}

fn pull_request_id() -> Value {
    json!({"type": "integer", "description": "Pull request ID"})
}

fn thread_id() -> Value {
    json!({"type": "integer", "description": "Comment thread ID"})
}

// =============================================================================
// Pull requests
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPullRequestArgs {
    pub repository_id: String,
    pub pull_request_id: i64,
    pub project_id: String,
}

impl ToolArgs for GetPullRequestArgs {
    const NAME: &'static str = "get_pull_request";
    const DESCRIPTION: &'static str = "Get a pull request by its ID";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "pullRequestId": pull_request_id(),
                "projectId": project_id(),
            }),
            &["repositoryId", "pullRequestId", "projectId"],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPullRequestsArgs {
    pub repository_id: String,
    pub project_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub reviewer_id: Option<String>,
    #[serde(default)]
    pub source_ref_name: Option<String>,
    #[serde(default)]
    pub target_ref_name: Option<String>,
    #[serde(default)]
    pub include_links: Option<bool>,
}

impl ToolArgs for ListPullRequestsArgs {
    const NAME: &'static str = "list_pull_requests";
    const DESCRIPTION: &'static str = "List pull requests in a repository";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "projectId": project_id(),
                "status": {
                    "type": "string",
                    "enum": PULL_REQUEST_STATUS_CHOICES,
                    "description": "Filter by pull request status"
                },
                "creatorId": {"type": "string", "description": "Filter by creator identity ID"},
                "reviewerId": {"type": "string", "description": "Filter by reviewer identity ID"},
                "sourceRefName": {
                    "type": "string",
                    "description": "Filter by source branch, e.g. refs/heads/feature"
                },
                "targetRefName": {
                    "type": "string",
                    "description": "Filter by target branch, e.g. refs/heads/main"
                },
                "includeLinks": {"type": "boolean", "description": "Include _links in the response"}
            }),
            &["repositoryId", "projectId"],
        )
    }

    fn validate(&self) -> Result<()> {
        if let Some(status) = &self.status {
            string_to_pull_request_status(status)?;
        }
        Ok(())
    }
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPrCommentsArgs {
    pub repository_id: String,
    pub pull_request_id: i64,
    pub project_id: String,
}

impl ToolArgs for ListPrCommentsArgs {
    const NAME: &'static str = "list_pr_comments";
    const DESCRIPTION: &'static str =
        "List file comments of a pull request as threads with nested replies";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "pullRequestId": pull_request_id(),
                "projectId": project_id(),
            }),
            &["repositoryId", "pullRequestId", "projectId"],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrCommentArgs {
    pub repository_id: String,
    pub pull_request_id: i64,
    pub thread_id: i64,
    pub comment_id: i64,
    pub content: String,
    pub project_id: String,
}

impl ToolArgs for UpdatePrCommentArgs {
    const NAME: &'static str = "update_pr_comment";
    const DESCRIPTION: &'static str = "Edit the content of a pull request comment";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "pullRequestId": pull_request_id(),
                "threadId": thread_id(),
                "commentId": {"type": "integer", "description": "Comment ID within the thread"},
                "content": {"type": "string", "description": "New comment text"},
                "projectId": project_id(),
            }),
            &[
                "repositoryId",
                "pullRequestId",
                "threadId",
                "commentId",
                "content",
                "projectId",
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrThreadStatusArgs {
    pub repository_id: String,
    pub pull_request_id: i64,
    pub thread_id: i64,
    pub status: String,
    pub project_id: String,
}

impl ToolArgs for UpdatePrThreadStatusArgs {
    const NAME: &'static str = "update_pr_thread_status";
    const DESCRIPTION: &'static str = "Change the status of a pull request comment thread";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "pullRequestId": pull_request_id(),
                "threadId": thread_id(),
                "status": {
                    "type": "string",
                    "enum": THREAD_STATUS_CHOICES,
                    "description": "New thread status"
                },
                "projectId": project_id(),
            }),
            &[
                "repositoryId",
                "pullRequestId",
                "threadId",
                "status",
                "projectId",
            ],
        )
    }

    fn validate(&self) -> Result<()> {
        if THREAD_STATUS_CHOICES.contains(&self.status.as_str()) {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "Invalid thread status: {} (expected one of {})",
                self.status,
                THREAD_STATUS_CHOICES.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrCommentArgs {
    pub repository_id: String,
    pub pull_request_id: i64,
    pub content: String,
    pub project_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line_number: Option<i64>,
}

impl ToolArgs for CreatePrCommentArgs {
    const NAME: &'static str = "create_pr_comment";
    const DESCRIPTION: &'static str =
        "Start a new comment thread on a pull request, optionally anchored to a file line";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "pullRequestId": pull_request_id(),
                "content": {"type": "string", "description": "Comment text"},
                "projectId": project_id(),
                "filePath": {
                    "type": "string",
                    "description": "Path of the file to comment on, e.g. /src/main.rs"
                },
                "lineNumber": {
                    "type": "integer",
                    "description": "Line in the new version of the file (defaults to 1)"
                }
            }),
            &["repositoryId", "pullRequestId", "content", "projectId"],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyToPrCommentArgs {
    pub repository_id: String,
    pub pull_request_id: i64,
    pub thread_id: i64,
    pub content: String,
    pub project_id: String,
    #[serde(default)]
    pub parent_comment_id: Option<i64>,
}

impl ToolArgs for ReplyToPrCommentArgs {
    const NAME: &'static str = "reply_to_pr_comment";
    const DESCRIPTION: &'static str = "Reply to an existing pull request comment thread";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "pullRequestId": pull_request_id(),
                "threadId": thread_id(),
                "content": {"type": "string", "description": "Reply text"},
                "projectId": project_id(),
                "parentCommentId": {
                    "type": "integer",
                    "description": "Comment being replied to (defaults to the thread)"
                }
            }),
            &[
                "repositoryId",
                "pullRequestId",
                "threadId",
                "content",
                "projectId",
            ],
        )
    }
}

// =============================================================================
// Files
// =============================================================================

/// An iteration number given either as a JSON integer or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IterationRef {
    Number(i64),
    Text(String),
}

impl IterationRef {
    /// Blank text means no comparison iteration.
    pub fn resolve(&self) -> Result<Option<i64>> {
        match self {
            IterationRef::Number(n) => Ok(Some(*n)),
            IterationRef::Text(s) if s.trim().is_empty() => Ok(None),
            IterationRef::Text(s) => s.trim().parse().map(Some).map_err(|_| {
                Error::Validation(format!("compareTo must be an integer, got '{}'", s))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPrFilesArgs {
    pub repository_id: String,
    pub pull_request_id: i64,
    pub project_id: String,
    #[serde(default)]
    pub compare_to: Option<IterationRef>,
}

impl GetPrFilesArgs {
    pub fn compare_to_iteration(&self) -> Result<Option<i64>> {
        self.compare_to
            .as_ref()
            .map_or(Ok(None), IterationRef::resolve)
    }
}

impl ToolArgs for GetPrFilesArgs {
    const NAME: &'static str = "get_pr_files";
    const DESCRIPTION: &'static str =
        "List the files changed in the latest iteration of a pull request";

    fn input_schema() -> Value {
        object_schema(
            json!({
                "repositoryId": repository_id(),
                "pullRequestId": pull_request_id(),
                "projectId": project_id(),
                "compareTo": {
                    "type": ["string", "integer"],
                    "description": "Iteration to compare against (defaults to the PR base)"
                }
            }),
            &["repositoryId", "pullRequestId", "projectId"],
        )
    }

    fn validate(&self) -> Result<()> {
        self.compare_to_iteration().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_message<T: ToolArgs + std::fmt::Debug>(arguments: Value) -> String {
        match parse_args::<T>(arguments) {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_ignores_extra_properties() {
        let args: GetPullRequestArgs = parse_args(json!({
            "repositoryId": "repo",
            "pullRequestId": 42,
            "projectId": "proj",
            "verbose": true
        }))
        .unwrap();
        assert_eq!(args.pull_request_id, 42);
    }

    #[test]
    fn test_missing_field() {
        let msg = validation_message::<GetPullRequestArgs>(json!({
            "repositoryId": "repo",
            "projectId": "proj"
        }));
        assert!(msg.starts_with("Invalid arguments for get_pull_request"));
        assert!(msg.contains("pullRequestId"));
    }

    #[test]
    fn test_ids_must_be_integers() {
        validation_message::<ListPrCommentsArgs>(json!({
            "repositoryId": "repo",
            "pullRequestId": "42",
            "projectId": "proj"
        }));
        validation_message::<ListPrCommentsArgs>(json!({
            "repositoryId": "repo",
            "pullRequestId": 4.5,
            "projectId": "proj"
        }));
    }

    #[test]
    fn test_list_status_is_case_sensitive() {
        let ok: ListPullRequestsArgs = parse_args(json!({
            "repositoryId": "repo",
            "projectId": "proj",
            "status": "completed"
        }))
        .unwrap();
        assert_eq!(ok.status.as_deref(), Some("completed"));

        let msg = validation_message::<ListPullRequestsArgs>(json!({
            "repositoryId": "repo",
            "projectId": "proj",
            "status": "Completed"
        }));
        assert_eq!(msg, "Invalid pull request status: Completed");
    }

    #[test]
    fn test_thread_status_choices() {
        for status in THREAD_STATUS_CHOICES {
            let args: UpdatePrThreadStatusArgs = parse_args(json!({
                "repositoryId": "repo",
                "pullRequestId": 1,
                "threadId": 2,
                "status": status,
                "projectId": "proj"
            }))
            .unwrap();
            assert_eq!(&args.status, status);
        }

        let msg = validation_message::<UpdatePrThreadStatusArgs>(json!({
            "repositoryId": "repo",
            "pullRequestId": 1,
            "threadId": 2,
            "status": "fixed",
            "projectId": "proj"
        }));
        assert!(msg.starts_with("Invalid thread status: fixed"));
    }

    #[test]
    fn test_compare_to_accepts_integer_or_numeric_string() {
        let base = json!({"repositoryId": "repo", "pullRequestId": 1, "projectId": "proj"});

        let mut with_number = base.clone();
        with_number["compareTo"] = json!(3);
        let args: GetPrFilesArgs = parse_args(with_number).unwrap();
        assert_eq!(args.compare_to_iteration().unwrap(), Some(3));

        let mut with_string = base.clone();
        with_string["compareTo"] = json!("2");
        let args: GetPrFilesArgs = parse_args(with_string).unwrap();
        assert_eq!(args.compare_to_iteration().unwrap(), Some(2));

        let args: GetPrFilesArgs = parse_args(base.clone()).unwrap();
        assert_eq!(args.compare_to_iteration().unwrap(), None);

        for blank in ["", "  "] {
            let mut with_blank = base.clone();
            with_blank["compareTo"] = json!(blank);
            let args: GetPrFilesArgs = parse_args(with_blank).unwrap();
            assert_eq!(args.compare_to_iteration().unwrap(), None);
        }

        let mut with_garbage = base;
        with_garbage["compareTo"] = json!("latest");
        let msg = validation_message::<GetPrFilesArgs>(with_garbage);
        assert!(msg.contains("compareTo must be an integer"));
    }

    #[test]
    fn test_tool_definitions() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_pull_request",
                "list_pull_requests",
                "list_pr_comments",
                "update_pr_comment",
                "update_pr_thread_status",
                "create_pr_comment",
                "reply_to_pr_comment",
                "get_pr_files",
            ]
        );

        for tool in &tools {
            assert_eq!(tool.input_schema["type"], "object");
            let required = tool.input_schema["required"].as_array().unwrap();
            for name in required {
                let name = name.as_str().unwrap();
                assert!(
                    tool.input_schema["properties"].get(name).is_some(),
                    "{} lists {} as required but does not define it",
                    tool.name,
                    name
                );
            }
        }

        let status = &tools[4].input_schema["properties"]["status"]["enum"];
        assert_eq!(status.as_array().unwrap().len(), 7);
    }
}
