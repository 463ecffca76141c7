//! Tool dispatch for the MCP server.
//!
//! A tool call is handled in a fixed order: the arguments must be present,
//! a connection is established, the tool is resolved by name, its arguments
//! are validated and finally the operation runs. Successes are rendered as
//! pretty-printed JSON, failures as text prefixed by their category.

use std::future::Future;
use std::sync::Arc;

use azdo_core::{Connector, Error, Result};
use serde::Serialize;
use serde_json::Value;

use crate::operations;
use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::schemas::{
    parse_args, tool_definitions, CreatePrCommentArgs, GetPrFilesArgs, GetPullRequestArgs,
    ListPrCommentsArgs, ListPullRequestsArgs, ReplyToPrCommentArgs, ToolArgs,
    UpdatePrCommentArgs, UpdatePrThreadStatusArgs,
};

/// Tool handler that executes tools against Azure DevOps.
pub struct ToolHandler {
    connector: Arc<dyn Connector>,
}

impl ToolHandler {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        match self.dispatch(name, arguments).await {
            Ok(output) => ToolCallResult::text(output),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(format_error(&e))
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: Option<Value>) -> Result<String> {
        let arguments =
            arguments.ok_or_else(|| Error::Validation("Arguments are required".to_string()))?;

        let connection = self.connector.connect().await?;
        let api = connection.as_ref();

        match name {
            GetPullRequestArgs::NAME => {
                run(arguments, |args: GetPullRequestArgs| async move {
                    operations::get_pull_request(api, &args).await
                })
                .await
            }
            ListPullRequestsArgs::NAME => {
                run(arguments, |args: ListPullRequestsArgs| async move {
                    operations::list_pull_requests(api, &args).await
                })
                .await
            }
            ListPrCommentsArgs::NAME => {
                run(arguments, |args: ListPrCommentsArgs| async move {
                    operations::list_pr_comments(api, &args).await
                })
                .await
            }
            UpdatePrCommentArgs::NAME => {
                run(arguments, |args: UpdatePrCommentArgs| async move {
                    operations::update_pr_comment(api, &args).await
                })
                .await
            }
            UpdatePrThreadStatusArgs::NAME => {
                run(arguments, |args: UpdatePrThreadStatusArgs| async move {
                    operations::update_pr_thread_status(api, &args).await
                })
                .await
            }
            CreatePrCommentArgs::NAME => {
                run(arguments, |args: CreatePrCommentArgs| async move {
                    operations::create_pr_comment(api, &args).await
                })
                .await
            }
            ReplyToPrCommentArgs::NAME => {
                run(arguments, |args: ReplyToPrCommentArgs| async move {
                    operations::reply_to_pr_comment(api, &args).await
                })
                .await
            }
            GetPrFilesArgs::NAME => {
                run(arguments, |args: GetPrFilesArgs| async move {
                    operations::get_pr_files(api, &args).await
                })
                .await
            }
            unknown => Err(Error::Other(anyhow::anyhow!("Unknown tool: {}", unknown))),
        }
    }
}

/// Parse the arguments for `A`, run the operation and render its output.
async fn run<A, T, F, Fut>(arguments: Value, operation: F) -> Result<String>
where
    A: ToolArgs,
    T: Serialize,
    F: FnOnce(A) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let args = parse_args::<A>(arguments)?;
    let output = operation(args).await?;
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Render an error as tool output text.
pub fn format_error(error: &Error) -> String {
    match error {
        Error::Validation(msg) => format!("Validation Error: {}", msg),
        Error::ResourceNotFound { .. } => format!("Not Found: {}", error),
        Error::Authentication(msg) => format!("Authentication Failed: {}", msg),
        Error::Http(_) | Error::Api { .. } | Error::Unauthorized(_) => {
            format!("Azure DevOps API Error: {}", error)
        }
        Error::OperationFailed { .. }
        | Error::InvalidData(_)
        | Error::Serialization(_)
        | Error::Config(_)
        | Error::Storage(_)
        | Error::Other(_) => format!("Error: {}", error),
    }
}
