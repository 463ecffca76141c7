//! Pull request operations behind the MCP tools.
//!
//! Each operation performs one logical unit of work against a
//! [`PullRequestApi`] handle. Missing entities become
//! [`Error::ResourceNotFound`]; every other failure is wrapped as
//! `Failed to <operation>: <cause>`.

use anyhow::anyhow;
use azdo_core::{
    process_pull_request_comments, string_to_pull_request_status, string_to_thread_status,
    CommentThread, CommentType, CommentUpdate, Error, GitPullRequest, NewComment, NewCommentThread,
    PullRequestApi, PullRequestChange, PullRequestSearchCriteria, ReconstructedComment, Result,
    ThreadContext, ThreadUpdate,
};
use tracing::debug;

use crate::schemas::{
    CreatePrCommentArgs, GetPrFilesArgs, GetPullRequestArgs, ListPrCommentsArgs,
    ListPullRequestsArgs, ReplyToPrCommentArgs, UpdatePrCommentArgs, UpdatePrThreadStatusArgs,
};

fn thread_not_found(thread_id: i64, pull_request_id: i64) -> Error {
    Error::not_found("Thread", thread_id, format!("pull request {}", pull_request_id))
}

/// Fetch a thread after one of its comments changed.
async fn reload_thread(
    api: &dyn PullRequestApi,
    project: &str,
    repository: &str,
    pull_request_id: i64,
    thread_id: i64,
) -> Result<CommentThread> {
    api.get_thread(project, repository, pull_request_id, thread_id)
        .await?
        .ok_or_else(|| thread_not_found(thread_id, pull_request_id))
}

pub async fn get_pull_request(
    api: &dyn PullRequestApi,
    args: &GetPullRequestArgs,
) -> Result<GitPullRequest> {
    let pull_request = api
        .get_pull_request(&args.project_id, &args.repository_id, args.pull_request_id)
        .await
        .map_err(|e| e.in_operation("get pull request"))?;

    pull_request.ok_or_else(|| {
        Error::not_found(
            "Pull request",
            args.pull_request_id,
            format!("repository {}", args.repository_id),
        )
    })
}

pub async fn list_pull_requests(
    api: &dyn PullRequestApi,
    args: &ListPullRequestsArgs,
) -> Result<Vec<GitPullRequest>> {
    let criteria = PullRequestSearchCriteria {
        status: args
            .status
            .as_deref()
            .map(string_to_pull_request_status)
            .transpose()?,
        creator_id: args.creator_id.clone(),
        reviewer_id: args.reviewer_id.clone(),
        source_ref_name: args.source_ref_name.clone(),
        target_ref_name: args.target_ref_name.clone(),
        include_links: args.include_links,
    };

    api.get_pull_requests(&args.project_id, &args.repository_id, &criteria)
        .await
        .map_err(|e| e.in_operation("list pull requests"))
}

pub async fn list_pr_comments(
    api: &dyn PullRequestApi,
    args: &ListPrCommentsArgs,
) -> Result<Vec<ReconstructedComment>> {
    let threads = api
        .get_threads(&args.project_id, &args.repository_id, args.pull_request_id)
        .await
        .map_err(|e| e.in_operation("list PR comments"))?;

    let comments = process_pull_request_comments(&threads);
    debug!(
        threads = threads.len(),
        kept = comments.len(),
        "Reconstructed pull request comments"
    );
    Ok(comments)
}

pub async fn update_pr_comment(
    api: &dyn PullRequestApi,
    args: &UpdatePrCommentArgs,
) -> Result<CommentThread> {
    async {
        let update = CommentUpdate {
            content: args.content.clone(),
        };
        api.update_comment(
            &args.project_id,
            &args.repository_id,
            args.pull_request_id,
            args.thread_id,
            args.comment_id,
            &update,
        )
        .await?
        .ok_or_else(|| {
            Error::not_found("Comment", args.comment_id, format!("thread {}", args.thread_id))
        })?;

        reload_thread(
            api,
            &args.project_id,
            &args.repository_id,
            args.pull_request_id,
            args.thread_id,
        )
        .await
    }
    .await
    .map_err(|e| e.in_operation("update PR comment"))
}

pub async fn update_pr_thread_status(
    api: &dyn PullRequestApi,
    args: &UpdatePrThreadStatusArgs,
) -> Result<CommentThread> {
    let update = ThreadUpdate {
        status: string_to_thread_status(&args.status)?,
    };

    api.update_thread(
        &args.project_id,
        &args.repository_id,
        args.pull_request_id,
        args.thread_id,
        &update,
    )
    .await
    .map_err(|e| e.in_operation("update thread status"))?
    .ok_or_else(|| thread_not_found(args.thread_id, args.pull_request_id))
}

/// Thread anchoring for a new comment: a file path without a line anchors
/// at line 1, no file path means a PR-level comment.
fn new_thread_context(file_path: Option<&str>, line_number: Option<i64>) -> Option<ThreadContext> {
    file_path
        .filter(|path| !path.is_empty())
        .map(|path| ThreadContext::at_line(path, line_number.unwrap_or(1)))
}

pub async fn create_pr_comment(
    api: &dyn PullRequestApi,
    args: &CreatePrCommentArgs,
) -> Result<CommentThread> {
    async {
        let thread = NewCommentThread {
            comments: vec![NewComment {
                content: args.content.clone(),
                parent_comment_id: None,
                comment_type: None,
            }],
            thread_context: new_thread_context(args.file_path.as_deref(), args.line_number),
        };

        api.create_thread(
            &args.project_id,
            &args.repository_id,
            args.pull_request_id,
            &thread,
        )
        .await?
        .ok_or_else(|| Error::Other(anyhow!("Failed to create comment thread")))
    }
    .await
    .map_err(|e| e.in_operation("create PR comment"))
}

pub async fn reply_to_pr_comment(
    api: &dyn PullRequestApi,
    args: &ReplyToPrCommentArgs,
) -> Result<CommentThread> {
    async {
        let reply = NewComment {
            content: args.content.clone(),
            parent_comment_id: args.parent_comment_id,
            comment_type: Some(CommentType::Text),
        };

        api.create_comment(
            &args.project_id,
            &args.repository_id,
            args.pull_request_id,
            args.thread_id,
            &reply,
        )
        .await?
        .ok_or_else(|| Error::Other(anyhow!("Failed to create reply in thread")))?;

        reload_thread(
            api,
            &args.project_id,
            &args.repository_id,
            args.pull_request_id,
            args.thread_id,
        )
        .await
    }
    .await
    .map_err(|e| e.in_operation("create PR comment reply"))
}

pub async fn get_pr_files(
    api: &dyn PullRequestApi,
    args: &GetPrFilesArgs,
) -> Result<Vec<PullRequestChange>> {
    let compare_to = args.compare_to_iteration()?;

    async {
        let iterations = api
            .get_iterations(&args.project_id, &args.repository_id, args.pull_request_id)
            .await?;
        let Some(latest) = iterations.last() else {
            return Ok(Vec::new());
        };
        let iteration_id = latest
            .id
            .filter(|id| *id != 0)
            .ok_or_else(|| Error::Other(anyhow!("Latest iteration ID is missing")))?;

        let changes = api
            .get_iteration_changes(
                &args.project_id,
                &args.repository_id,
                args.pull_request_id,
                iteration_id,
                compare_to,
            )
            .await?;
        Ok::<_, Error>(changes.change_entries.unwrap_or_default())
    }
    .await
    .map_err(|e| e.in_operation("get PR files"))
}
