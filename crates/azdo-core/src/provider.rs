//! Seams between the tool layer and Azure DevOps.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Comment, CommentThread, CommentUpdate, GitPullRequest, IterationChanges, NewComment,
    NewCommentThread, PullRequestIteration, PullRequestSearchCriteria, ThreadUpdate,
};

/// Pull request endpoints of the Azure DevOps Git API.
///
/// Single-entity reads and writes return `Ok(None)` when the provider has no
/// such entity; deciding whether that is an error is left to the caller.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    async fn get_pull_request(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> Result<Option<GitPullRequest>>;

    async fn get_pull_requests(
        &self,
        project: &str,
        repository: &str,
        criteria: &PullRequestSearchCriteria,
    ) -> Result<Vec<GitPullRequest>>;

    async fn get_threads(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> Result<Vec<CommentThread>>;

    async fn get_thread(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
    ) -> Result<Option<CommentThread>>;

    async fn create_thread(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread: &NewCommentThread,
    ) -> Result<Option<CommentThread>>;

    async fn update_thread(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
        update: &ThreadUpdate,
    ) -> Result<Option<CommentThread>>;

    async fn create_comment(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
        comment: &NewComment,
    ) -> Result<Option<Comment>>;

    async fn update_comment(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
        comment_id: i64,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>>;

    async fn get_iterations(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> Result<Vec<PullRequestIteration>>;

    async fn get_iteration_changes(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        iteration_id: i64,
        compare_to: Option<i64>,
    ) -> Result<IterationChanges>;
}

/// Establishes an authenticated connection.
///
/// Called once per tool invocation; implementations must not cache the
/// returned handle between calls.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn PullRequestApi>>;
}
