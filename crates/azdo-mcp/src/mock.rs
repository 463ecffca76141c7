//! Test doubles for the Azure DevOps seams.

use std::sync::Arc;

use async_trait::async_trait;
use azdo_core::{
    Comment, CommentThread, CommentUpdate, Connector, Error, GitPullRequest, IterationChanges,
    NewComment, NewCommentThread, PullRequestApi, PullRequestIteration, PullRequestSearchCriteria,
    Result, ThreadUpdate,
};
use mockall::mock;

mock! {
    pub Api {}

    #[async_trait]
    impl PullRequestApi for Api {
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
}

/// Connector that hands out a fixed API handle, or fails like a rejected
/// credential check.
pub struct StaticConnector {
    api: Option<Arc<dyn PullRequestApi>>,
}

impl StaticConnector {
    pub fn new(api: MockApi) -> Self {
        Self {
            api: Some(Arc::new(api)),
        }
    }

    pub fn failing() -> Self {
        Self { api: None }
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn connect(&self) -> Result<Arc<dyn PullRequestApi>> {
        self.api.clone().ok_or_else(|| {
            Error::Authentication(
                "Failed to authenticate with Azure DevOps: Unauthorized: TF400813".to_string(),
            )
        })
    }
}

/// Thread as the REST API returns it, with the given comments as
/// `(id, parentCommentId, content)`.
pub fn rest_thread(id: i64, file_path: &str, comments: &[(i64, i64, &str)]) -> CommentThread {
    let comments: Vec<serde_json::Value> = comments
        .iter()
        .map(|(id, parent, content)| {
            serde_json::json!({
                "id": id,
                "parentCommentId": parent,
                "content": content,
                "author": {"displayName": "Reviewer"}
            })
        })
        .collect();

    serde_json::from_value(serde_json::json!({
        "id": id,
        "status": "active",
        "threadContext": {
            "filePath": file_path,
            "rightFileStart": {"line": 4, "offset": 1},
            "rightFileEnd": {"line": 4, "offset": 9}
        },
        "comments": comments
    }))
    .unwrap()
}
