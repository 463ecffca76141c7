//! Azure DevOps REST client implementation.

use async_trait::async_trait;
use azdo_core::config::DEFAULT_API_VERSION;
use azdo_core::{
    Comment, CommentThread, CommentUpdate, Error, GitPullRequest, IterationChanges, NewComment,
    NewCommentThread, PullRequestApi, PullRequestIteration, PullRequestSearchCriteria, Result,
    ThreadUpdate,
};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{ListResponse, TeamProjectReference};

/// Azure DevOps REST API client for one organization.
pub struct AzureDevOpsClient {
    organization_url: String,
    token: String,
    api_version: String,
    client: reqwest::Client,
}

impl AzureDevOpsClient {
    /// Create a client for an organization URL such as
    /// `https://dev.azure.com/contoso`.
    pub fn new(organization_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            organization_url: organization_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the `api-version` query parameter.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn organization_url(&self) -> &str {
        &self.organization_url
    }

    /// Build an organization-scoped URL from raw (unencoded) path segments.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.organization_url).map_err(|e| {
            Error::Config(format!(
                "Invalid organization URL '{}': {}",
                self.organization_url, e
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                Error::Config(format!(
                    "Organization URL cannot have a path: {}",
                    self.organization_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// URL under `{project}/_apis/git/repositories/{repository}/pullRequests/{id}`.
    fn pull_request_url(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        tail: &[&str],
    ) -> Result<Url> {
        let id = pull_request_id.to_string();
        let mut segments = vec![
            project,
            "_apis",
            "git",
            "repositories",
            repository,
            "pullRequests",
            id.as_str(),
        ];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    /// Build request with auth and api-version.
    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth("", Some(&self.token))
            .query(&[("api-version", self.api_version.as_str())])
    }

    /// Make an authenticated request and deserialize the response.
    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T> {
        debug!(method = %method, url = %url, "Azure DevOps request");

        let mut request = self.request(method, url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Like [`Self::send`], but a 404 becomes `Ok(None)`.
    async fn send_optional<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Option<T>> {
        match self.send(method, url, &[], body).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        self.send::<T, ()>(Method::GET, url, query, None).await
    }

    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        self.send_optional::<T, ()>(Method::GET, url, None).await
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let list: ListResponse<T> = self.get(url, query).await?;
        Ok(list.value)
    }

    /// Handle response and map errors.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        // Azure DevOps answers a rejected PAT on some routes with a 203 and
        // an HTML sign-in page instead of a 401.
        if status == StatusCode::NON_AUTHORITATIVE_INFORMATION {
            warn!("Azure DevOps returned a sign-in page");
            return Err(Error::Unauthorized(
                "credentials were not accepted (sign-in page returned)".to_string(),
            ));
        }

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Azure DevOps API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }

    /// Verify the organization URL and token with a cheap authenticated call.
    pub async fn check_connection(&self) -> Result<()> {
        let url = self.url(&["_apis", "projects"])?;
        let projects: Vec<TeamProjectReference> =
            self.get_list(url, &[("$top", "1".to_string())]).await?;
        debug!(
            organization = self.organization_url,
            sample_project = ?projects.first().and_then(|p| p.name.as_deref()),
            "Azure DevOps connection verified"
        );
        Ok(())
    }
}

/// Query parameters for `GET .../pullrequests`.
fn search_query(criteria: &PullRequestSearchCriteria) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();

    if let Some(status) = criteria.status {
        params.push(("searchCriteria.status", status.api_name().to_string()));
    }
    if let Some(creator) = &criteria.creator_id {
        params.push(("searchCriteria.creatorId", creator.clone()));
    }
    if let Some(reviewer) = &criteria.reviewer_id {
        params.push(("searchCriteria.reviewerId", reviewer.clone()));
    }
    if let Some(source) = &criteria.source_ref_name {
        params.push(("searchCriteria.sourceRefName", source.clone()));
    }
    if let Some(target) = &criteria.target_ref_name {
        params.push(("searchCriteria.targetRefName", target.clone()));
    }
    if let Some(include_links) = criteria.include_links {
        params.push(("searchCriteria.includeLinks", include_links.to_string()));
    }

    params
}

// =============================================================================
// Trait implementations
// =============================================================================

#[async_trait]
impl PullRequestApi for AzureDevOpsClient {
    async fn get_pull_request(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> Result<Option<GitPullRequest>> {
        let url = self.pull_request_url(project, repository, pull_request_id, &[])?;
        self.get_optional(url).await
    }

    async fn get_pull_requests(
        &self,
        project: &str,
        repository: &str,
        criteria: &PullRequestSearchCriteria,
    ) -> Result<Vec<GitPullRequest>> {
        let url = self.url(&[
            project,
            "_apis",
            "git",
            "repositories",
            repository,
            "pullrequests",
        ])?;
        self.get_list(url, &search_query(criteria)).await
    }

    async fn get_threads(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> Result<Vec<CommentThread>> {
        let url = self.pull_request_url(project, repository, pull_request_id, &["threads"])?;
        self.get_list(url, &[]).await
    }

    async fn get_thread(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
    ) -> Result<Option<CommentThread>> {
        let thread = thread_id.to_string();
        let url =
            self.pull_request_url(project, repository, pull_request_id, &["threads", &thread])?;
        self.get_optional(url).await
    }

    async fn create_thread(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread: &NewCommentThread,
    ) -> Result<Option<CommentThread>> {
        let url = self.pull_request_url(project, repository, pull_request_id, &["threads"])?;
        self.send_optional(Method::POST, url, Some(thread)).await
    }

    async fn update_thread(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
        update: &ThreadUpdate,
    ) -> Result<Option<CommentThread>> {
        let thread = thread_id.to_string();
        let url =
            self.pull_request_url(project, repository, pull_request_id, &["threads", &thread])?;
        self.send_optional(Method::PATCH, url, Some(update)).await
    }

    async fn create_comment(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
        comment: &NewComment,
    ) -> Result<Option<Comment>> {
        let thread = thread_id.to_string();
        let url = self.pull_request_url(
            project,
            repository,
            pull_request_id,
            &["threads", &thread, "comments"],
        )?;
        self.send_optional(Method::POST, url, Some(comment)).await
    }

    async fn update_comment(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        thread_id: i64,
        comment_id: i64,
        update: &CommentUpdate,
    ) -> Result<Option<Comment>> {
        let thread = thread_id.to_string();
        let comment = comment_id.to_string();
        let url = self.pull_request_url(
            project,
            repository,
            pull_request_id,
            &["threads", &thread, "comments", &comment],
        )?;
        self.send_optional(Method::PATCH, url, Some(update)).await
    }

    async fn get_iterations(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
    ) -> Result<Vec<PullRequestIteration>> {
        let url = self.pull_request_url(project, repository, pull_request_id, &["iterations"])?;
        self.get_list(url, &[]).await
    }

    async fn get_iteration_changes(
        &self,
        project: &str,
        repository: &str,
        pull_request_id: i64,
        iteration_id: i64,
        compare_to: Option<i64>,
    ) -> Result<IterationChanges> {
        let iteration = iteration_id.to_string();
        let url = self.pull_request_url(
            project,
            repository,
            pull_request_id,
            &["iterations", &iteration, "changes"],
        )?;
        let query: Vec<(&str, String)> = compare_to
            .map(|base| vec![("$compareTo", base.to_string())])
            .unwrap_or_default();
        self.get(url, &query).await
    }
}
