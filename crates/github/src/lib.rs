//! Leonidas GitHub infrastructure adapter.
//!
//! Implements the [`workflow::ports::IssueTracker`] port over the GitHub REST
//! API with a plain [`reqwest`] client.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. HTTP
//! transport, pagination, authentication headers, and wire-format mapping all
//! live here; the [`workflow`] crate sees only the port trait and
//! [`TrackerError`]. There is deliberately no retry loop: a failed required
//! read or write propagates as fatal, and the host re-triggers the run if it
//! wants another attempt.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use workflow::ports::{IssueTracker, TrackerError};
use workflow::{
    BranchName, Comment, Issue, IssueNumber, IssueState, NewPullRequest, PullRequest,
    PullRequestNumber, RepositoryId,
};

/// Public GitHub REST endpoint. Overridable for enterprise hosts and tests.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure to construct a [`GithubClient`].
#[derive(Debug, Error)]
pub enum GithubClientError {
    /// The repository identifier is not in `owner/repo` form.
    #[error("repository must be in owner/repo format, got '{value}'")]
    MalformedRepository {
        /// The rejected value.
        value: String,
    },

    /// The token cannot be carried in an HTTP header.
    #[error("authorization token is not a valid header value")]
    InvalidToken(#[source] reqwest::header::InvalidHeaderValue),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

/// GitHub REST client bound to one repository.
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
}

impl GithubClient {
    /// Creates a client for `repository`, authenticating every request with
    /// `token`.
    ///
    /// `api_base` is [`DEFAULT_API_BASE`] in production; tests and enterprise
    /// deployments point it elsewhere.
    pub fn new(
        api_base: impl Into<String>,
        token: &str,
        repository: &RepositoryId,
    ) -> Result<Self, GithubClientError> {
        let Some((owner, repo)) = repository.split() else {
            return Err(GithubClientError::MalformedRepository {
                value: repository.to_string(),
            });
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("leonidas"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        let auth = format!("Bearer {}", token.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(GithubClientError::InvalidToken)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(GithubClientError::ClientBuild)?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{path}", self.api_base, self.owner, self.repo)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, TrackerError> {
        request.send().await.map_err(|err| TrackerError::Transport {
            operation,
            source: Box::new(err),
        })
    }

    async fn parse<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, TrackerError> {
        response
            .json::<T>()
            .await
            .map_err(|err| TrackerError::Transport {
                operation,
                source: Box::new(err),
            })
    }

    async fn status_error(operation: &'static str, response: reqwest::Response) -> TrackerError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        TrackerError::Status {
            operation,
            status,
            detail: body.chars().take(600).collect(),
        }
    }

    async fn get_issue_raw(&self, issue: IssueNumber) -> Result<IssueResponse, TrackerError> {
        const OPERATION: &str = "get issue";
        let response = self
            .send(
                OPERATION,
                self.http.get(self.url(&format!("/issues/{issue}"))),
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound {
                resource: format!("issue #{issue}"),
            });
        }
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        Self::parse(OPERATION, response).await
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn get_issue(&self, issue: IssueNumber) -> Result<Issue, TrackerError> {
        self.get_issue_raw(issue)
            .await
            .map(IssueResponse::into_issue)
    }

    async fn list_comments(&self, issue: IssueNumber) -> Result<Vec<Comment>, TrackerError> {
        const OPERATION: &str = "list comments";
        let mut comments = Vec::new();
        let mut page = 1u32;
        loop {
            let request = self
                .http
                .get(self.url(&format!("/issues/{issue}/comments")))
                .query(&[
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ]);
            let response = self.send(OPERATION, request).await?;
            if !response.status().is_success() {
                return Err(Self::status_error(OPERATION, response).await);
            }
            let chunk: Vec<CommentResponse> = Self::parse(OPERATION, response).await?;
            let chunk_len = chunk.len();
            comments.extend(chunk.into_iter().map(CommentResponse::into_comment));
            if chunk_len < PER_PAGE {
                break;
            }
            page += 1;
        }
        debug!(issue = %issue, count = comments.len(), "comments fetched");
        Ok(comments)
    }

    async fn post_comment(&self, issue: IssueNumber, body: &str) -> Result<(), TrackerError> {
        const OPERATION: &str = "post comment";
        let request = self
            .http
            .post(self.url(&format!("/issues/{issue}/comments")))
            .json(&json!({ "body": body }));
        let response = self.send(OPERATION, request).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        Ok(())
    }

    async fn branch_exists(&self, branch: &BranchName) -> Result<bool, TrackerError> {
        const OPERATION: &str = "check branch";
        let request = self
            .http
            .get(self.url(&format!("/git/ref/heads/{}", branch.as_str())));
        let response = self.send(OPERATION, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        Ok(true)
    }

    async fn find_open_pull_request(
        &self,
        head: &BranchName,
        base: &str,
    ) -> Result<Option<PullRequest>, TrackerError> {
        const OPERATION: &str = "find pull request";
        let head_filter = format!("{}:{}", self.owner, head.as_str());
        let request = self.http.get(self.url("/pulls")).query(&[
            ("state", "open"),
            ("head", head_filter.as_str()),
            ("base", base),
        ]);
        let response = self.send(OPERATION, request).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        let pulls: Vec<PullResponse> = Self::parse(OPERATION, response).await?;
        Ok(pulls.into_iter().next().map(PullResponse::into_pull_request))
    }

    async fn create_pull_request(&self, new: &NewPullRequest) -> Result<PullRequest, TrackerError> {
        const OPERATION: &str = "create pull request";
        let request = self.http.post(self.url("/pulls")).json(&json!({
            "title": new.title,
            "body": new.body,
            "head": new.head.as_str(),
            "base": new.base,
            "draft": new.draft,
        }));
        let response = self.send(OPERATION, request).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        let created: PullResponse = Self::parse(OPERATION, response).await?;
        Ok(created.into_pull_request())
    }

    async fn add_labels(
        &self,
        pull_request: PullRequestNumber,
        labels: &[String],
    ) -> Result<(), TrackerError> {
        const OPERATION: &str = "add labels";
        let request = self
            .http
            .post(self.url(&format!("/issues/{pull_request}/labels")))
            .json(&json!({ "labels": labels }));
        let response = self.send(OPERATION, request).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        Ok(())
    }

    async fn add_assignees(
        &self,
        pull_request: PullRequestNumber,
        assignees: &[String],
    ) -> Result<(), TrackerError> {
        const OPERATION: &str = "add assignees";
        let request = self
            .http
            .post(self.url(&format!("/issues/{pull_request}/assignees")))
            .json(&json!({ "assignees": assignees }));
        let response = self.send(OPERATION, request).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        Ok(())
    }

    async fn link_sub_issue(
        &self,
        parent: IssueNumber,
        child: IssueNumber,
    ) -> Result<(), TrackerError> {
        const OPERATION: &str = "link sub-issue";
        // The sub-issue endpoint takes the child's internal id, not its
        // number, so resolve it first.
        let child_raw = self.get_issue_raw(child).await?;
        let request = self
            .http
            .post(self.url(&format!("/issues/{parent}/sub_issues")))
            .json(&json!({ "sub_issue_id": child_raw.id }));
        let response = self.send(OPERATION, request).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        Ok(())
    }

    async fn dispatch_workflow(
        &self,
        workflow_file: &str,
        branch: &BranchName,
    ) -> Result<(), TrackerError> {
        const OPERATION: &str = "dispatch workflow";
        let request = self
            .http
            .post(self.url(&format!("/actions/workflows/{workflow_file}/dispatches")))
            .json(&json!({ "ref": branch.as_str() }));
        let response = self.send(OPERATION, request).await?;
        if !response.status().is_success() {
            return Err(Self::status_error(OPERATION, response).await);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    id: u64,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<LabelResponse>,
    user: UserResponse,
    state: String,
}

impl IssueResponse {
    fn into_issue(self) -> Issue {
        let state = if self.state == "closed" {
            IssueState::Closed
        } else {
            IssueState::Open
        };
        Issue {
            number: IssueNumber::new(self.number),
            title: self.title,
            body: self.body.unwrap_or_default(),
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            author: self.user.login,
            state,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    #[serde(default)]
    body: Option<String>,
    user: UserResponse,
    created_at: DateTime<Utc>,
}

impl CommentResponse {
    fn into_comment(self) -> Comment {
        Comment {
            author: self.user.login,
            body: self.body.unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
    #[serde(default)]
    draft: bool,
}

impl PullResponse {
    fn into_pull_request(self) -> PullRequest {
        PullRequest {
            number: PullRequestNumber::new(self.number),
            url: self.html_url,
            draft: self.draft,
        }
    }
}
