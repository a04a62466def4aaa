//! Port trait definitions.
//!
//! The domain defines *what* it needs from the outside world; infrastructure
//! crates define *how* to supply it. Three capability surfaces exist:
//!
//! - [`IssueTracker`]: the tracker REST surface (issues, comments, pull
//!   requests, branches, sub-issue relationships, CI dispatch).
//! - [`AgentExecutor`]: the opaque coding agent that edits code and pushes
//!   commits, invoked with a rendered prompt and a turn budget.
//! - [`PromptRenderer`]: pure template formatting; no decisions.
//!
//! Error types here are component-level; the cross-cutting refusal taxonomy
//! lives in [`crate::errors`].

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::{
    BranchName, Comment, Issue, IssueNumber, NewPullRequest, PullRequest, PullRequestNumber,
    SubIssueMetadata,
};

// ---------------------------------------------------------------------------
// Issue tracker port
// ---------------------------------------------------------------------------

/// Failure from the tracker capability surface.
///
/// [`TrackerError::NotFound`] is distinguished from every other failure so
/// callers can separate "the referenced resource does not exist" (an operator
/// configuration problem) from "the API is unavailable".
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The requested resource does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing resource, e.g. `"issue #101"`.
        resource: String,
    },

    /// The tracker rejected the request with a non-success status.
    #[error("tracker request '{operation}' failed with status {status}: {detail}")]
    Status {
        /// Name of the operation that failed.
        operation: &'static str,
        /// HTTP status code returned by the tracker.
        status: u16,
        /// Response body excerpt for operator diagnosis.
        detail: String,
    },

    /// The request never produced a tracker response.
    #[error("tracker request '{operation}' failed in transport")]
    Transport {
        /// Name of the operation that failed.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TrackerError {
    /// Returns `true` for [`TrackerError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Tracker capability surface required by the orchestration domain.
///
/// Implementations perform sequential awaits only; there is no batching and
/// no retry loop at this layer of the system.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetches an issue snapshot (title, body, author, labels, state).
    async fn get_issue(&self, issue: IssueNumber) -> Result<Issue, TrackerError>;

    /// Lists every comment on an issue, oldest first, across all pages.
    async fn list_comments(&self, issue: IssueNumber) -> Result<Vec<Comment>, TrackerError>;

    /// Appends a comment to an issue.
    async fn post_comment(&self, issue: IssueNumber, body: &str) -> Result<(), TrackerError>;

    /// Returns whether `branch` exists on the remote.
    async fn branch_exists(&self, branch: &BranchName) -> Result<bool, TrackerError>;

    /// Finds the open pull request whose head is `head`, if one exists.
    ///
    /// Only open pull requests are considered; a closed or merged one must
    /// not be mistaken for in-flight work.
    async fn find_open_pull_request(
        &self,
        head: &BranchName,
        base: &str,
    ) -> Result<Option<PullRequest>, TrackerError>;

    /// Creates a pull request (draft or regular).
    async fn create_pull_request(
        &self,
        request: &NewPullRequest,
    ) -> Result<PullRequest, TrackerError>;

    /// Adds labels to a pull request.
    async fn add_labels(
        &self,
        pull_request: PullRequestNumber,
        labels: &[String],
    ) -> Result<(), TrackerError>;

    /// Adds assignees to a pull request.
    async fn add_assignees(
        &self,
        pull_request: PullRequestNumber,
        assignees: &[String],
    ) -> Result<(), TrackerError>;

    /// Registers `child` as a native sub-issue of `parent`.
    async fn link_sub_issue(
        &self,
        parent: IssueNumber,
        child: IssueNumber,
    ) -> Result<(), TrackerError>;

    /// Triggers a CI workflow run for `branch`.
    async fn dispatch_workflow(
        &self,
        workflow: &str,
        branch: &BranchName,
    ) -> Result<(), TrackerError>;
}

// ---------------------------------------------------------------------------
// Agent executor port
// ---------------------------------------------------------------------------

/// Work order handed to the external coding agent.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    /// Fully rendered prompt text.
    pub prompt: String,
    /// Tool identifiers the agent may use.
    pub allowed_tools: Vec<String>,
    /// Maximum number of agent turns for this run.
    pub max_turns: u32,
}

/// What the agent run reported back.
///
/// A run that started but did not complete its work is `completed: false`;
/// the rescue pass decides what to do with whatever was pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Whether the agent reported successful completion.
    pub completed: bool,
    /// Agent-provided detail, e.g. its final message or exit description.
    pub detail: String,
}

/// Failure to run the agent at all (as opposed to the agent running and
/// reporting failure, which is an [`ExecutionReport`]).
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The agent process could not be started.
    #[error("failed to launch agent '{command}'")]
    Launch {
        /// The command that failed to start.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The agent process could not be driven to completion.
    #[error("agent run did not complete: {detail}")]
    Aborted {
        /// Description of what interrupted the run.
        detail: String,
    },
}

/// The opaque executor that implements plans.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Runs the agent with the given work order and waits for it to finish.
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionReport, ExecutorError>;
}

// ---------------------------------------------------------------------------
// Prompt renderer port
// ---------------------------------------------------------------------------

/// Template inputs for a plan-mode prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PlanPromptContext {
    /// Issue number being planned.
    pub issue_number: u64,
    /// Issue title.
    pub issue_title: String,
    /// Issue body.
    pub issue_body: String,
    /// Decomposition metadata when the issue is itself a sub-issue.
    pub sub_issue: Option<SubIssueMetadata>,
}

/// Template inputs for an execute-mode prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutePromptContext {
    /// Issue number being implemented.
    pub issue_number: u64,
    /// Issue title.
    pub issue_title: String,
    /// The approved plan text.
    pub plan: String,
    /// Working branch for the implementation.
    pub branch: String,
    /// Base branch the eventual pull request targets.
    pub base_branch: String,
    /// Turn by which the agent must have pushed and opened a pull request.
    pub push_deadline: u32,
    /// Decomposition metadata when the issue is a sub-issue.
    pub sub_issue: Option<SubIssueMetadata>,
    /// Whether a repository rules file exists and must be followed.
    pub rules_present: bool,
}

/// Failure to render a prompt template.
#[derive(Debug, Error)]
#[error("prompt template '{template}' failed to render: {detail}")]
pub struct RenderError {
    /// Name of the template that failed.
    pub template: &'static str,
    /// Renderer-provided failure detail.
    pub detail: String,
}

/// Pure prompt formatting. Implementations make no decisions and perform no I/O.
pub trait PromptRenderer: Send + Sync {
    /// Renders the plan-mode prompt.
    fn render_plan(&self, context: &PlanPromptContext) -> Result<String, RenderError>;

    /// Renders the execute-mode prompt.
    fn render_execute(&self, context: &ExecutePromptContext) -> Result<String, RenderError>;
}
