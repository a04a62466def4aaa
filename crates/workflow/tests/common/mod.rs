// Each integration-test binary compiles this module independently, so any
// helper a given binary does not touch would otherwise warn.
#![allow(dead_code)]

//! In-memory fakes for the port traits.
//!
//! The fakes record every side effect so tests can assert on the posted
//! comments, created pull requests, and dispatched agent runs of a whole
//! invocation without any transport in the way.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use workflow::ports::{
    AgentExecutor, ExecutePromptContext, ExecutionReport, ExecutionRequest, ExecutorError,
    IssueTracker, PlanPromptContext, PromptRenderer, RenderError, TrackerError,
};
use workflow::{
    BranchName, Comment, Issue, IssueNumber, IssueState, NewPullRequest, PullRequest,
    PullRequestNumber,
};

// ---------------------------------------------------------------------------
// Tracker fake
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeTracker {
    issues: Mutex<HashMap<u64, Issue>>,
    comments: Mutex<HashMap<u64, Vec<Comment>>>,
    branches: Mutex<HashSet<String>>,
    open_pulls: Mutex<HashMap<String, PullRequest>>,
    fail_sub_issue_links_to: Mutex<HashSet<u64>>,
    fail_pull_request_creation: AtomicBool,
    fail_label_updates: AtomicBool,
    next_pull_number: AtomicU64,

    pub posted: Mutex<Vec<(u64, String)>>,
    pub created_pulls: Mutex<Vec<NewPullRequest>>,
    pub labels_added: Mutex<Vec<(u64, Vec<String>)>>,
    pub assignees_added: Mutex<Vec<(u64, Vec<String>)>>,
    pub linked: Mutex<Vec<(u64, u64)>>,
    pub dispatched: Mutex<Vec<(String, String)>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        let tracker = Self::default();
        tracker.next_pull_number.store(500, Ordering::SeqCst);
        tracker
    }

    pub fn with_issue(self, number: u64, title: &str, body: &str, state: IssueState) -> Self {
        self.add_issue(Issue {
            number: IssueNumber::new(number),
            title: title.to_string(),
            body: body.to_string(),
            labels: vec![],
            author: "octocat".to_string(),
            state,
        });
        self
    }

    pub fn add_issue(&self, issue: Issue) {
        self.issues
            .lock()
            .unwrap()
            .insert(issue.number.as_u64(), issue);
    }

    /// Appends a comment; creation times increase with insertion order.
    pub fn add_comment(&self, issue: u64, author: &str, body: &str) {
        let mut comments = self.comments.lock().unwrap();
        let stream = comments.entry(issue).or_default();
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        stream.push(Comment {
            author: author.to_string(),
            body: body.to_string(),
            created_at: base + Duration::minutes(stream.len() as i64),
        });
    }

    pub fn add_branch(&self, branch: &str) {
        self.branches.lock().unwrap().insert(branch.to_string());
    }

    pub fn add_open_pull(&self, head: &str, number: u64, url: &str) {
        self.open_pulls.lock().unwrap().insert(
            head.to_string(),
            PullRequest {
                number: PullRequestNumber::new(number),
                url: url.to_string(),
                draft: false,
            },
        );
    }

    pub fn fail_sub_issue_link_to(&self, child: u64) {
        self.fail_sub_issue_links_to.lock().unwrap().insert(child);
    }

    pub fn fail_pull_request_creation(&self) {
        self.fail_pull_request_creation.store(true, Ordering::SeqCst);
    }

    pub fn fail_label_updates(&self) {
        self.fail_label_updates.store(true, Ordering::SeqCst);
    }

    pub fn comments_posted_to(&self, issue: u64) -> Vec<String> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .filter(|(number, _)| *number == issue)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn get_issue(&self, issue: IssueNumber) -> Result<Issue, TrackerError> {
        self.issues
            .lock()
            .unwrap()
            .get(&issue.as_u64())
            .cloned()
            .ok_or_else(|| TrackerError::NotFound {
                resource: format!("issue #{issue}"),
            })
    }

    async fn list_comments(&self, issue: IssueNumber) -> Result<Vec<Comment>, TrackerError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(&issue.as_u64())
            .cloned()
            .unwrap_or_default())
    }

    async fn post_comment(&self, issue: IssueNumber, body: &str) -> Result<(), TrackerError> {
        self.posted
            .lock()
            .unwrap()
            .push((issue.as_u64(), body.to_string()));
        Ok(())
    }

    async fn branch_exists(&self, branch: &BranchName) -> Result<bool, TrackerError> {
        Ok(self.branches.lock().unwrap().contains(branch.as_str()))
    }

    async fn find_open_pull_request(
        &self,
        head: &BranchName,
        _base: &str,
    ) -> Result<Option<PullRequest>, TrackerError> {
        Ok(self.open_pulls.lock().unwrap().get(head.as_str()).cloned())
    }

    async fn create_pull_request(
        &self,
        request: &NewPullRequest,
    ) -> Result<PullRequest, TrackerError> {
        if self.fail_pull_request_creation.load(Ordering::SeqCst) {
            return Err(TrackerError::Status {
                operation: "create pull request",
                status: 422,
                detail: "no commits between branches".to_string(),
            });
        }
        let number = self.next_pull_number.fetch_add(1, Ordering::SeqCst);
        let created = PullRequest {
            number: PullRequestNumber::new(number),
            url: format!("https://tracker.test/pull/{number}"),
            draft: request.draft,
        };
        self.created_pulls.lock().unwrap().push(request.clone());
        self.open_pulls
            .lock()
            .unwrap()
            .insert(request.head.as_str().to_string(), created.clone());
        Ok(created)
    }

    async fn add_labels(
        &self,
        pull_request: PullRequestNumber,
        labels: &[String],
    ) -> Result<(), TrackerError> {
        if self.fail_label_updates.load(Ordering::SeqCst) {
            return Err(TrackerError::Status {
                operation: "add labels",
                status: 403,
                detail: "forbidden".to_string(),
            });
        }
        self.labels_added
            .lock()
            .unwrap()
            .push((pull_request.as_u64(), labels.to_vec()));
        Ok(())
    }

    async fn add_assignees(
        &self,
        pull_request: PullRequestNumber,
        assignees: &[String],
    ) -> Result<(), TrackerError> {
        self.assignees_added
            .lock()
            .unwrap()
            .push((pull_request.as_u64(), assignees.to_vec()));
        Ok(())
    }

    async fn link_sub_issue(
        &self,
        parent: IssueNumber,
        child: IssueNumber,
    ) -> Result<(), TrackerError> {
        if self
            .fail_sub_issue_links_to
            .lock()
            .unwrap()
            .contains(&child.as_u64())
        {
            return Err(TrackerError::Status {
                operation: "link sub-issue",
                status: 422,
                detail: "cannot link".to_string(),
            });
        }
        self.linked
            .lock()
            .unwrap()
            .push((parent.as_u64(), child.as_u64()));
        Ok(())
    }

    async fn dispatch_workflow(
        &self,
        workflow: &str,
        branch: &BranchName,
    ) -> Result<(), TrackerError> {
        self.dispatched
            .lock()
            .unwrap()
            .push((workflow.to_string(), branch.as_str().to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Executor fake
// ---------------------------------------------------------------------------

pub struct FakeExecutor {
    completed: bool,
    pub requests: Mutex<Vec<ExecutionRequest>>,
}

impl FakeExecutor {
    pub fn completing() -> Self {
        Self {
            completed: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn interrupted() -> Self {
        Self {
            completed: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn only_request(&self) -> ExecutionRequest {
        let requests = self.requests.lock().unwrap();
        assert_eq!(requests.len(), 1, "expected exactly one agent dispatch");
        requests[0].clone()
    }
}

#[async_trait]
impl AgentExecutor for FakeExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionReport, ExecutorError> {
        self.requests.lock().unwrap().push(request);
        Ok(ExecutionReport {
            completed: self.completed,
            detail: String::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Renderer fake
// ---------------------------------------------------------------------------

/// Deterministic renderer: the output embeds the decision-relevant context so
/// tests can assert the controller passed the right values through.
pub struct FakeRenderer;

impl PromptRenderer for FakeRenderer {
    fn render_plan(&self, context: &PlanPromptContext) -> Result<String, RenderError> {
        Ok(format!(
            "plan issue={} sub_issue={}",
            context.issue_number,
            context.sub_issue.is_some()
        ))
    }

    fn render_execute(&self, context: &ExecutePromptContext) -> Result<String, RenderError> {
        Ok(format!(
            "execute issue={} branch={} deadline={} rules={} plan<<{}>>",
            context.issue_number,
            context.branch,
            context.push_deadline,
            context.rules_present,
            context.plan
        ))
    }
}
