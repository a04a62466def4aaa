//! Rescue and pull-request post-processing.
//!
//! Rescue is the post-hoc reconciliation pass after an execution attempt
//! ends. It never re-runs the agent: it only looks at what the run left
//! behind (the conventionally-named branch and any open pull request for it)
//! and makes sure pushed work cannot be lost. The same branch-naming
//! convention used at dispatch time is the only correlation key.

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::markers::parse_parent_marker;
use crate::messages::{self, Language};
use crate::ports::IssueTracker;
use crate::{BranchName, Issue, IssueNumber, NewPullRequest, PullRequest, WorkflowError};

/// What the rescue pass found and did.
#[derive(Debug, Clone, PartialEq)]
pub enum RescueOutcome {
    /// The working branch does not exist; there is nothing to rescue.
    NothingToRescue,
    /// An open pull request already carries the partial work.
    ExistingPullRequest(PullRequest),
    /// A draft pull request was created to preserve the pushed work.
    DraftCreated(PullRequest),
    /// Draft creation failed; the failure was logged and swallowed.
    ///
    /// Rescue is best-effort — the process must not crash solely because
    /// rescue failed — but no success comment is posted either.
    DraftCreationFailed,
}

/// Reconciles an issue's branch and pull-request state after a run.
pub struct RescueController<'a> {
    tracker: &'a dyn IssueTracker,
    config: &'a Config,
    language: Language,
}

impl<'a> RescueController<'a> {
    /// Creates a rescue controller over the injected tracker surface.
    pub fn new(tracker: &'a dyn IssueTracker, config: &'a Config) -> Self {
        let language = Language::from_selector(&config.language);
        Self {
            tracker,
            config,
            language,
        }
    }

    /// Runs one rescue pass for `issue_number`.
    ///
    /// `run_url` links the host's log page for the interrupted run and is
    /// included in the draft pull request body.
    #[instrument(skip(self, issue_number), fields(issue = %issue_number))]
    pub async fn run(
        &self,
        issue_number: IssueNumber,
        run_url: &str,
    ) -> Result<RescueOutcome, WorkflowError> {
        let branch = BranchName::for_issue(&self.config.branch_prefix, issue_number);

        if !self.tracker.branch_exists(&branch).await? {
            info!(branch = %branch, "branch absent, nothing to rescue");
            return Ok(RescueOutcome::NothingToRescue);
        }

        // Only an *open* pull request counts as in-flight work; a closed or
        // merged one for the same branch belongs to an earlier life of the
        // issue.
        if let Some(existing) = self
            .tracker
            .find_open_pull_request(&branch, &self.config.base_branch)
            .await?
        {
            self.tracker
                .post_comment(
                    issue_number,
                    &messages::partial_progress(self.language, &existing.url),
                )
                .await?;
            return Ok(RescueOutcome::ExistingPullRequest(existing));
        }

        let issue = self.tracker.get_issue(issue_number).await?;
        let request = draft_rescue_request(&issue, branch, &self.config.base_branch, run_url);

        match self.tracker.create_pull_request(&request).await {
            Ok(created) => {
                self.tracker
                    .post_comment(
                        issue_number,
                        &messages::rescue_draft_created(self.language, &created.url),
                    )
                    .await?;
                Ok(RescueOutcome::DraftCreated(created))
            }
            Err(err) => {
                warn!(issue = %issue_number, error = %err, "draft rescue creation failed");
                Ok(RescueOutcome::DraftCreationFailed)
            }
        }
    }
}

/// Builds the draft pull request that preserves an interrupted run's work.
///
/// The title leads with the parent reference when the issue body carries a
/// parent marker (rescue reuses only that marker — the order marker may be
/// absent), otherwise with the issue's own number, and is suffixed
/// `[partial]` so reviewers can tell it apart from a completed change.
fn draft_rescue_request(
    issue: &Issue,
    branch: BranchName,
    base_branch: &str,
    run_url: &str,
) -> NewPullRequest {
    let parent = parse_parent_marker(&issue.body);

    let lead = match parent {
        Some(parent) => format!("#{parent}"),
        None => format!("#{}", issue.number),
    };
    let title = format!("{lead} {} [partial]", issue.title);

    let mut body = String::new();
    if let Some(parent) = parent {
        body.push_str(&format!("Part of #{parent}\n"));
    }
    body.push_str(&format!("Closes #{}\n\n", issue.number));
    body.push_str(
        "Opened automatically to preserve work pushed by an interrupted run.\n",
    );
    body.push_str(&format!("Run log: {run_url}\n"));

    NewPullRequest {
        title,
        body,
        head: branch,
        base: base_branch.to_string(),
        draft: true,
    }
}

/// Post-processing after a normal successful completion.
///
/// Copies the issue's non-automation labels onto the pull request, assigns
/// the pull request to the issue's original author, and dispatches the
/// configured CI workflow for the branch. Each step is an enhancement, not
/// correctness-critical: failures are logged and swallowed independently so
/// one missing permission does not block the others.
pub async fn finalize_pull_request(
    tracker: &dyn IssueTracker,
    issue: &Issue,
    pull_request: &PullRequest,
    branch: &BranchName,
    config: &Config,
) {
    let labels: Vec<String> = issue
        .labels
        .iter()
        .filter(|label| !label.starts_with(&config.automation_label_prefix))
        .cloned()
        .collect();
    if !labels.is_empty() {
        if let Err(err) = tracker.add_labels(pull_request.number, &labels).await {
            warn!(pr = %pull_request.number, error = %err, "label copy failed");
        }
    }

    if let Err(err) = tracker
        .add_assignees(pull_request.number, &[issue.author.clone()])
        .await
    {
        warn!(pr = %pull_request.number, error = %err, "assignee update failed");
    }

    if let Some(workflow) = &config.ci_workflow {
        if let Err(err) = tracker.dispatch_workflow(workflow, branch).await {
            warn!(workflow, branch = %branch, error = %err, "CI dispatch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IssueState, PullRequestNumber};

    fn issue(number: u64, body: &str) -> Issue {
        Issue {
            number: IssueNumber::new(number),
            title: "Add retry logic".to_string(),
            body: body.to_string(),
            labels: vec![],
            author: "octocat".to_string(),
            state: IssueState::Open,
        }
    }

    #[test]
    fn draft_title_leads_with_parent_when_resolvable() {
        let issue = issue(42, "<!-- leonidas-parent: #10 -->");
        let branch = BranchName::for_issue("prefix-", IssueNumber::new(42));
        let request = draft_rescue_request(&issue, branch, "main", "https://ci/run/1");

        assert_eq!(request.title, "#10 Add retry logic [partial]");
        assert!(request.body.contains("Part of #10"));
        assert!(request.body.contains("Closes #42"));
        assert!(request.body.contains("https://ci/run/1"));
        assert!(request.draft);
    }

    #[test]
    fn draft_title_falls_back_to_the_issue_itself() {
        let issue = issue(42, "no markers here");
        let branch = BranchName::for_issue("prefix-", IssueNumber::new(42));
        let request = draft_rescue_request(&issue, branch, "main", "https://ci/run/1");

        assert_eq!(request.title, "#42 Add retry logic [partial]");
        assert!(!request.body.contains("Part of"));
        assert!(request.body.contains("Closes #42"));
    }

    #[test]
    fn rescue_outcome_carries_the_pull_request() {
        let pr = PullRequest {
            number: PullRequestNumber::new(7),
            url: "https://tracker/pr/7".to_string(),
            draft: true,
        };
        assert_eq!(
            RescueOutcome::DraftCreated(pr.clone()),
            RescueOutcome::DraftCreated(pr)
        );
    }
}
