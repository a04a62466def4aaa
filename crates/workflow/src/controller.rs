//! Phase controller: the top-level decision procedure for one invocation.
//!
//! Every trigger (issue labelled, approval comment, scheduled reconciliation)
//! spawns one independent process run. The controller starts from a clean
//! state, consults the plan store and the gates, and emits exactly one
//! terminal outcome: a dispatched agent run, or a refusal that has posted an
//! explanatory comment and maps to a distinct non-zero exit.
//!
//! Refusals are double-channel by design — the comment keeps the issue
//! thread authoritative for end users, the error keeps the process exit
//! legible for operators — so both sides are written before the controller
//! returns.

use tracing::{info, instrument};

use crate::budget::{PLAN_TURN_LIMIT, TurnBudget};
use crate::config::Config;
use crate::gates::{check_authorization, check_dependency, AuthorizationDecision, DependencyDecision};
use crate::linker::link_sub_issues;
use crate::markers::{extract_child_issues, is_decomposed_plan, parse_sub_issue_metadata};
use crate::messages::{self, Language};
use crate::plan::PlanStore;
use crate::ports::{
    AgentExecutor, ExecutionReport, ExecutionRequest, ExecutePromptContext, IssueTracker,
    PlanPromptContext, PromptRenderer,
};
use crate::{Association, BranchName, IssueNumber, WorkflowError};

/// Which phase a trigger requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Produce an implementation plan comment. No gating: the output is only
    /// a proposal, never an action, so any actor may trigger it.
    Plan,
    /// Implement an approved plan. Fully gated.
    Execute,
}

/// Terminal success of one invocation: the agent ran.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Working branch for the issue.
    pub branch: BranchName,
    /// What the agent reported.
    pub report: ExecutionReport,
}

/// Drives one plan-mode or execute-mode invocation.
pub struct PhaseController<'a> {
    tracker: &'a dyn IssueTracker,
    executor: &'a dyn AgentExecutor,
    renderer: &'a dyn PromptRenderer,
    config: &'a Config,
    language: Language,
}

impl<'a> PhaseController<'a> {
    /// Creates a controller over the injected capability surfaces.
    ///
    /// `config` must have passed [`Config::validate`].
    pub fn new(
        tracker: &'a dyn IssueTracker,
        executor: &'a dyn AgentExecutor,
        renderer: &'a dyn PromptRenderer,
        config: &'a Config,
    ) -> Self {
        let language = Language::from_selector(&config.language);
        Self {
            tracker,
            executor,
            renderer,
            config,
            language,
        }
    }

    /// Runs one invocation.
    ///
    /// `actor` is the association of whoever triggered the event;
    /// `rules_present` reports whether the repository rules file exists in
    /// the checkout (the composition root owns that filesystem check).
    #[instrument(skip(self, issue_number), fields(issue = %issue_number))]
    pub async fn run(
        &self,
        mode: Mode,
        issue_number: IssueNumber,
        actor: Association,
        rules_present: bool,
    ) -> Result<RunOutcome, WorkflowError> {
        match mode {
            Mode::Plan => self.run_plan(issue_number).await,
            Mode::Execute => self.run_execute(issue_number, actor, rules_present).await,
        }
    }

    async fn run_plan(&self, issue_number: IssueNumber) -> Result<RunOutcome, WorkflowError> {
        let issue = self.tracker.get_issue(issue_number).await?;
        let sub_issue = parse_sub_issue_metadata(&issue.body);

        let prompt = self.renderer.render_plan(&PlanPromptContext {
            issue_number: issue_number.as_u64(),
            issue_title: issue.title,
            issue_body: issue.body,
            sub_issue,
        })?;

        info!(turns = PLAN_TURN_LIMIT, "dispatching plan run");
        let report = self
            .executor
            .execute(ExecutionRequest {
                prompt,
                allowed_tools: self.config.allowed_tools.clone(),
                max_turns: PLAN_TURN_LIMIT,
            })
            .await?;

        // If planning decomposed the issue, mirror the checklist into native
        // sub-issue relationships. Best-effort: the body markers on the
        // children stay authoritative regardless.
        if report.completed {
            self.register_decomposition(issue_number).await?;
        }

        Ok(RunOutcome {
            branch: BranchName::for_issue(&self.config.branch_prefix, issue_number),
            report,
        })
    }

    async fn register_decomposition(
        &self,
        issue_number: IssueNumber,
    ) -> Result<(), WorkflowError> {
        let store = PlanStore::new(self.tracker, &self.config.trusted_bots);
        let Some(plan) = store.find_plan_comment(issue_number).await? else {
            return Ok(());
        };
        if !is_decomposed_plan(&plan) {
            return Ok(());
        }

        let children = extract_child_issues(&plan);
        if children.is_empty() {
            return Ok(());
        }
        let summary = link_sub_issues(self.tracker, issue_number, &children).await;
        info!(
            linked = summary.linked,
            failed = summary.failed,
            "registered sub-issue relationships"
        );
        Ok(())
    }

    async fn run_execute(
        &self,
        issue_number: IssueNumber,
        actor: Association,
        rules_present: bool,
    ) -> Result<RunOutcome, WorkflowError> {
        let issue = self.tracker.get_issue(issue_number).await?;

        // Gate 1: authorization of the approving actor.
        let policy = self.config.authorized_associations();
        if check_authorization(actor, &policy) == AuthorizationDecision::Denied {
            self.tracker
                .post_comment(issue_number, &messages::unauthorized(self.language, &policy))
                .await?;
            return Err(WorkflowError::Unauthorized {
                actor,
                required: policy,
            });
        }

        // Gate 2: an approved plan must exist.
        let store = PlanStore::new(self.tracker, &self.config.trusted_bots);
        let Some(plan) = store.find_plan_comment(issue_number).await? else {
            self.tracker
                .post_comment(issue_number, &messages::plan_missing(self.language))
                .await?;
            return Err(WorkflowError::PlanMissing {
                issue: issue_number,
            });
        };

        // Gate 3: a decomposed parent is never executed directly.
        if is_decomposed_plan(&plan) {
            self.tracker
                .post_comment(issue_number, &messages::decomposed_footer(self.language))
                .await?;
            return Err(WorkflowError::DecomposedParent {
                issue: issue_number,
            });
        }

        // Gate 4: a declared dependency must be closed.
        if let Some(metadata) = parse_sub_issue_metadata(&issue.body) {
            match check_dependency(self.tracker, issue_number, &metadata).await {
                Ok(DependencyDecision::Allowed) => {}
                Ok(DependencyDecision::Blocked(depends_on)) => {
                    self.tracker
                        .post_comment(
                            issue_number,
                            &messages::dependency_blocked(self.language, depends_on),
                        )
                        .await?;
                    return Err(WorkflowError::DependencyBlocked {
                        issue: issue_number,
                        depends_on,
                    });
                }
                Err(err) => {
                    if let WorkflowError::DependencyMissing { depends_on, .. } = &err {
                        self.tracker
                            .post_comment(
                                issue_number,
                                &messages::dependency_missing(self.language, *depends_on),
                            )
                            .await?;
                    }
                    return Err(err);
                }
            }
        }

        // All gates passed: announce, budget, render, dispatch.
        let branch = BranchName::for_issue(&self.config.branch_prefix, issue_number);
        self.tracker
            .post_comment(
                issue_number,
                &messages::starting_implementation(self.language, branch.as_str()),
            )
            .await?;

        let budget =
            TurnBudget::new(self.config.total_turns).ok_or_else(|| WorkflowError::Internal {
                detail: format!(
                    "total_turns {} escaped config validation",
                    self.config.total_turns
                ),
            })?;

        let prompt = self.renderer.render_execute(&ExecutePromptContext {
            issue_number: issue_number.as_u64(),
            issue_title: issue.title,
            plan,
            branch: branch.as_str().to_string(),
            base_branch: self.config.base_branch.clone(),
            push_deadline: budget.push_deadline(),
            sub_issue: parse_sub_issue_metadata(&issue.body),
            rules_present,
        })?;

        info!(
            turns = budget.total_turns(),
            push_deadline = budget.push_deadline(),
            branch = %branch,
            "dispatching execute run"
        );
        let report = self
            .executor
            .execute(ExecutionRequest {
                prompt,
                allowed_tools: self.config.allowed_tools.clone(),
                max_turns: budget.total_turns(),
            })
            .await?;

        Ok(RunOutcome { branch, report })
    }
}
