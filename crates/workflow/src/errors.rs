//! Top-level error taxonomy for the workflow domain.
//!
//! [`WorkflowError`] covers conditions that terminate an invocation.
//! Component-level errors (tracker failures, executor failures, template
//! failures) are defined in [`crate::ports`] and wrapped here.
//!
//! Refusal variants are expected, policy-driven outcomes: each one has
//! already posted a human-visible comment on the issue by the time it is
//! returned, so the issue thread stays legible even when process logs are
//! discarded. The process exit message is the secondary channel.

use thiserror::Error;

use crate::ports::{ExecutorError, RenderError, TrackerError};
use crate::{Association, IssueNumber};

/// Terminal failure of one orchestrator invocation.
///
/// Every variant renders a distinct, human-readable message; the CLI prints
/// it and exits non-zero. Refusals are never retried automatically.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The triggering actor's association is not in the authorization policy.
    #[error(
        "execution not authorized: association {actor} is not in the approved set [{levels}]",
        levels = format_associations(.required)
    )]
    Unauthorized {
        /// Association of the actor that tried to approve execution.
        actor: Association,
        /// Associations the policy accepts.
        required: Vec<Association>,
    },

    /// No plan comment exists on the issue.
    #[error("no plan comment found on issue #{issue}; run plan mode first")]
    PlanMissing {
        /// Issue that has no plan.
        issue: IssueNumber,
    },

    /// The issue's plan decomposes it into sub-issues, so the issue itself
    /// must not be executed; work happens on the children.
    #[error("cannot execute a decomposed parent issue (#{issue}); execute its sub-issues instead")]
    DecomposedParent {
        /// The parent issue whose execution was refused.
        issue: IssueNumber,
    },

    /// The issue's declared dependency is still open.
    #[error("issue #{issue} depends on #{depends_on} which is not yet closed")]
    DependencyBlocked {
        /// Issue whose execution is blocked.
        issue: IssueNumber,
        /// The dependency that must close first.
        depends_on: IssueNumber,
    },

    /// The issue's declared dependency does not exist on the tracker.
    ///
    /// Distinct from [`WorkflowError::DependencyBlocked`]: this is a
    /// configuration error (wrong issue number in the depends marker), not a
    /// sequencing condition.
    #[error("dependency issue #{depends_on} does not exist; check the leonidas-depends marker on issue #{issue}")]
    DependencyMissing {
        /// Issue that declared the dependency.
        issue: IssueNumber,
        /// The referenced issue number that could not be found.
        depends_on: IssueNumber,
    },

    /// A required tracker read or write failed.
    #[error("tracker operation failed")]
    Tracker(#[from] TrackerError),

    /// The agent could not be launched or driven to completion.
    #[error("agent executor failed")]
    Executor(#[from] ExecutorError),

    /// A prompt template failed to render.
    #[error("prompt rendering failed")]
    Render(#[from] RenderError),

    /// An invariant the configuration layer is supposed to guarantee did not
    /// hold at runtime.
    #[error("internal error: {detail}")]
    Internal {
        /// Description of the broken invariant.
        detail: String,
    },
}

impl WorkflowError {
    /// Returns `true` when this error is a policy-driven refusal (as opposed
    /// to an infrastructure failure).
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. }
                | Self::PlanMissing { .. }
                | Self::DecomposedParent { .. }
                | Self::DependencyBlocked { .. }
                | Self::DependencyMissing { .. }
        )
    }
}

fn format_associations(associations: &[Association]) -> String {
    associations
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refusal_messages_are_distinct_and_name_the_issue() {
        let blocked = WorkflowError::DependencyBlocked {
            issue: IssueNumber::new(102),
            depends_on: IssueNumber::new(101),
        };
        assert!(blocked.to_string().contains("#101"));
        assert!(blocked.to_string().contains("not yet closed"));

        let missing = WorkflowError::DependencyMissing {
            issue: IssueNumber::new(102),
            depends_on: IssueNumber::new(101),
        };
        assert!(missing.to_string().contains("does not exist"));
        assert_ne!(blocked.to_string(), missing.to_string());
    }

    #[test]
    fn unauthorized_message_names_required_associations() {
        let err = WorkflowError::Unauthorized {
            actor: Association::None,
            required: vec![Association::Owner, Association::Member],
        };
        let message = err.to_string();
        assert!(message.contains("OWNER, MEMBER"));
        assert!(message.contains("NONE"));
    }

    #[test]
    fn refusal_classification() {
        let refusal = WorkflowError::PlanMissing {
            issue: IssueNumber::new(7),
        };
        assert!(refusal.is_refusal());

        let infra = WorkflowError::Tracker(TrackerError::NotFound {
            resource: "issue #7".to_string(),
        });
        assert!(!infra.is_refusal());
    }
}
