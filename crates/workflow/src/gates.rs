//! Authorization and dependency gates.
//!
//! Both gates are pure decision procedures over tracker state; the phase
//! controller turns their verdicts into posted comments and distinct
//! failures.

use crate::ports::IssueTracker;
use crate::{Association, IssueNumber, SubIssueMetadata, WorkflowError};

// ---------------------------------------------------------------------------
// Authorization gate
// ---------------------------------------------------------------------------

/// Whether the triggering actor may start execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Allowed,
    Denied,
}

/// Checks the actor's association against the configured policy.
///
/// An empty policy disables the gate entirely: every association is allowed,
/// including [`Association::None`]. A non-empty policy allows exactly its
/// members. `NONE` can never be a member — configuration validation rejects
/// it (see [`crate::config::ConfigError::NoneApproverExcluded`]).
pub fn check_authorization(
    actor: Association,
    policy: &[Association],
) -> AuthorizationDecision {
    if policy.is_empty() || policy.contains(&actor) {
        AuthorizationDecision::Allowed
    } else {
        AuthorizationDecision::Denied
    }
}

// ---------------------------------------------------------------------------
// Dependency gate
// ---------------------------------------------------------------------------

/// Whether a sub-issue's declared dependency permits execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyDecision {
    Allowed,
    Blocked(IssueNumber),
}

/// Checks whether the metadata's dependency, if any, is closed.
///
/// No dependency means always allowed. A 404 on the referenced issue is
/// surfaced as [`WorkflowError::DependencyMissing`] — the marker names an
/// issue that does not exist, which is an operator error, not a sequencing
/// condition. Any other tracker failure propagates unchanged so outages stay
/// distinguishable from wrong issue numbers.
pub async fn check_dependency(
    tracker: &dyn IssueTracker,
    issue: IssueNumber,
    metadata: &SubIssueMetadata,
) -> Result<DependencyDecision, WorkflowError> {
    let Some(depends_on) = metadata.depends_on else {
        return Ok(DependencyDecision::Allowed);
    };

    let dependency = tracker.get_issue(depends_on).await.map_err(|err| {
        if err.is_not_found() {
            WorkflowError::DependencyMissing { issue, depends_on }
        } else {
            WorkflowError::Tracker(err)
        }
    })?;

    if dependency.state.is_closed() {
        Ok(DependencyDecision::Allowed)
    } else {
        Ok(DependencyDecision::Blocked(depends_on))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_policy_allows_every_association_including_none() {
        for actor in [
            Association::Owner,
            Association::Contributor,
            Association::None,
        ] {
            assert_eq!(check_authorization(actor, &[]), AuthorizationDecision::Allowed);
        }
    }

    #[test]
    fn non_empty_policy_is_a_membership_test() {
        let policy = [Association::Owner, Association::Member];
        assert_eq!(
            check_authorization(Association::Member, &policy),
            AuthorizationDecision::Allowed
        );
        assert_eq!(
            check_authorization(Association::Contributor, &policy),
            AuthorizationDecision::Denied
        );
        assert_eq!(
            check_authorization(Association::None, &policy),
            AuthorizationDecision::Denied
        );
    }
}
