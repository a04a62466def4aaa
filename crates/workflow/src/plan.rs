//! Plan comment store.
//!
//! The "current plan" for an issue is not a stored object: it is a derived
//! view over the issue's append-only comment stream, recomputed on every
//! lookup. Last write wins — the most recent matching comment is the
//! authoritative plan.

use tracing::debug;

use crate::markers::{has_legacy_plan_header, has_plan_marker};
use crate::ports::{IssueTracker, TrackerError};
use crate::{Comment, IssueNumber};

/// Locates the authoritative plan text among an issue's comments.
///
/// The set of trusted author identities is injected at construction rather
/// than read from a module constant, so deployments with a custom automation
/// identity can widen it and tests can pin it.
pub struct PlanStore<'a> {
    tracker: &'a dyn IssueTracker,
    trusted_bots: &'a [String],
}

impl<'a> PlanStore<'a> {
    /// Creates a store over `tracker` that trusts comments from `trusted_bots`.
    pub fn new(tracker: &'a dyn IssueTracker, trusted_bots: &'a [String]) -> Self {
        Self {
            tracker,
            trusted_bots,
        }
    }

    /// Finds the current plan comment for `issue`, if any.
    ///
    /// Lookup order, first non-empty match wins:
    ///
    /// 1. trusted authors, plan marker (last match);
    /// 2. trusted authors, legacy English header (last match);
    /// 3. any author, plan marker (last match);
    /// 4. any author, legacy English header (last match).
    ///
    /// Steps 3–4 deliberately downgrade trust: they keep deployments working
    /// whose automation posts under an identity outside the trusted set, at
    /// the cost of accepting a plan forged by any commenter. Callers in
    /// security-sensitive contexts must not rely on the widened fallback.
    pub async fn find_plan_comment(
        &self,
        issue: IssueNumber,
    ) -> Result<Option<String>, TrackerError> {
        let comments = self.tracker.list_comments(issue).await?;

        let trusted: Vec<&Comment> = comments
            .iter()
            .filter(|c| self.trusted_bots.contains(&c.author))
            .collect();
        let everyone: Vec<&Comment> = comments.iter().collect();

        let found = last_match(&trusted, has_plan_marker)
            .or_else(|| last_match(&trusted, has_legacy_plan_header))
            .or_else(|| last_match(&everyone, has_plan_marker))
            .or_else(|| last_match(&everyone, has_legacy_plan_header));

        match &found {
            Some(comment) => debug!(
                issue = %issue,
                author = %comment.author,
                "plan comment located"
            ),
            None => debug!(issue = %issue, comments = comments.len(), "no plan comment"),
        }

        Ok(found.map(|c| c.body.clone()))
    }
}

fn last_match<'c>(
    comments: &[&'c Comment],
    predicate: impl Fn(&str) -> bool,
) -> Option<&'c Comment> {
    comments.iter().rev().find(|c| predicate(&c.body)).copied()
}
