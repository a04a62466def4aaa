//! Native sub-issue relationship registration.
//!
//! After a decomposition, the tracker's own parent/child relationship is
//! registered for each child named in the plan's checklist. Linkage is an
//! enhancement on top of the body markers — the markers alone are
//! authoritative — so each attempt is independent and a failure never aborts
//! the batch.

use tracing::warn;

use crate::ports::IssueTracker;
use crate::IssueNumber;

/// Outcome counts for one linking batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkSummary {
    /// Relationships registered successfully.
    pub linked: usize,
    /// Attempts the tracker rejected.
    pub failed: usize,
}

/// Registers each of `children` as a native sub-issue of `parent`.
///
/// Children are processed in the order given (document order of the plan's
/// checklist, duplicates included). The summary lets the caller log one line
/// without per-item detail; per-item failures are logged here.
pub async fn link_sub_issues(
    tracker: &dyn IssueTracker,
    parent: IssueNumber,
    children: &[IssueNumber],
) -> LinkSummary {
    let mut summary = LinkSummary::default();
    for &child in children {
        match tracker.link_sub_issue(parent, child).await {
            Ok(()) => summary.linked += 1,
            Err(err) => {
                warn!(
                    parent = %parent,
                    child = %child,
                    error = %err,
                    "sub-issue linkage failed"
                );
                summary.failed += 1;
            }
        }
    }
    summary
}
