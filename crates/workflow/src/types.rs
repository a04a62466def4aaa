//! Shared value types for the Leonidas workflow domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. associations come from a closed
//! platform enumeration, issue state is open or closed) and participate in
//! domain decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IssueNumber, PullRequestNumber};

// ---------------------------------------------------------------------------
// Tracker entities
// ---------------------------------------------------------------------------

/// Whether a tracker issue is open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Returns `true` for [`IssueState::Closed`].
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// A snapshot of a tracker issue.
///
/// Owned by the external tracker; read-only to this domain. The body is
/// written once at issue-creation time, so the decomposition markers parsed
/// from it (see [`crate::markers`]) are fixed for the life of the issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Tracker-assigned issue number.
    pub number: IssueNumber,
    /// Issue title.
    pub title: String,
    /// Issue body. Empty string when the tracker reports no body.
    pub body: String,
    /// Labels currently applied to the issue.
    pub labels: Vec<String>,
    /// Login of the user who opened the issue.
    pub author: String,
    /// Open/closed state at snapshot time.
    pub state: IssueState,
}

/// One comment in an issue's comment stream.
///
/// The stream is ordered and append-only from this domain's perspective: the
/// orchestrator posts new comments but never edits or deletes existing ones.
/// The current plan is always re-derived by scanning the stream, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Login of the comment author.
    pub author: String,
    /// Comment body.
    pub body: String,
    /// Creation time reported by the tracker.
    pub created_at: DateTime<Utc>,
}

/// A pull request known to the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Tracker-assigned pull request number.
    pub number: PullRequestNumber,
    /// Browser URL of the pull request.
    pub url: String,
    /// Whether the pull request is a draft.
    pub draft: bool,
}

/// Parameters for creating a pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPullRequest {
    /// Pull request title.
    pub title: String,
    /// Pull request body.
    pub body: String,
    /// Head branch holding the changes.
    pub head: crate::BranchName,
    /// Base branch the changes target.
    pub base: String,
    /// Create as a draft pull request.
    pub draft: bool,
}

// ---------------------------------------------------------------------------
// Actor associations
// ---------------------------------------------------------------------------

/// Repository association level of the actor that triggered an event.
///
/// This is the platform's closed enumeration. [`Association::None`] denotes an
/// actor with no established relationship to the repository; it can occur on
/// incoming events but is permanently excluded from authorization policy
/// configuration (see [`crate::config::Config::validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Association {
    Owner,
    Member,
    Collaborator,
    Contributor,
    FirstTimeContributor,
    FirstTimer,
    Mannequin,
    None,
}

impl Association {
    /// The association levels an authorization policy may name.
    ///
    /// [`Association::None`] is deliberately absent: allowing it would make
    /// an allowlist meaningless.
    pub const POLICY_VALUES: [Association; 7] = [
        Association::Owner,
        Association::Member,
        Association::Collaborator,
        Association::Contributor,
        Association::FirstTimeContributor,
        Association::FirstTimer,
        Association::Mannequin,
    ];

    /// Returns the platform's wire spelling of this association.
    pub fn as_str(self) -> &'static str {
        match self {
            Association::Owner => "OWNER",
            Association::Member => "MEMBER",
            Association::Collaborator => "COLLABORATOR",
            Association::Contributor => "CONTRIBUTOR",
            Association::FirstTimeContributor => "FIRST_TIME_CONTRIBUTOR",
            Association::FirstTimer => "FIRST_TIMER",
            Association::Mannequin => "MANNEQUIN",
            Association::None => "NONE",
        }
    }
}

impl std::fmt::Display for Association {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Association {
    type Err = UnknownAssociation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Association::Owner),
            "MEMBER" => Ok(Association::Member),
            "COLLABORATOR" => Ok(Association::Collaborator),
            "CONTRIBUTOR" => Ok(Association::Contributor),
            "FIRST_TIME_CONTRIBUTOR" => Ok(Association::FirstTimeContributor),
            "FIRST_TIMER" => Ok(Association::FirstTimer),
            "MANNEQUIN" => Ok(Association::Mannequin),
            "NONE" => Ok(Association::None),
            other => Err(UnknownAssociation {
                value: other.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an association string the platform does not define.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown association level '{value}'")]
pub struct UnknownAssociation {
    /// The unrecognised input value.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Sub-issue decomposition metadata
// ---------------------------------------------------------------------------

/// Decomposition metadata embedded in a sub-issue's body at creation time.
///
/// Parsed from the fixed HTML-comment markers (see [`crate::markers`]); never
/// mutated afterwards. Both the parent reference and the order marker must be
/// present for the metadata to exist at all — a body carrying only one of the
/// two is treated as carrying none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubIssueMetadata {
    /// The parent issue this sub-issue was decomposed from.
    pub parent: IssueNumber,
    /// 1-based position of this sub-issue within the decomposition.
    pub order: u32,
    /// Total number of sub-issues in the decomposition.
    pub total: u32,
    /// Issue that must be closed before this sub-issue may execute.
    pub depends_on: Option<IssueNumber>,
}
