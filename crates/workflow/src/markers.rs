//! Marker grammar for plan comments and issue bodies.
//!
//! All coordination state lives in the tracker itself, encoded as fixed,
//! language-neutral HTML-comment tokens:
//!
//! - [`PLAN_MARKER`] identifies a comment as a rendered implementation plan.
//! - [`DECOMPOSED_MARKER`] identifies a plan that splits the issue into
//!   sub-issues.
//! - `leonidas-parent` / `leonidas-order` / `leonidas-depends` markers inside
//!   a sub-issue's body record its place in a decomposition.
//!
//! Markers are matched case-sensitively and tolerate whitespace around the
//! colon and the issue reference. When the same marker type appears more than
//! once, the first occurrence is authoritative.

use std::sync::LazyLock;

use regex::Regex;

use crate::{IssueNumber, SubIssueMetadata};

/// Language-neutral token that identifies a comment as a plan.
pub const PLAN_MARKER: &str = "<!-- leonidas:plan -->";

/// Token present in plans that decompose the issue into sub-issues.
pub const DECOMPOSED_MARKER: &str = "<!-- leonidas:decomposed -->";

/// English plan header used before [`PLAN_MARKER`] existed.
///
/// Matched only as a fallback so plans created by older releases keep working.
pub const LEGACY_PLAN_HEADER: &str = "## Implementation Plan";

static PARENT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*leonidas-parent\s*:\s*#(\d+)\s*-->").expect("parent marker pattern")
});

static ORDER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*leonidas-order\s*:\s*(\d+)\s*/\s*(\d+)\s*-->").expect("order marker pattern")
});

static DEPENDS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*leonidas-depends\s*:\s*#(\d+)\s*-->").expect("depends marker pattern")
});

static CHECKLIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*- \[ \] #(\d+)").expect("checklist pattern"));

/// Returns `true` iff `text` contains the decomposition marker.
pub fn is_decomposed_plan(text: &str) -> bool {
    text.contains(DECOMPOSED_MARKER)
}

/// Returns `true` iff `text` carries the plan identity marker.
pub fn has_plan_marker(text: &str) -> bool {
    text.contains(PLAN_MARKER)
}

/// Returns `true` iff `text` carries the legacy English plan header.
pub fn has_legacy_plan_header(text: &str) -> bool {
    text.contains(LEGACY_PLAN_HEADER)
}

/// Extracts the parent-issue reference from an issue body, if present.
///
/// Exposed separately from [`parse_sub_issue_metadata`] because rescue only
/// needs the parent reference and must work even when the order marker is
/// absent.
pub fn parse_parent_marker(body: &str) -> Option<IssueNumber> {
    let captures = PARENT_MARKER.captures(body)?;
    captures[1].parse::<u64>().ok().map(IssueNumber::new)
}

/// Extracts full decomposition metadata from an issue body.
///
/// Both the parent marker and the order marker must be present; partial
/// metadata is treated as absent, not as a partial object. The depends marker
/// is optional and parsed independently.
pub fn parse_sub_issue_metadata(body: &str) -> Option<SubIssueMetadata> {
    let parent = parse_parent_marker(body)?;
    let order_captures = ORDER_MARKER.captures(body)?;
    let order = order_captures[1].parse::<u32>().ok()?;
    let total = order_captures[2].parse::<u32>().ok()?;

    let depends_on = DEPENDS_MARKER
        .captures(body)
        .and_then(|c| c[1].parse::<u64>().ok())
        .map(IssueNumber::new);

    Some(SubIssueMetadata {
        parent,
        order,
        total,
        depends_on,
    })
}

/// Extracts child issue numbers from a decomposed plan's checklist.
///
/// Matches `- [ ] #N` lines in document order. Duplicates are preserved; the
/// caller decides whether repeated references matter.
pub fn extract_child_issues(plan: &str) -> Vec<IssueNumber> {
    CHECKLIST_ITEM
        .captures_iter(plan)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .map(IssueNumber::new)
        .collect()
}
