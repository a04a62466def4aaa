//! Trust/fallback matrix for the plan comment store.

mod common;

use common::FakeTracker;
use workflow::markers::{LEGACY_PLAN_HEADER, PLAN_MARKER};
use workflow::plan::PlanStore;
use workflow::{IssueNumber, IssueState};

const BOT: &str = "github-actions[bot]";

fn trusted() -> Vec<String> {
    vec![BOT.to_string()]
}

fn tracker_with_issue() -> FakeTracker {
    FakeTracker::new().with_issue(42, "Add retries", "body", IssueState::Open)
}

#[tokio::test]
async fn no_marker_and_no_header_anywhere_yields_none() {
    let tracker = tracker_with_issue();
    tracker.add_comment(42, "octocat", "nice idea");
    tracker.add_comment(42, BOT, "status: waiting for approval");
    let trusted = trusted();
    let store = PlanStore::new(&tracker, &trusted);

    assert_eq!(
        store.find_plan_comment(IssueNumber::new(42)).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn empty_comment_stream_yields_none() {
    let tracker = tracker_with_issue();
    let trusted = trusted();
    let store = PlanStore::new(&tracker, &trusted);

    assert_eq!(
        store.find_plan_comment(IssueNumber::new(42)).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn last_trusted_marker_comment_wins() {
    let tracker = tracker_with_issue();
    tracker.add_comment(42, BOT, &format!("{PLAN_MARKER}\nplan one"));
    tracker.add_comment(42, BOT, &format!("{PLAN_MARKER}\nplan two"));
    tracker.add_comment(42, BOT, &format!("{PLAN_MARKER}\nplan three"));
    tracker.add_comment(42, BOT, "unrelated status update");
    let trusted = trusted();
    let store = PlanStore::new(&tracker, &trusted);

    let plan = store
        .find_plan_comment(IssueNumber::new(42))
        .await
        .unwrap()
        .unwrap();
    assert!(plan.contains("plan three"));
}

#[tokio::test]
async fn legacy_header_from_a_trusted_author_is_a_fallback() {
    let tracker = tracker_with_issue();
    tracker.add_comment(42, BOT, &format!("{LEGACY_PLAN_HEADER}\nold-style plan"));
    let trusted = trusted();
    let store = PlanStore::new(&tracker, &trusted);

    let plan = store
        .find_plan_comment(IssueNumber::new(42))
        .await
        .unwrap()
        .unwrap();
    assert!(plan.contains("old-style plan"));
}

#[tokio::test]
async fn trusted_legacy_header_outranks_untrusted_marker() {
    let tracker = tracker_with_issue();
    tracker.add_comment(42, "someone-else", &format!("{PLAN_MARKER}\nforged plan"));
    tracker.add_comment(42, BOT, &format!("{LEGACY_PLAN_HEADER}\ntrusted plan"));
    let trusted = trusted();
    let store = PlanStore::new(&tracker, &trusted);

    let plan = store
        .find_plan_comment(IssueNumber::new(42))
        .await
        .unwrap()
        .unwrap();
    assert!(plan.contains("trusted plan"));
}

#[tokio::test]
async fn widened_lookup_accepts_any_author_when_no_trusted_comment_matches() {
    // Deployments whose automation posts under a custom identity rely on
    // this fallback; it is a deliberate trust downgrade.
    let tracker = tracker_with_issue();
    tracker.add_comment(42, "custom-app[bot]", &format!("{PLAN_MARKER}\ncustom plan"));
    let trusted = trusted();
    let store = PlanStore::new(&tracker, &trusted);

    let plan = store
        .find_plan_comment(IssueNumber::new(42))
        .await
        .unwrap()
        .unwrap();
    assert!(plan.contains("custom plan"));
}

#[tokio::test]
async fn widened_lookup_still_prefers_marker_over_legacy_header() {
    let tracker = tracker_with_issue();
    tracker.add_comment(
        42,
        "custom-app[bot]",
        &format!("{LEGACY_PLAN_HEADER}\nheader plan"),
    );
    tracker.add_comment(42, "someone-else", &format!("{PLAN_MARKER}\nmarker plan"));
    let trusted = trusted();
    let store = PlanStore::new(&tracker, &trusted);

    let plan = store
        .find_plan_comment(IssueNumber::new(42))
        .await
        .unwrap()
        .unwrap();
    assert!(plan.contains("marker plan"));
}

#[tokio::test]
async fn trusted_set_is_injected_not_global() {
    let tracker = tracker_with_issue();
    tracker.add_comment(42, "custom-app[bot]", &format!("{PLAN_MARKER}\ncustom plan"));
    tracker.add_comment(42, "someone-else", &format!("{PLAN_MARKER}\nlater forgery"));

    // With the custom identity in the trusted set, the forged later comment
    // no longer wins the lookup.
    let trusted = vec!["custom-app[bot]".to_string()];
    let store = PlanStore::new(&tracker, &trusted);
    let plan = store
        .find_plan_comment(IssueNumber::new(42))
        .await
        .unwrap()
        .unwrap();
    assert!(plan.contains("custom plan"));
}
