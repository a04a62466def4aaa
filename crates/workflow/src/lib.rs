//! Core orchestration domain for Leonidas.
//!
//! Leonidas automates a plan → approve → execute workflow on tracker issues:
//! a labelled issue becomes an implementation-plan comment, a human approves
//! it, an agent implements it, and an interrupted run is rescued into a draft
//! pull request. This crate contains every domain concept, decision
//! procedure, and cross-cutting error type of that workflow. Infrastructure
//! crates implement the port traits defined here; they never add domain
//! rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply
//! it. Each invocation is stateless: the tracker's comment stream is the only
//! durable state, and derived views over it (the current plan, decomposition
//! metadata) are recomputed on every lookup.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`IssueNumber`, `BranchName`, etc.) |
//! | [`types`] | Tracker entities and shared value types |
//! | [`errors`] | Refusal and fatal-error taxonomy |
//! | [`markers`] | Marker grammar: plan identity, decomposition, sub-issue metadata |
//! | [`ports`] | Port traits: `IssueTracker`, `AgentExecutor`, `PromptRenderer` |
//! | [`plan`] | Plan comment store (trust/fallback lookup over the comment log) |
//! | [`gates`] | Authorization and dependency gates |
//! | [`budget`] | Turn budgets and the push deadline |
//! | [`config`] | Run configuration, defaults, and validation |
//! | [`messages`] | Localized user-facing comment texts |
//! | [`controller`] | Phase controller (plan/execute decision procedure) |
//! | [`rescue`] | Rescue pass and pull-request post-processing |
//! | [`linker`] | Native sub-issue relationship registration |

pub mod budget;
pub mod config;
pub mod controller;
pub mod errors;
pub mod gates;
pub mod identifiers;
pub mod linker;
pub mod markers;
pub mod messages;
pub mod plan;
pub mod ports;
pub mod rescue;
pub mod types;

// Re-export the spine of the domain at the crate root for ergonomic usage by
// downstream crates.
pub use budget::{TurnBudget, PLAN_TURN_LIMIT, RESERVED_TURNS};
pub use config::{Config, ConfigError, MIN_TOTAL_TURNS};
pub use controller::{Mode, PhaseController, RunOutcome};
pub use errors::WorkflowError;
pub use identifiers::{BranchName, IssueNumber, PullRequestNumber, RepositoryId, RunId};
pub use messages::Language;
pub use types::{
    Association, Comment, Issue, IssueState, NewPullRequest, PullRequest, SubIssueMetadata,
    UnknownAssociation,
};
