//! Run configuration.
//!
//! Loaded once per invocation from the repository's `leonidas.yml` (the CLI
//! owns the file I/O; this module owns the shape, the defaults, and the
//! validation rules). Every field has a default so an empty or absent file
//! yields a usable configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{budget::RESERVED_TURNS, Association};

/// Smallest accepted execute-mode turn allowance.
///
/// Keeps the push deadline well clear of zero: the agent always has at least
/// `MIN_TOTAL_TURNS - RESERVED_TURNS` turns of real implementation work
/// before the reserved tail begins.
pub const MIN_TOTAL_TURNS: u32 = 15;

const _: () = assert!(MIN_TOTAL_TURNS > RESERVED_TURNS);

/// Repository-level configuration for the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Prefix for working branches; the issue number is appended.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Base branch pull requests target.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Language selector for posted comments (e.g. `"en"`, `"ja"`).
    #[serde(default = "default_language")]
    pub language: String,

    /// Total turn allowance for one execute-mode run.
    #[serde(default = "default_total_turns")]
    pub total_turns: u32,

    /// Tool identifiers the agent may use during execution.
    #[serde(default = "default_allowed_tools")]
    pub allowed_tools: Vec<String>,

    /// Association levels allowed to approve execution.
    ///
    /// Empty means the authorization gate is disabled — an explicit opt-out,
    /// not a misconfiguration.
    #[serde(default)]
    pub authorized_approvers: Vec<String>,

    /// Actor logins whose comments are trusted as authoritative plan sources.
    #[serde(default = "default_trusted_bots")]
    pub trusted_bots: Vec<String>,

    /// Labels starting with this prefix are automation-internal and are not
    /// copied from an issue onto its pull request.
    #[serde(default = "default_automation_label_prefix")]
    pub automation_label_prefix: String,

    /// CI workflow file to dispatch after a successful run, if any.
    #[serde(default)]
    pub ci_workflow: Option<String>,

    /// Repository rules file the execute prompt should point the agent at.
    #[serde(default = "default_rules_file")]
    pub rules_file: String,

    /// Command used to launch the coding agent.
    #[serde(default = "default_agent_command")]
    pub agent_command: String,
}

fn default_branch_prefix() -> String {
    "leonidas/issue-".to_string()
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_total_turns() -> u32 {
    50
}

fn default_allowed_tools() -> Vec<String> {
    [
        "Bash(git:*)",
        "Bash(gh:*)",
        "Edit",
        "Write",
        "Read",
        "Glob",
        "Grep",
    ]
    .map(str::to_string)
    .to_vec()
}

fn default_trusted_bots() -> Vec<String> {
    vec![
        "github-actions[bot]".to_string(),
        "leonidas[bot]".to_string(),
    ]
}

fn default_automation_label_prefix() -> String {
    "leonidas".to_string()
}

fn default_rules_file() -> String {
    "AGENTS.md".to_string()
}

fn default_agent_command() -> String {
    "claude".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            branch_prefix: default_branch_prefix(),
            base_branch: default_base_branch(),
            language: default_language(),
            total_turns: default_total_turns(),
            allowed_tools: default_allowed_tools(),
            authorized_approvers: Vec::new(),
            trusted_bots: default_trusted_bots(),
            automation_label_prefix: default_automation_label_prefix(),
            ci_workflow: None,
            rules_file: default_rules_file(),
            agent_command: default_agent_command(),
        }
    }
}

impl Config {
    /// Checks the invariants that deserialization alone cannot express.
    ///
    /// Called by the CLI immediately after loading; the rest of the domain
    /// trusts a validated config (in particular, [`crate::TurnBudget`]
    /// construction cannot fail for a validated `total_turns`).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_turns < MIN_TOTAL_TURNS {
            return Err(ConfigError::TotalTurnsTooLow {
                configured: self.total_turns,
                minimum: MIN_TOTAL_TURNS,
            });
        }

        for value in &self.authorized_approvers {
            let association: Association =
                value
                    .parse()
                    .map_err(|_| ConfigError::UnknownApproverAssociation {
                        value: value.clone(),
                    })?;
            if association == Association::None {
                return Err(ConfigError::NoneApproverExcluded);
            }
        }
        Ok(())
    }

    /// The parsed authorization policy.
    ///
    /// Must only be called on a validated config; unparseable entries are
    /// silently dropped here because [`Config::validate`] has already
    /// rejected them.
    pub fn authorized_associations(&self) -> Vec<Association> {
        self.authorized_approvers
            .iter()
            .filter_map(|value| value.parse().ok())
            .collect()
    }
}

/// Configuration that fails the merge/validation step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `total_turns` is below the accepted minimum.
    #[error("total_turns is {configured} but must be at least {minimum}")]
    TotalTurnsTooLow {
        /// The configured value.
        configured: u32,
        /// The enforced minimum bound.
        minimum: u32,
    },

    /// `authorized_approvers` names an association the platform does not define.
    #[error("authorized_approvers contains unknown association '{value}'")]
    UnknownApproverAssociation {
        /// The unrecognised entry.
        value: String,
    },

    /// `authorized_approvers` contains `NONE`.
    ///
    /// `NONE` denotes an actor with no established relationship to the
    /// repository; admitting it would defeat the policy's purpose, so it is
    /// rejected regardless of what an operator configures.
    #[error("authorized_approvers must not contain NONE")]
    NoneApproverExcluded,
}
