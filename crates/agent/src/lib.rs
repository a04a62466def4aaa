//! Leonidas agent executor adapter.
//!
//! Implements the [`workflow::ports::AgentExecutor`] trait by spawning the
//! configured coding-agent CLI as a subprocess: the rendered prompt goes in
//! on stdin, the turn budget and tool allowlist go in as flags, and the exit
//! status comes back as the completion verdict.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The agent is opaque to the rest of the system — what
//! it edits, commits, or posts is its own business. The domain only learns
//! whether the run completed; everything durable the run produced lives in
//! the tracker and the remote branch, where the rescue pass finds it.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

use workflow::ports::{AgentExecutor, ExecutionReport, ExecutionRequest, ExecutorError};

/// How much trailing agent output to keep as the report detail.
const DETAIL_TAIL_CHARS: usize = 2000;

/// Executor that drives an agent CLI subprocess.
pub struct CommandExecutor {
    command: String,
}

impl CommandExecutor {
    /// Creates an executor that launches `command` for every run.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl AgentExecutor for CommandExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionReport, ExecutorError> {
        info!(
            command = %self.command,
            max_turns = request.max_turns,
            "launching agent"
        );

        let mut child = Command::new(&self.command)
            .arg("--print")
            .arg("--max-turns")
            .arg(request.max_turns.to_string())
            .arg("--allowedTools")
            .arg(request.allowed_tools.join(","))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ExecutorError::Launch {
                command: self.command.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| ExecutorError::Aborted {
            detail: "agent stdin was not captured".to_string(),
        })?;
        stdin
            .write_all(request.prompt.as_bytes())
            .await
            .map_err(|err| ExecutorError::Aborted {
                detail: format!("failed to write prompt to agent stdin: {err}"),
            })?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| ExecutorError::Aborted {
                detail: format!("failed waiting for agent exit: {err}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = tail(&stdout, DETAIL_TAIL_CHARS);
        let completed = output.status.success();
        info!(completed, "agent run finished");

        Ok(ExecutionReport { completed, detail })
    }
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_short_text_intact() {
        assert_eq!(tail("all of it", 100), "all of it");
    }

    #[test]
    fn tail_keeps_only_the_trailing_chars() {
        assert_eq!(tail("abcdef", 3), "def");
    }

    #[tokio::test]
    async fn launch_failure_names_the_command() {
        let executor = CommandExecutor::new("leonidas-no-such-agent-binary");
        let err = executor
            .execute(ExecutionRequest {
                prompt: "hello".to_string(),
                allowed_tools: vec![],
                max_turns: 15,
            })
            .await
            .unwrap_err();
        match err {
            ExecutorError::Launch { command, .. } => {
                assert_eq!(command, "leonidas-no-such-agent-binary");
            }
            other => panic!("expected launch failure, got {other:?}"),
        }
    }
}
