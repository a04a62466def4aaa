//! Leonidas CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration** — load `leonidas.yml` (defaults when absent)
//!    and validate it before anything touches the tracker.
//! 2. **Wire observability** — configure `tracing-subscriber` with an
//!    env-filter, optionally in JSON for CI log collection. A fresh
//!    [`workflow::RunId`] tags the root span of every invocation.
//! 3. **Construct infrastructure** — create the concrete adapters
//!    (`GithubClient`, `CommandExecutor`, `HandlebarsRenderer`) and inject
//!    them into the phase controller.
//! 4. **Dispatch** — `run` drives one plan/execute invocation; `rescue`
//!    reconciles branch and pull-request state after an execution attempt.
//!
//! Exit contract: refusals and fatal errors print one distinct,
//! human-readable line to stderr and exit non-zero. By the time a refusal
//! reaches this layer the phase controller has already posted the
//! explanatory comment; input-validation failures (bad mode, bad config,
//! unknown association) exit before any comment is posted.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use agent::CommandExecutor;
use github::{GithubClient, DEFAULT_API_BASE};
use prompts::HandlebarsRenderer;
use workflow::ports::IssueTracker;
use workflow::rescue::{finalize_pull_request, RescueController, RescueOutcome};
use workflow::{
    Association, Config, IssueNumber, Mode, PhaseController, RepositoryId, RunId,
};

#[derive(Parser)]
#[command(name = "leonidas", version, about = "Plan → approve → execute workflow for tracker issues")]
struct Cli {
    /// Repository in owner/repo form.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// API token used for every tracker call.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Tracker API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    api_url: String,

    /// Path to the repository configuration file.
    #[arg(long, env = "LEONIDAS_CONFIG", default_value = "leonidas.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one plan-mode or execute-mode invocation for an issue.
    Run {
        /// Which phase to run.
        #[arg(long, value_enum)]
        mode: ModeArg,

        /// Issue number the trigger concerns.
        #[arg(long, env = "LEONIDAS_ISSUE")]
        issue: u64,

        /// Association level of the actor that triggered the event.
        #[arg(long, env = "LEONIDAS_ACTOR_ASSOCIATION", default_value = "NONE")]
        actor_association: String,

        /// Log page of this run, linked from rescue pull requests.
        #[arg(long, env = "LEONIDAS_RUN_URL", default_value = "")]
        run_url: String,
    },

    /// Reconcile branch/pull-request state after an execution attempt.
    Rescue {
        /// Issue number whose working branch should be reconciled.
        #[arg(long, env = "LEONIDAS_ISSUE")]
        issue: u64,

        /// Log page of the interrupted run, linked from rescue pull requests.
        #[arg(long, env = "LEONIDAS_RUN_URL", default_value = "")]
        run_url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Plan,
    Execute,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plan => Mode::Plan,
            ModeArg::Execute => Mode::Execute,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let run_id = RunId::new_random();
    let span = info_span!("leonidas", run_id = %run_id);

    match dispatch(cli).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Single-line chain: the distinct per-refusal message is the
            // operator's channel; end users read the posted comment.
            eprintln!("leonidas: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LEONIDAS_LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    let repository = RepositoryId::new(cli.repository.as_str())
        .context("repository must not be empty")?;
    let tracker = GithubClient::new(cli.api_url.as_str(), &cli.token, &repository)
        .context("failed to construct tracker client")?;

    match cli.command {
        Command::Run {
            mode,
            issue,
            actor_association,
            run_url,
        } => {
            let actor: Association = actor_association
                .parse()
                .context("invalid actor association")?;
            run_phase(
                &tracker,
                &config,
                mode.into(),
                IssueNumber::new(issue),
                actor,
                &run_url,
            )
            .await
        }
        Command::Rescue { issue, run_url } => {
            run_rescue(&tracker, &config, IssueNumber::new(issue), &run_url).await?;
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        info!(path = %path.display(), "no configuration file, using defaults");
        Config::default()
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run_phase(
    tracker: &GithubClient,
    config: &Config,
    mode: Mode,
    issue: IssueNumber,
    actor: Association,
    run_url: &str,
) -> Result<()> {
    let renderer = HandlebarsRenderer::new().context("failed to build prompt renderer")?;
    let executor = CommandExecutor::new(&config.agent_command);
    let controller = PhaseController::new(tracker, &executor, &renderer, config);

    let outcome = controller.run(mode, issue, actor, rules_present(config)).await?;

    if mode == Mode::Plan {
        if !outcome.report.completed {
            bail!("plan run ended without completing; no plan was approved or executed");
        }
        return Ok(());
    }

    if outcome.report.completed {
        // Normal completion: decorate the pull request the agent opened.
        match tracker
            .find_open_pull_request(&outcome.branch, &config.base_branch)
            .await?
        {
            Some(pull_request) => {
                let issue_snapshot = tracker.get_issue(issue).await?;
                finalize_pull_request(
                    tracker,
                    &issue_snapshot,
                    &pull_request,
                    &outcome.branch,
                    config,
                )
                .await;
                info!(pr = %pull_request.number, "execution completed");
            }
            None => warn!(
                branch = %outcome.branch,
                "run reported completion but no open pull request was found"
            ),
        }
        Ok(())
    } else {
        // Interrupted or failed: preserve whatever was pushed, then fail the
        // invocation so the host surfaces it.
        run_rescue(tracker, config, issue, run_url).await?;
        bail!("agent run ended before completing the plan; rescue pass has run")
    }
}

async fn run_rescue(
    tracker: &GithubClient,
    config: &Config,
    issue: IssueNumber,
    run_url: &str,
) -> Result<RescueOutcome> {
    let controller = RescueController::new(tracker, config);
    let outcome = controller.run(issue, run_url).await?;
    match &outcome {
        RescueOutcome::NothingToRescue => info!("nothing to rescue"),
        RescueOutcome::ExistingPullRequest(pr) => {
            info!(pr = %pr.number, "partial progress already has a pull request");
        }
        RescueOutcome::DraftCreated(pr) => info!(pr = %pr.number, "draft rescue created"),
        RescueOutcome::DraftCreationFailed => warn!("draft rescue creation failed"),
    }
    Ok(outcome)
}

fn rules_present(config: &Config) -> bool {
    Path::new(&config.rules_file).exists()
}
