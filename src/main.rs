//! Mailgate CLI entry point.
//!
//! `run` drives an interactive console session. `submit` and `respond`
//! split the same workflow across processes at the human review boundary;
//! `continue` finishes a run that was interrupted between stages.
//! `status`, `log`, `reset` and `graph` inspect or reset the persisted
//! snapshot without touching a model.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tracing::info;

use mailgate::adapters::console::ConsoleReviewer;
use mailgate::config::MailgateConfig;
use mailgate::credentials::load_credentials;
use mailgate::extractor::LlmExtractor;
use mailgate::logging;
use mailgate::providers::router::ModelRouter;
use mailgate::workflow::graph::mermaid;
use mailgate::workflow::store::reset_snapshot;
use mailgate::workflow::{
    FinalResult, JsonFileStore, LogEntry, ReviewPrompt, RunOutcome, StateStore, Workflow,
    WorkflowState,
};

/// Mailgate: LLM email extraction with human review.
#[derive(Parser)]
#[command(name = "mailgate", version, about)]
struct Cli {
    /// Path to `config.toml` (overrides `$MAILGATE_CONFIG_PATH`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the workflow interactively on the console.
    Run {
        /// Message to extract from; prompted for when omitted.
        #[arg(long)]
        input: Option<String>,
    },
    /// Start a run and stop at the first review point.
    Submit {
        /// Message to extract from.
        #[arg(long)]
        input: String,
    },
    /// Answer the pending review: `y`, `n`, or a corrected email.
    Respond {
        /// The human response.
        response: String,
    },
    /// Continue the saved run from the stage where it stopped.
    Continue,
    /// Show the persisted workflow state.
    Status,
    /// Print the execution log.
    Log,
    /// Overwrite the persisted state with an empty one.
    Reset,
    /// Print the workflow graph as Mermaid.
    Graph {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = MailgateConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let _logging_guard = match &config.paths.logs_dir {
        Some(dir) => Some(logging::init_production(dir, &config.logging.level)?),
        None => {
            logging::init_cli(&config.logging.level);
            None
        }
    };

    let store = Arc::new(JsonFileStore::new(&config.paths.state_file));

    match cli.command {
        Command::Run { input } => handle_run(&config, store, input).await,
        Command::Submit { input } => handle_submit(&config, store, &input).await,
        Command::Respond { response } => handle_respond(&config, store, &response).await,
        Command::Continue => handle_continue(&config, store).await,
        Command::Status => {
            print_status(&store.load());
            Ok(())
        }
        Command::Log => {
            print_log(&store.load().execution_log);
            Ok(())
        }
        Command::Reset => {
            reset_snapshot(store.as_ref()).context("failed to reset workflow state")?;
            println!("Workflow state reset ({}).", store.path().display());
            Ok(())
        }
        Command::Graph { output } => handle_graph(&config, output),
    }
}

/// Assemble the workflow with the configured extraction providers.
fn build_workflow(config: &MailgateConfig, store: Arc<JsonFileStore>) -> anyhow::Result<Workflow> {
    let credentials =
        load_credentials(&config.paths.env_file).context("failed to load credentials")?;
    let router = ModelRouter::from_config(&config.models, &config.llm, &credentials)
        .context("failed to configure extraction model")?;
    info!(model = router.primary_spec(), "extraction model ready");

    let extractor = Arc::new(LlmExtractor::from_router(&router));
    Ok(Workflow::new(extractor, store, config.policy))
}

async fn handle_run(
    config: &MailgateConfig,
    store: Arc<JsonFileStore>,
    input: Option<String>,
) -> anyhow::Result<()> {
    let workflow = build_workflow(config, store)?;
    let console = ConsoleReviewer::stdio();

    let input = match input {
        Some(text) => text,
        None => {
            console
                .print("Email Extraction & Validation Workflow\n")
                .await?;
            console.ask("Enter your message: ").await?
        }
    };

    let (state, result) = workflow.run(&input, &console).await?;
    print_result(&result)?;
    print_log(&state.execution_log);
    Ok(())
}

async fn handle_submit(
    config: &MailgateConfig,
    store: Arc<JsonFileStore>,
    input: &str,
) -> anyhow::Result<()> {
    let workflow = build_workflow(config, store)?;
    let state = workflow.start(input)?;
    let outcome = workflow.advance(state).await?;
    print_outcome(&outcome)
}

async fn handle_respond(
    config: &MailgateConfig,
    store: Arc<JsonFileStore>,
    response: &str,
) -> anyhow::Result<()> {
    let workflow = build_workflow(config, store)?;
    let state = workflow.load();
    let outcome = workflow.resume(state, response).await?;
    print_outcome(&outcome)
}

async fn handle_continue(
    config: &MailgateConfig,
    store: Arc<JsonFileStore>,
) -> anyhow::Result<()> {
    let workflow = build_workflow(config, store)?;
    let outcome = workflow.continue_saved().await?;
    print_outcome(&outcome)
}

fn handle_graph(config: &MailgateConfig, output: Option<PathBuf>) -> anyhow::Result<()> {
    let doc = mermaid(&config.policy);
    match output {
        Some(path) => {
            std::fs::write(&path, &doc)
                .with_context(|| format!("failed to write graph to {}", path.display()))?;
            println!("Graph saved as '{}'", path.display());
        }
        None => print!("{doc}"),
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) -> anyhow::Result<()> {
    match outcome {
        RunOutcome::AwaitingReview { prompt, .. } => {
            print_prompt(prompt);
            Ok(())
        }
        RunOutcome::Finished { result, .. } => print_result(result),
    }
}

fn print_prompt(prompt: &ReviewPrompt) {
    println!("[Human Review Required]");
    println!("Extracted email: {}", prompt.extracted);
    println!("Validation result: {}", prompt.validation);
    println!("Attempts so far: {}", prompt.attempts);
    if prompt.accepts_corrections {
        println!("Answer with: mailgate respond <y|n|corrected-email>");
    } else {
        println!("Answer with: mailgate respond <y|n>");
    }
}

fn print_result(result: &FinalResult) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(result).context("failed to render final result")?;
    println!("\nFinal Result: {rendered}");
    Ok(())
}

fn print_status(state: &WorkflowState) {
    println!("Step:       {}", state.current_step);
    println!("Attempts:   {}", state.attempts);
    println!("Approved:   {}", if state.approved { "yes" } else { "no" });
    println!("Input:      {}", state.user_input);
    println!(
        "Extracted:  {}",
        state.llm_response.as_deref().unwrap_or("-")
    );
    println!(
        "Validation: {}",
        state.tool_output.as_deref().unwrap_or("-")
    );
    println!("Log entries: {}", state.execution_log.len());
}

fn print_log(entries: &[LogEntry]) {
    println!("\nExecution Log:");
    for entry in entries {
        println!(
            "  - {} @ {}: {}",
            entry.node,
            format_clock(entry.timestamp),
            entry.details
        );
    }
}

/// Render epoch seconds as local `HH:MM:SS`, or the raw value if out of range.
fn format_clock(timestamp: f64) -> String {
    Duration::try_from_secs_f64(timestamp)
        .ok()
        .and_then(|d| {
            let secs = i64::try_from(d.as_secs()).ok()?;
            DateTime::from_timestamp(secs, d.subsec_nanos())
        })
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{timestamp:.3}"))
}
