//! evalops - automated quality checks for black-box agents
//!
//! The `evalops` command drives golden-set evaluations, inspects the
//! trace and memory history, and applies planner changesets.
//!
//! ## Commands
//!
//! - `eval`: run the full evaluation suite for a subject version
//! - `apply`: apply a changeset (config patches + golden growth)
//! - `metrics`: per-version summary from the trace history
//! - `traces`: inspect recent trace events
//! - `memory`: list and extend the long-term memory bank

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use evalops_core::changeset::{Changeset, ChangesetEngine};
use evalops_core::domain::SubjectSpec;
use evalops_core::packs::{
    judge_disabled_by_env, AnswerRulePack, JudgeScorePack, MetricFilter, ScoringPack,
};
use evalops_core::store::{BestPractice, MemoryEntryKind, MemoryFilter, MemoryStore, TraceStore};
use evalops_core::telemetry::{init_tracing, LogFormat};
use evalops_core::{render_metrics_md, summarize_traces, write_summary_json, EvaluationEngine};

mod clients;

use clients::{HttpJudgeClient, HttpSubjectClient};

#[derive(Parser)]
#[command(name = "evalops")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated quality checks for black-box agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the trace log and memory bank
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full evaluation suite for a subject
    Eval {
        /// Path to the subject spec (JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Version identifier to evaluate (default: the spec's version)
        #[arg(long)]
        version: Option<String>,

        /// Subject endpoint URL (overrides runtime.config.endpoint)
        #[arg(long)]
        subject_url: Option<String>,

        /// Write the aggregated summary to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Apply a changeset: patch the config and grow the golden set
    Apply {
        /// Path to the changeset JSON file
        #[arg(short, long)]
        changeset: PathBuf,
    },

    /// Per-version metrics summary from the trace history
    Metrics,

    /// Inspect trace events
    Traces {
        #[command(subcommand)]
        action: TracesAction,
    },

    /// Inspect or extend the memory bank
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

#[derive(Subcommand)]
enum TracesAction {
    /// Show the most recent trace events
    Tail {
        /// Maximum number of events to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// List memory entries
    List {
        /// Filter by entry kind (best_practice, failure_pattern,
        /// config_change, eval_outcome, prompt_tweak)
        #[arg(short, long)]
        kind: Option<String>,

        /// Filter by subject id
        #[arg(short, long)]
        subject: Option<String>,

        /// Keep only the most recent N entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Record a best practice
    AddBestPractice {
        #[arg(long)]
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        #[arg(long, default_value = "general")]
        category: String,

        #[arg(long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(format, level);

    match cli.command {
        Commands::Eval {
            spec,
            version,
            subject_url,
            out,
        } => cmd_eval(&cli.data_dir, &spec, version, subject_url, out).await,
        Commands::Apply { changeset } => cmd_apply(&cli.data_dir, &changeset),
        Commands::Metrics => cmd_metrics(&cli.data_dir),
        Commands::Traces {
            action: TracesAction::Tail { limit },
        } => cmd_traces_tail(&cli.data_dir, limit),
        Commands::Memory { action } => cmd_memory(&cli.data_dir, action),
    }
}

async fn cmd_eval(
    data_dir: &std::path::Path,
    spec_path: &std::path::Path,
    version: Option<String>,
    subject_url: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let spec = SubjectSpec::load_from_file(spec_path)
        .with_context(|| format!("load subject spec {:?}", spec_path))?;

    let endpoint = subject_url
        .or_else(|| spec.runtime_str("endpoint").map(String::from))
        .context("no subject endpoint: pass --subject-url or set runtime.config.endpoint")?;
    let subject = Arc::new(HttpSubjectClient::new(spec.subject_id.clone(), endpoint)?);

    let mut packs: Vec<Arc<dyn ScoringPack>> =
        vec![Arc::new(AnswerRulePack::from_spec(&spec))];
    if MetricFilter::from_spec(&spec).wants_judge_score() && !judge_disabled_by_env() {
        let judge = HttpJudgeClient::from_env(&spec)?;
        packs.push(Arc::new(JudgeScorePack::from_spec(Arc::new(judge), &spec)));
    } else {
        info!("judge metrics disabled, running rule metrics only");
    }

    let engine = EvaluationEngine::new(
        subject,
        packs,
        spec,
        TraceStore::in_dir(data_dir),
        MemoryStore::in_dir(data_dir),
    );

    let summary = engine.run_full_eval(version.as_deref()).await?;

    println!(
        "Evaluated {} testcases for {} @ {}",
        summary.num_testcases, summary.subject_id, summary.version_id
    );
    println!("  golden set: {}", summary.golden_path.display());
    print_metric("avg judge score", summary.metrics.judge_score_avg);
    print_metric("p95 judge score", summary.metrics.judge_score_p95);
    print_metric("p95 latency ms", summary.metrics.latency_ms_p95);
    print_metric(
        "task success rate",
        summary.metrics.task_success_rate.map(|r| r * 100.0),
    );

    if let Some(out) = out {
        write_summary_json(&out, &summary)?;
        println!("Wrote summary to {}", out.display());
    }
    Ok(())
}

fn print_metric(label: &str, value: Option<f64>) {
    match value {
        Some(v) => println!("  {label}: {v:.2}"),
        None => println!("  {label}: N/A"),
    }
}

fn cmd_apply(data_dir: &std::path::Path, changeset_path: &std::path::Path) -> Result<()> {
    let changeset = Changeset::from_file(changeset_path)
        .with_context(|| format!("load changeset {:?}", changeset_path))?;

    let outcome = ChangesetEngine::new()
        .with_memory(MemoryStore::in_dir(data_dir))
        .apply(&changeset)?;

    println!("Applied changeset:");
    println!("  new config: {}", outcome.new_config_path.display());
    println!("  patches applied: {}", outcome.patches_applied);
    println!("  testcases appended: {}", outcome.testcases_appended);
    Ok(())
}

fn cmd_metrics(data_dir: &std::path::Path) -> Result<()> {
    let traces = TraceStore::in_dir(data_dir).load()?;
    if traces.is_empty() {
        println!("No traces found. Run some evals first.");
        return Ok(());
    }
    let metrics = summarize_traces(&traces);
    print!("{}", render_metrics_md(&metrics));
    Ok(())
}

fn cmd_traces_tail(data_dir: &std::path::Path, limit: usize) -> Result<()> {
    let traces = TraceStore::in_dir(data_dir).tail(limit)?;
    if traces.is_empty() {
        println!("No traces found.");
        return Ok(());
    }
    for trace in traces {
        println!("{}", serde_json::to_string(&trace)?);
    }
    Ok(())
}

fn cmd_memory(data_dir: &std::path::Path, action: MemoryAction) -> Result<()> {
    let memory = MemoryStore::in_dir(data_dir);
    match action {
        MemoryAction::List {
            kind,
            subject,
            limit,
        } => {
            let mut filter = MemoryFilter::all();
            if let Some(kind) = kind {
                filter.kind = Some(
                    MemoryEntryKind::from_str(&kind).map_err(|e| anyhow::anyhow!(e))?,
                );
            }
            filter.subject_id = subject;
            filter.limit = limit;

            let entries = memory.load(&filter)?;
            if entries.is_empty() {
                println!("No memory entries found.");
                return Ok(());
            }
            for entry in entries {
                println!("{}", serde_json::to_string(&entry)?);
            }
        }
        MemoryAction::AddBestPractice {
            id,
            title,
            description,
            category,
            source,
        } => {
            let memory_id = memory.record_best_practice(&BestPractice {
                id,
                title,
                description,
                category,
                source,
            })?;
            println!("Recorded best practice ({memory_id})");
        }
    }
    Ok(())
}
