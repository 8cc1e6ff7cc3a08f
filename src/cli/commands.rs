//! CLI command definitions for ci-benchmarker.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::benchmark::{BenchmarkConfig, BenchmarkRunner, ExecutorKind, RunReport};
use crate::executor::{Executor, HttpExecutor, HttpExecutorConfig, LocalExecutor};
use crate::metrics::{export_metrics, init_metrics};
use crate::persister::{JobRecord, MemoryPersister, Persister, SqlitePersister};

/// Default number of records shown by `history`.
const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Fan out identical jobs to a CI backend and record their identifiers.
#[derive(Parser)]
#[command(name = "ci-benchmarker")]
#[command(about = "Launch N identical CI jobs concurrently and record their identifiers")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Source of the effective log filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilter {
    /// `RUST_LOG` directives.
    Env,
    /// `DEBUG=true` forces the debug level.
    Debug,
    /// The `--log-level` flag.
    Level(String),
}

impl Cli {
    /// Picks the log filter: `RUST_LOG` wins, then `DEBUG=true`, then
    /// `--log-level`.
    pub fn log_filter(&self, rust_log: Option<&str>, debug: Option<&str>) -> LogFilter {
        if rust_log.is_some_and(|v| !v.trim().is_empty()) {
            LogFilter::Env
        } else if debug == Some("true") {
            LogFilter::Debug
        } else {
            LogFilter::Level(self.log_level.clone())
        }
    }
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run a benchmark: launch the configured number of jobs and store them.
    Run(RunArgs),

    /// List job records stored in a SQLite database.
    History(HistoryArgs),
}

/// Arguments for `ci-benchmarker run`.
///
/// Flags override the matching `BENCHMARK_*` environment variables.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Number of jobs to launch.
    #[arg(short = 'n', long)]
    pub jobs: Option<usize>,

    /// Executor backend.
    #[arg(short = 'e', long, value_enum)]
    pub executor: Option<ExecutorKind>,

    /// Trigger URL for the http executor.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bearer token for the http executor.
    #[arg(long, env = "BENCHMARK_EXECUTOR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SQLite URL for job records (e.g. sqlite://jobs.db). Records are kept
    /// in memory when omitted.
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    /// Per-job deadline in seconds covering launch and store.
    #[arg(long)]
    pub unit_timeout: Option<u64>,

    /// Print Prometheus metrics after the run.
    #[arg(long)]
    pub metrics: bool,

    /// Exit with an error if any job failed to launch or store.
    #[arg(long)]
    pub fail_on_error: bool,

    /// Output JSON summary.
    #[arg(short = 'j', long)]
    pub json: bool,
}

impl RunArgs {
    /// Layers these flags over `config`.
    fn apply(&self, mut config: BenchmarkConfig) -> BenchmarkConfig {
        if let Some(jobs) = self.jobs {
            config.job_count = jobs;
        }
        if let Some(executor) = self.executor {
            config.executor = executor;
        }
        if let Some(ref endpoint) = self.endpoint {
            config.executor_url = Some(endpoint.clone());
        }
        if let Some(ref token) = self.token {
            config.executor_token = Some(token.clone());
        }
        if let Some(ref database) = self.database {
            config.database_url = Some(database.clone());
        }
        if let Some(secs) = self.unit_timeout {
            config.unit_timeout = Some(Duration::from_secs(secs));
        }
        config
    }
}

/// Arguments for `ci-benchmarker history`.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// SQLite URL of the job store.
    #[arg(short = 'd', long, env = "BENCHMARK_DATABASE_URL")]
    pub database: String,

    /// Maximum number of records to show.
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub limit: i64,

    /// Output JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_benchmark_command(args).await,
        Commands::History(args) => run_history_command(args).await,
    }
}

fn build_executor(config: &BenchmarkConfig) -> anyhow::Result<Arc<dyn Executor>> {
    match config.executor {
        ExecutorKind::Local => Ok(Arc::new(LocalExecutor::new())),
        ExecutorKind::Http => {
            let endpoint = config
                .executor_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--endpoint is required for the http executor"))?;

            let mut http_config =
                HttpExecutorConfig::new(endpoint).with_timeout(config.http_timeout);
            if let Some(ref token) = config.executor_token {
                http_config = http_config.with_token(token);
            }

            Ok(Arc::new(HttpExecutor::new(http_config)?))
        }
    }
}

async fn build_persister(config: &BenchmarkConfig) -> anyhow::Result<Arc<dyn Persister>> {
    match config.database_url {
        Some(ref url) => {
            let persister = SqlitePersister::connect(url).await?;
            persister.run_migrations().await?;
            Ok(Arc::new(persister))
        }
        None => Ok(Arc::new(MemoryPersister::new())),
    }
}

async fn run_benchmark_command(args: RunArgs) -> anyhow::Result<()> {
    let config = args.apply(BenchmarkConfig::from_lookup(|key| std::env::var(key).ok())?);
    config.validate()?;

    if args.metrics {
        init_metrics()?;
    }

    let executor = build_executor(&config)?;
    let persister = build_persister(&config).await?;

    let mut runner = BenchmarkRunner::new(config.job_count, executor, persister);
    if let Some(timeout) = config.unit_timeout {
        runner = runner.with_unit_timeout(timeout);
    }

    info!(
        jobs = config.job_count,
        executor = runner.executor().name(),
        persister = runner.persister().name(),
        "Starting benchmark run"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling in-flight jobs");
            let _ = shutdown_tx.send(true);
        }
    });

    let report = runner.run_until(shutdown_rx).await;
    signal_task.abort();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if args.metrics {
        print!("{}", export_metrics());
    }

    if args.fail_on_error && !report.is_success() {
        return Err(anyhow::anyhow!(
            "{} of {} jobs failed",
            report.failed(),
            report.attempted()
        ));
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n=== Benchmark Results ===");
    println!("Attempted:        {}", report.attempted());
    println!("Stored:           {}", report.stored());
    println!("Execute failures: {}", report.execute_failures());
    println!("Store failures:   {}", report.store_failures());
    println!("Timed out:        {}", report.timed_out());
    println!("Cancelled:        {}", report.cancelled());
    println!("Panicked:         {}", report.panicked());
    println!("Success rate:     {:.1}%", report.success_rate());
    println!("Duration:         {}ms", report.duration_ms);
    println!();

    for unit in &report.units {
        match unit.outcome.job_id() {
            Some(job_id) => println!(
                "  #{} [{}] {} ({}ms)",
                unit.unit, unit.outcome, job_id, unit.duration_ms
            ),
            None => println!("  #{} [{}] ({}ms)", unit.unit, unit.outcome, unit.duration_ms),
        }
    }
}

#[derive(Debug, Serialize)]
struct HistoryOutput {
    total: i64,
    records: Vec<JobRecord>,
}

async fn run_history_command(args: HistoryArgs) -> anyhow::Result<()> {
    let persister = SqlitePersister::connect(&args.database).await?;
    persister.run_migrations().await?;

    let output = HistoryOutput {
        total: persister.count_jobs().await?,
        records: persister.list_jobs(Some(args.limit)).await?,
    };
    persister.close().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} stored jobs (showing {})", output.total, output.records.len());
    for record in &output.records {
        println!("  {}  {}", record.stored_at.to_rfc3339(), record.id);
    }

    Ok(())
}
