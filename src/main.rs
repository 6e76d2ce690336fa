mod aggregate;
mod analyzers;
mod config;
mod discovery;
mod error;
mod git;
mod pipeline;
mod reporters;
mod scoring;
mod types;

use anyhow::Context;
use clap::Parser;
use config::{OutputFormat, SchedulerConfig};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use types::*;

const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "pentest-scheduler",
    about = "Rank git repositories for penetration testing by recent change activity",
    version,
    long_about = "Recursively finds git repositories under a directory, measures how much\n\
                  each one changed within a time window, and ranks them by a 0–100 risk\n\
                  score so the most active code gets tested first."
)]
struct Args {
    /// Directory containing git repositories (searched recursively). Defaults to "."
    #[arg(value_name = "DIR")]
    dir: Option<String>,

    /// Time window to analyze, e.g. 1m, 3m, 6m, 1y, 2w, 720h [default: 6m]
    #[arg(long)]
    period: Option<String>,

    /// Output format [default: table]
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Minimum change percentage a repository needs to be listed [default: 0]
    #[arg(long = "min-change")]
    min_change: Option<f64>,

    /// Also list repositories without commits in the window
    #[arg(long)]
    include_inactive: bool,

    /// Repositories analyzed in parallel [default: number of CPUs]
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// Seconds a single git call may run before the repository is marked failed [default: 60]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Load settings from a YAML file (CLI flags take precedence)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print an annotated config template (to --output if given) and exit
    #[arg(long)]
    generate_config: bool,

    /// Log per-repository progress to stderr
    #[arg(long, short)]
    verbose: bool,
}

/// Everything `main` needs after merging CLI flags, config file and defaults.
#[derive(Debug)]
struct Settings {
    analysis: AnalysisConfig,
    format:   OutputFormat,
    output:   Option<PathBuf>,
    verbose:  bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.generate_config {
        return match config::print_template(args.output.as_deref()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: cannot write config template: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let file_cfg = match &args.config {
        Some(path) => config::load_config(path)?,
        None => SchedulerConfig::default(),
    };
    let settings = resolve_settings(&args, file_cfg)?;
    init_logging(settings.verbose);

    let cfg = &settings.analysis;
    eprintln!("Pentest Scheduler - Repository Change Analysis");
    eprintln!("==============================================");
    eprintln!("Analyzing repositories in: {}", cfg.root.display());
    eprintln!("Time period: {}", cfg.period_label);
    if let Some(out) = &settings.output {
        eprintln!("Output file: {}", out.display());
    }
    eprintln!();

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let pb = progress_bar(settings.verbose);
    let oracle = git::GitCli::new(cfg.timeout);
    let started = Instant::now();

    let result = pipeline::analyze_repositories(cfg, &oracle, chrono::Utc::now(), &cancel, &pb);
    pb.finish_and_clear();
    let analysis = result.context("Analysis failed")?;

    reporters::write_report(&analysis, settings.format, settings.output.as_deref())?;
    print_summary(&analysis, started.elapsed());

    if analysis.interrupted() {
        eprintln!("⚠ Interrupted: report covers only the repositories analyzed before Ctrl+C.");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    Ok(ExitCode::SUCCESS)
}

/// CLI flags win over the config file, which wins over built-in defaults.
fn resolve_settings(args: &Args, file: SchedulerConfig) -> anyhow::Result<Settings> {
    let dir = args.dir.clone().or(file.dir).unwrap_or_else(|| ".".to_string());
    let root = config::expand_home(&dir);
    let root = std::path::absolute(&root).unwrap_or(root);

    let period_label = args.period.clone()
        .or(file.period)
        .unwrap_or_else(|| config::DEFAULT_PERIOD.to_string());
    let period = config::parse_period(&period_label)?;

    let min_change = args.min_change.or(file.min_change).unwrap_or(0.0);
    config::validate_min_change(min_change).map_err(error::ConfigError::Setting)?;

    let jobs = args.jobs.or(file.jobs).unwrap_or_else(default_jobs);
    if jobs == 0 {
        return Err(error::ConfigError::Setting("--jobs must be 1 or greater".to_string()).into());
    }

    let timeout_secs = args.timeout.or(file.timeout_secs).unwrap_or(config::DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(error::ConfigError::Setting("--timeout must be 1 or greater".to_string()).into());
    }

    Ok(Settings {
        analysis: AnalysisConfig {
            root,
            period,
            period_label,
            min_change,
            include_inactive: args.include_inactive || file.include_inactive.unwrap_or(false),
            jobs,
            timeout: Duration::from_secs(timeout_secs),
        },
        format:  args.format.or(file.format).unwrap_or_default(),
        output:  args.output.clone().or_else(|| file.output.map(PathBuf::from)),
        verbose: args.verbose || file.verbose.unwrap_or(false),
    })
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "pentest_scheduler=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn progress_bar(verbose: bool) -> ProgressBar {
    // Verbose logs and a redrawing bar fight over the same stderr lines.
    if verbose {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]));
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_summary(run: &AnalysisRun, elapsed: Duration) {
    eprintln!();
    eprintln!("Analysis Summary ({}):", fmt_dur(elapsed));
    eprintln!("- Total repositories: {}", run.total_repositories());
    eprintln!("- Active repositories: {}", run.active_repositories());
    eprintln!("- High priority: {}", run.count_by_priority(Tier::High));
    eprintln!("- Medium priority: {}", run.count_by_priority(Tier::Medium));
    eprintln!("- Low priority: {}", run.count_by_priority(Tier::Low));
    let errors = run.error_count();
    if errors > 0 {
        eprintln!("- Failed to analyze: {errors}");
    }
}

// ── Duration formatting ────────────────────────────────────────────────────────

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_millis();
    if ms >= 1000 { format!("{:.1}s", d.as_secs_f64()) } else { format!("{ms}ms") }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
