use crate::aggregate::aggregate;
use crate::analyzers::change_stats::extract_change_metrics;
use crate::analyzers::size::estimate_size;
use crate::discovery::{find_git_repos, MARKER_DIR};
use crate::error::{RepositoryAnalysisError, RunError};
use crate::git::VcsOracle;
use crate::scoring::assess;
use crate::types::*;
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Discovers, analyzes and ranks every repository under `config.root`.
///
/// Repositories are analyzed on a pool of `config.jobs` threads. Once
/// `cancel` is set no further repository is started; the ones already
/// running finish and the run is marked interrupted.
pub fn analyze_repositories(
    config:   &AnalysisConfig,
    oracle:   &dyn VcsOracle,
    now:      DateTime<Utc>,
    cancel:   &AtomicBool,
    progress: &ProgressBar,
) -> Result<AnalysisRun, RunError> {
    let repos = find_git_repos(&config.root)?;
    info!("found {} repositories under {}", repos.len(), config.root.display());
    progress.set_length(repos.len() as u64);

    let cutoff = cutoff(now, config);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.max(1))
        .thread_name(|i| format!("analyze-{i}"))
        .build()?;

    let outcomes: Vec<Option<RepositoryRecord>> = pool.install(|| {
        repos.par_iter()
            .map(|repo| {
                if cancel.load(Ordering::SeqCst) {
                    return None;
                }
                progress.set_message(short_name(repo));
                let record = analyze_repository(oracle, repo, cutoff, now);
                progress.inc(1);
                Some(record)
            })
            .collect()
    });

    let skipped = outcomes.iter().filter(|o| o.is_none()).count();
    let interrupted = skipped > 0 || cancel.load(Ordering::SeqCst);
    if interrupted {
        warn!("interrupted: {skipped} of {} repositories were not analyzed", repos.len());
    }

    let records: Vec<RepositoryRecord> = outcomes.into_iter().flatten().collect();
    Ok(aggregate(records, repos.len(), config, now, interrupted))
}

/// Analyzes one repository. Never fails: problems become an error record.
pub fn analyze_repository(
    oracle: &dyn VcsOracle,
    repo:   &Path,
    cutoff: DateTime<Utc>,
    now:    DateTime<Utc>,
) -> RepositoryRecord {
    debug!(repo = %repo.display(), "analyzing");

    if !repo.join(MARKER_DIR).is_dir() {
        return RepositoryRecord::failed(repo, RepositoryAnalysisError::NotARepository.to_string());
    }

    match extract_change_metrics(oracle, repo, cutoff) {
        Ok(metrics) => {
            let size = estimate_size(oracle, repo);
            let assessment = assess(metrics, size, now);
            debug!(
                repo = %repo.display(),
                commits = assessment.metrics.commit_count,
                size,
                score = assessment.risk_score,
                "scored"
            );
            RepositoryRecord::assessed(repo, assessment)
        }
        Err(e) => {
            warn!(repo = %repo.display(), "{e}");
            RepositoryRecord::failed(repo, e.to_string())
        }
    }
}

fn cutoff(now: DateTime<Utc>, config: &AnalysisConfig) -> DateTime<Utc> {
    chrono::Duration::from_std(config.period)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn short_name(repo: &Path) -> String {
    repo.file_name().and_then(|n| n.to_str()).unwrap_or("repo").to_string()
}
