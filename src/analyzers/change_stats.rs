use crate::error::{OracleError, RepositoryAnalysisError};
use crate::git::VcsOracle;
use crate::types::{ChangeMetrics, ChangeStats};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

/// Collects commit and line metrics for commits at or after `cutoff`.
///
/// A repository without any commit is not an error: every metric is zero
/// and there is no last-commit time. The last-commit time is read from HEAD
/// regardless of the window, so an idle repository still reports it.
pub fn extract_change_metrics(
    oracle: &dyn VcsOracle,
    repo:   &Path,
    cutoff: DateTime<Utc>,
) -> Result<ChangeMetrics, RepositoryAnalysisError> {
    let commit_count = match oracle.commit_count_since(repo, cutoff) {
        Ok(n) => n,
        Err(OracleError::EmptyHistory) => {
            debug!(repo = %repo.display(), "no commits yet");
            return Ok(ChangeMetrics::default());
        }
        Err(e) => return Err(RepositoryAnalysisError::CommitInfo(e)),
    };

    let last_commit_date = oracle
        .last_commit_timestamp(repo)
        .map_err(RepositoryAnalysisError::CommitInfo)?;

    let stats = match oracle.change_stats_since(repo, cutoff) {
        Ok(s) => s,
        Err(OracleError::EmptyHistory) => ChangeStats::default(),
        Err(e) => return Err(RepositoryAnalysisError::ChangeStats(e)),
    };

    Ok(ChangeMetrics { commit_count, last_commit_date, stats })
}
