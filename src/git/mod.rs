pub mod cli;
mod command;
#[cfg(test)]
pub mod fake;
pub mod numstat;

use crate::error::OracleError;
use crate::types::ChangeStats;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub use cli::GitCli;

/// Questions the analysis asks about a repository. Backed by the `git`
/// binary in production and by an in-memory fake in tests.
pub trait VcsOracle: Send + Sync {
    /// Commits reachable from HEAD with a timestamp at or after `cutoff`.
    fn commit_count_since(&self, repo: &Path, cutoff: DateTime<Utc>) -> Result<u64, OracleError>;

    /// Timestamp of the newest commit on HEAD, `None` if there is none.
    fn last_commit_timestamp(&self, repo: &Path) -> Result<Option<DateTime<Utc>>, OracleError>;

    fn change_stats_since(&self, repo: &Path, cutoff: DateTime<Utc>) -> Result<ChangeStats, OracleError>;

    /// Paths of tracked files, relative to `repo`.
    fn tracked_file_list(&self, repo: &Path) -> Result<Vec<PathBuf>, OracleError>;

    fn line_count(&self, path: &Path) -> Result<u64, OracleError>;
}
