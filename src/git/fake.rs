use super::VcsOracle;
use crate::error::OracleError;
use crate::types::ChangeStats;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Canned answers for one repository.
#[derive(Debug, Clone, Default)]
pub struct FakeRepo {
    pub commit_count: u64,
    pub last_commit: Option<DateTime<Utc>>,
    pub stats: ChangeStats,
    /// Relative path → line count.
    pub files: Vec<(String, u64)>,
    /// Repository has never been committed to.
    pub empty_history: bool,
    /// Fail every history query with this stderr text.
    pub history_failure: Option<String>,
    /// Every history query runs past its time limit.
    pub timed_out: bool,
    pub ls_files_failure: bool,
}

/// In-memory oracle keyed by repository path.
#[derive(Debug, Default)]
pub struct FakeOracle {
    repos: HashMap<PathBuf, FakeRepo>,
    lines: HashMap<PathBuf, u64>,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, path: impl Into<PathBuf>, repo: FakeRepo) -> Self {
        let path = path.into();
        for (file, count) in &repo.files {
            self.lines.insert(path.join(file), *count);
        }
        self.repos.insert(path, repo);
        self
    }

    fn repo(&self, path: &Path) -> Result<&FakeRepo, OracleError> {
        let repo = self.repos.get(path).ok_or_else(|| OracleError::Command {
            command: "rev-list".to_string(),
            stderr: format!("fatal: not a git repository: {}", path.display()),
        })?;
        if let Some(stderr) = &repo.history_failure {
            return Err(OracleError::Command { command: "log".to_string(), stderr: stderr.clone() });
        }
        if repo.timed_out {
            return Err(OracleError::Timeout { command: "rev-list".to_string(), timeout: Duration::from_secs(60) });
        }
        Ok(repo)
    }
}

impl VcsOracle for FakeOracle {
    fn commit_count_since(&self, repo: &Path, _cutoff: DateTime<Utc>) -> Result<u64, OracleError> {
        let r = self.repo(repo)?;
        if r.empty_history { return Err(OracleError::EmptyHistory); }
        Ok(r.commit_count)
    }

    fn last_commit_timestamp(&self, repo: &Path) -> Result<Option<DateTime<Utc>>, OracleError> {
        let r = self.repo(repo)?;
        Ok(if r.empty_history { None } else { r.last_commit })
    }

    fn change_stats_since(&self, repo: &Path, _cutoff: DateTime<Utc>) -> Result<ChangeStats, OracleError> {
        let r = self.repo(repo)?;
        if r.empty_history { return Err(OracleError::EmptyHistory); }
        Ok(r.stats)
    }

    fn tracked_file_list(&self, repo: &Path) -> Result<Vec<PathBuf>, OracleError> {
        let r = self.repos.get(repo).ok_or_else(|| OracleError::Command {
            command: "ls-files".to_string(),
            stderr: format!("fatal: not a git repository: {}", repo.display()),
        })?;
        if r.ls_files_failure {
            return Err(OracleError::Command { command: "ls-files".to_string(), stderr: "boom".to_string() });
        }
        Ok(r.files.iter().map(|(f, _)| PathBuf::from(f)).collect())
    }

    fn line_count(&self, path: &Path) -> Result<u64, OracleError> {
        self.lines.get(path).copied().ok_or_else(|| OracleError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }
}
