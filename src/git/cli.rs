use super::command::run_git;
use super::numstat::parse_numstat;
use super::VcsOracle;
use crate::error::OracleError;
use crate::types::ChangeStats;
use chrono::{DateTime, TimeZone, Utc};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// [`VcsOracle`] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    pub fn new(timeout: Duration) -> Self {
        GitCli { timeout }
    }

    fn git(&self, repo: &Path, args: &[&str]) -> Result<String, OracleError> {
        run_git(repo, args, self.timeout)
    }
}

/// `--since` argument in the same layout git itself prints for `%ci`.
fn since_arg(cutoff: DateTime<Utc>) -> String {
    format!("--since={}", cutoff.format("%Y-%m-%d %H:%M:%S +0000"))
}

impl VcsOracle for GitCli {
    fn commit_count_since(&self, repo: &Path, cutoff: DateTime<Utc>) -> Result<u64, OracleError> {
        let since = since_arg(cutoff);
        let out = self.git(repo, &["rev-list", "--count", &since, "HEAD"])?;
        let trimmed = out.trim();
        trimmed.parse().map_err(|_| OracleError::Unparsable {
            command: "rev-list".to_string(),
            output: trimmed.to_string(),
        })
    }

    fn last_commit_timestamp(&self, repo: &Path) -> Result<Option<DateTime<Utc>>, OracleError> {
        let out = match self.git(repo, &["log", "-1", "--format=%ct", "HEAD"]) {
            Ok(out) => out,
            Err(OracleError::EmptyHistory) => return Ok(None),
            Err(e) => return Err(e),
        };
        let trimmed = out.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let secs: i64 = trimmed.parse().map_err(|_| OracleError::Unparsable {
            command: "log".to_string(),
            output: trimmed.to_string(),
        })?;
        Ok(Utc.timestamp_opt(secs, 0).single())
    }

    fn change_stats_since(&self, repo: &Path, cutoff: DateTime<Utc>) -> Result<ChangeStats, OracleError> {
        let since = since_arg(cutoff);
        let out = self.git(repo, &["log", &since, "--numstat", "--no-renames", "--format=", "HEAD"])?;
        Ok(parse_numstat(&out))
    }

    fn tracked_file_list(&self, repo: &Path) -> Result<Vec<PathBuf>, OracleError> {
        let out = self.git(repo, &["ls-files", "-z"])?;
        Ok(out.split('\0').filter(|p| !p.is_empty()).map(PathBuf::from).collect())
    }

    fn line_count(&self, path: &Path) -> Result<u64, OracleError> {
        let io_err = |source| OracleError::Io { path: path.to_path_buf(), source };
        let mut reader = BufReader::new(File::open(path).map_err(io_err)?);

        let mut buf = [0u8; 64 * 1024];
        let mut lines = 0u64;
        let mut last: Option<u8> = None;
        loop {
            let n = reader.read(&mut buf).map_err(io_err)?;
            if n == 0 { break; }
            lines += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
            last = Some(buf[n - 1]);
        }
        // A final line without a trailing newline still counts.
        if matches!(last, Some(b) if b != b'\n') {
            lines += 1;
        }
        Ok(lines)
    }
}
