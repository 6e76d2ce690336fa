use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Walking the root directory failed. Discovery results cannot be trusted
/// partially, so this aborts the whole run.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("cannot scan {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("root directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),
}

/// Failures that stop a run before any report can be produced.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("cannot start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// A query against the version-control tool failed.
#[derive(Error, Debug)]
pub enum OracleError {
    /// HEAD is unborn. Callers treat this as "zero metrics", not a failure.
    #[error("repository has no commits")]
    EmptyHistory,

    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("git {command} timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected git output for {command}: {output:?}")]
    Unparsable { command: String, output: String },
}

/// Failure scoped to one repository. Stored on that repository's record.
#[derive(Error, Debug)]
pub enum RepositoryAnalysisError {
    #[error("Not a valid git repository")]
    NotARepository,

    #[error("Failed to get commit info: {0}")]
    CommitInfo(#[source] OracleError),

    #[error("Failed to get change stats: {0}")]
    ChangeStats(#[source] OracleError),
}

/// A single numstat field that is not a number (binary marker or garbage).
/// Recovered where it occurs: the field contributes zero.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("malformed metric {field:?}")]
pub struct MalformedMetricError {
    pub field: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Config file '{}': {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("Invalid time period '{0}'. Use e.g. 6m, 1y, 2w, 720h")]
    Period(String),

    #[error("Invalid setting: {0}")]
    Setting(String),
}
