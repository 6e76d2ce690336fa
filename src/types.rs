use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Fully resolved settings handed to the analysis pipeline.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub root: PathBuf,
    pub period: Duration,
    /// Human label for the window, e.g. "6m", echoed into the report.
    pub period_label: String,
    /// Minimum change percentage a repository needs to be listed.
    pub min_change: f64,
    pub include_inactive: bool,
    /// Upper bound on repositories analyzed concurrently.
    pub jobs: usize,
    /// Per-call limit for a single oracle query.
    pub timeout: Duration,
}

// ─── Oracle Data ──────────────────────────────────────────────────────────────

/// Window-scoped diff stats answered by the oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeStats {
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// Everything the extractor learns about one repository's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeMetrics {
    pub commit_count: u64,
    pub last_commit_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub stats: ChangeStats,
}

impl ChangeMetrics {
    pub fn total_changes(&self) -> u64 {
        self.stats.lines_added + self.stats.lines_deleted
    }
}

// ─── Scoring ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::High   => write!(f, "HIGH"),
            Tier::Medium => write!(f, "MEDIUM"),
            Tier::Low    => write!(f, "LOW"),
        }
    }
}

/// Metrics plus every derived field of a successfully analyzed repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    #[serde(flatten)]
    pub metrics: ChangeMetrics,
    pub total_changes: u64,
    pub change_percentage: f64,
    pub risk_score: f64,
    pub recommended_priority: Tier,
}

// ─── Records ──────────────────────────────────────────────────────────────────

/// A record is either fully assessed or carries an error and nothing derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Assessed(Assessment),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl RepositoryRecord {
    pub fn assessed(path: &Path, assessment: Assessment) -> Self {
        RepositoryRecord {
            name: repo_name(path),
            path: path.to_path_buf(),
            outcome: Outcome::Assessed(assessment),
        }
    }

    pub fn failed(path: &Path, error: impl Into<String>) -> Self {
        RepositoryRecord {
            name: repo_name(path),
            path: path.to_path_buf(),
            outcome: Outcome::Failed { error: error.into() },
        }
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        match &self.outcome {
            Outcome::Assessed(a) => Some(a),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Assessed(_) => None,
            Outcome::Failed { error } => Some(error),
        }
    }
}

fn repo_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

// ─── Run ──────────────────────────────────────────────────────────────────────

/// The finished result of one invocation. Built once by the aggregator;
/// only read accessors are exposed afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    generated_at: DateTime<Utc>,
    time_period: String,
    #[serde(skip)]
    period: Duration,
    repositories_dir: PathBuf,
    total_repositories: usize,
    active_repositories: usize,
    interrupted: bool,
    results: Vec<RepositoryRecord>,
}

impl AnalysisRun {
    pub(crate) fn new(
        generated_at:       DateTime<Utc>,
        config:             &AnalysisConfig,
        total_repositories: usize,
        interrupted:        bool,
        results:            Vec<RepositoryRecord>,
    ) -> Self {
        let active_repositories = results.iter().filter(|r| r.assessment().is_some()).count();
        AnalysisRun {
            generated_at,
            time_period: config.period_label.clone(),
            period: config.period,
            repositories_dir: config.root.clone(),
            total_repositories,
            active_repositories,
            interrupted,
            results,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> { self.generated_at }
    pub fn time_period(&self) -> &str { &self.time_period }
    pub fn period(&self) -> Duration { self.period }
    pub fn repositories_dir(&self) -> &Path { &self.repositories_dir }
    pub fn total_repositories(&self) -> usize { self.total_repositories }
    pub fn active_repositories(&self) -> usize { self.active_repositories }
    pub fn interrupted(&self) -> bool { self.interrupted }
    pub fn results(&self) -> &[RepositoryRecord] { &self.results }

    pub fn count_by_priority(&self, tier: Tier) -> usize {
        self.results.iter()
            .filter_map(|r| r.assessment())
            .filter(|a| a.recommended_priority == tier)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error().is_some()).count()
    }
}
