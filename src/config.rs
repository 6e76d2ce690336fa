use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PERIOD: &str = "6m";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DAY_SECS:   u64 = 86_400;
const MONTH_DAYS: u64 = 30;
const YEAR_DAYS:  u64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// All settings that can be placed in a .pentest-scheduler.yml config file.
/// Every field is optional; omitted fields fall back to CLI defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    pub dir: Option<String>,
    pub period: Option<String>,
    pub format: Option<OutputFormat>,
    pub output: Option<String>,
    pub min_change: Option<f64>,
    pub include_inactive: Option<bool>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
}

impl SchedulerConfig {
    /// Validates semantic constraints that serde cannot enforce.
    ///
    /// Returns a human-readable error describing exactly what is wrong and what
    /// values are accepted. Called automatically by [`load_config`].
    pub fn validate(&self) -> Result<(), String> {
        if let Some(p) = &self.period {
            parse_period(p).map_err(|e| e.to_string())?;
        }

        if let Some(v) = self.min_change {
            validate_min_change(v)?;
        }

        if let Some(0) = self.jobs {
            return Err("Invalid 'jobs' value: 0. Must be 1 or greater".to_string());
        }

        // a zero timeout would fail every git call immediately
        if let Some(0) = self.timeout_secs {
            return Err("Invalid 'timeout_secs' value: 0. Must be 1 or greater".to_string());
        }

        Ok(())
    }
}

pub fn validate_min_change(v: f64) -> Result<(), String> {
    if !v.is_finite() || v < 0.0 {
        return Err(format!(
            "Invalid 'min_change' value: {v}. Must be a percentage of 0 or greater"
        ));
    }
    Ok(())
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<SchedulerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let cfg: SchedulerConfig = serde_yaml::from_str(&content)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    cfg.validate()
        .map_err(|message| ConfigError::Invalid { path: path.to_path_buf(), message })?;
    Ok(cfg)
}

// ─── Time periods ─────────────────────────────────────────────────────────────

static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+\s*(?:months?|years?|[hdwmy])\s*)+$").unwrap()
});

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*(months?|years?|[hdwmy])").unwrap()
});

/// Parses an analysis window such as `6m`, `1year`, `2w` or `720h`.
///
/// Terms can be chained (`1y6m`). A month is 30 days and a year 365.
pub fn parse_period(raw: &str) -> Result<Duration, ConfigError> {
    let text = raw.trim().to_ascii_lowercase();
    if !PERIOD_RE.is_match(&text) {
        return Err(ConfigError::Period(raw.to_string()));
    }

    let mut secs: u64 = 0;
    for cap in TERM_RE.captures_iter(&text) {
        let n: u64 = cap[1].parse().map_err(|_| ConfigError::Period(raw.to_string()))?;
        let unit = match &cap[2] {
            "h"                  => 3_600,
            "d"                  => DAY_SECS,
            "w"                  => 7 * DAY_SECS,
            "m" | "month" | "months" => MONTH_DAYS * DAY_SECS,
            _                    => YEAR_DAYS * DAY_SECS,
        };
        secs = n.checked_mul(unit)
            .and_then(|s| secs.checked_add(s))
            .ok_or_else(|| ConfigError::Period(raw.to_string()))?;
    }

    if secs == 0 {
        return Err(ConfigError::Period(raw.to_string()));
    }
    Ok(Duration::from_secs(secs))
}

/// Expands a leading `~/` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(raw)
}

/// Annotated YAML template printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# pentest-scheduler configuration file
# Generated by: pentest-scheduler --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.
#
#   pentest-scheduler --config .pentest-scheduler.yml

# ── Scope ──────────────────────────────────────────────────────────────────────

# Directory that is searched recursively for git repositories.
# dir: "~/dev"

# Analysis window. Units: h, d, w, m (30 days), y (365 days); terms can be
# chained, e.g. "1y6m". Aliases like "6months" and "1year" also work.
# period: "6m"

# ── Filters ────────────────────────────────────────────────────────────────────

# Hide repositories whose changed lines are below this percentage of their size.
# min_change: 0.0

# List repositories that had no commits in the window.
# include_inactive: false

# ── Output ─────────────────────────────────────────────────────────────────────

# Output format: table, json, csv
# format: "table"

# Write the report to this file instead of stdout.
# output: "pentest-priorities.json"

# Show per-repository progress logs.
# verbose: false

# ── Resources ──────────────────────────────────────────────────────────────────

# Repositories analyzed in parallel. Defaults to the number of CPUs.
# jobs: 8

# Seconds a single git call may take before the repository is marked failed.
# timeout_secs: 60
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<(), std::io::Error> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
