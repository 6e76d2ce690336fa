use crate::analyzers::size::MIN_REPOSITORY_SIZE;
use crate::types::*;
use chrono::{DateTime, Utc};

const TIER_HIGH:   f64 = 70.0;
const TIER_MEDIUM: f64 = 40.0;

const CHANGE_WEIGHT:    f64 = 0.4;
const COMMIT_WEIGHT:    f64 = 3.0;
const COMMIT_CAP:       f64 = 30.0;
const MAX_SCORE:        f64 = 100.0;
const SECONDS_PER_DAY:  f64 = 86_400.0;

// (age in days strictly below, points)
const RECENCY_STEPS: &[(f64, f64)] = &[
    (7.0,  30.0),
    (30.0, 20.0),
    (90.0, 10.0),
];

/// Derives every scored field of a repository from its raw metrics.
pub fn assess(metrics: ChangeMetrics, repo_size: u64, now: DateTime<Utc>) -> Assessment {
    let total_changes = metrics.total_changes();
    let change_percentage = change_percentage(total_changes, repo_size);
    let risk_score = risk_score(&metrics, change_percentage, now);
    Assessment {
        metrics,
        total_changes,
        change_percentage,
        risk_score,
        recommended_priority: get_tier(risk_score),
    }
}

/// Changed lines as a percentage of the repository's size.
pub fn change_percentage(total_changes: u64, repo_size: u64) -> f64 {
    let size = repo_size.max(MIN_REPOSITORY_SIZE);
    total_changes as f64 / size as f64 * 100.0
}

/// Composite score in `[0, 100]`: change volume, commit frequency, recency.
pub fn risk_score(metrics: &ChangeMetrics, change_percentage: f64, now: DateTime<Utc>) -> f64 {
    let change_component = change_percentage.max(0.0) * CHANGE_WEIGHT;
    let commit_component = (metrics.commit_count as f64 * COMMIT_WEIGHT).min(COMMIT_CAP);
    let recency = recency_component(metrics.last_commit_date, now);

    (change_component + commit_component + recency).min(MAX_SCORE)
}

fn recency_component(last_commit: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    // No commit at all earns nothing; it is not "very old".
    let Some(last) = last_commit else { return 0.0 };

    let days = (now - last).num_seconds() as f64 / SECONDS_PER_DAY;
    RECENCY_STEPS.iter()
        .find(|(limit, _)| days < *limit)
        .map_or(0.0, |(_, points)| *points)
}

pub fn get_tier(score: f64) -> Tier {
    if score >= TIER_HIGH { Tier::High }
    else if score >= TIER_MEDIUM { Tier::Medium }
    else { Tier::Low }
}
