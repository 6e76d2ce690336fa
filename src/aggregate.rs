use crate::types::*;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Filters and orders per-repository records into the final run.
///
/// `records` must be in discovery order. Failed records skip both filters
/// and are listed after every assessed record, still in discovery order.
pub fn aggregate(
    records:          Vec<RepositoryRecord>,
    total_discovered: usize,
    config:           &AnalysisConfig,
    generated_at:     DateTime<Utc>,
    interrupted:      bool,
) -> AnalysisRun {
    let mut results: Vec<RepositoryRecord> = records.into_iter()
        .filter(|r| keep(r, config))
        .collect();

    // sort_by is stable: equal keys keep discovery order
    results.sort_by(compare_priority);

    AnalysisRun::new(generated_at, config, total_discovered, interrupted, results)
}

fn keep(record: &RepositoryRecord, config: &AnalysisConfig) -> bool {
    let Some(a) = record.assessment() else { return true };
    if a.metrics.commit_count == 0 && !config.include_inactive {
        return false;
    }
    a.change_percentage >= config.min_change
}

/// Score descending, then change percentage descending; failures last.
fn compare_priority(a: &RepositoryRecord, b: &RepositoryRecord) -> Ordering {
    match (a.assessment(), b.assessment()) {
        (Some(x), Some(y)) => y.risk_score.total_cmp(&x.risk_score)
            .then_with(|| y.change_percentage.total_cmp(&x.change_percentage)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
