use crate::error::MalformedMetricError;
use crate::types::ChangeStats;
use std::collections::HashSet;
use tracing::debug;

/// Folds `git log --numstat --format=` output into window totals.
///
/// Each non-blank line is `<added>\t<deleted>\t<path>`. Binary files report
/// `-` for both counts; those fields, and any other non-numeric field, add
/// nothing to the sums but the path still counts as touched.
pub fn parse_numstat(output: &str) -> ChangeStats {
    let mut files: HashSet<&str> = HashSet::new();
    let mut stats = ChangeStats::default();

    for line in output.lines() {
        let trimmed = line.trim_end_matches('\r');
        if trimmed.trim().is_empty() {
            continue;
        }

        let mut parts = trimmed.splitn(3, '\t');
        let (Some(added_raw), Some(deleted_raw), Some(path)) =
            (parts.next(), parts.next(), parts.next())
        else {
            debug!(line = trimmed, "skipping numstat line without three fields");
            continue;
        };
        if path.is_empty() {
            continue;
        }

        stats.lines_added += count_or_zero(added_raw);
        stats.lines_deleted += count_or_zero(deleted_raw);
        files.insert(path);
    }

    stats.files_changed = files.len() as u64;
    stats
}

fn count_or_zero(raw: &str) -> u64 {
    parse_count(raw).unwrap_or_else(|e| {
        debug!("{e}; counting as 0");
        0
    })
}

pub fn parse_count(raw: &str) -> Result<u64, MalformedMetricError> {
    raw.trim().parse().map_err(|_| MalformedMetricError { field: raw.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sums_added_and_deleted() {
        let out = "10\t2\tsrc/a.rs\n3\t0\tsrc/b.rs\n\n1\t1\tsrc/a.rs\n";
        let stats = parse_numstat(out);
        assert_eq!(stats.lines_added, 14);
        assert_eq!(stats.lines_deleted, 3);
        assert_eq!(stats.files_changed, 2, "src/a.rs touched twice counts once");
    }

    #[test]
    fn test_binary_marker_contributes_zero_but_counts_file() {
        let out = "-\t-\tassets/logo.png\n5\t1\tsrc/main.rs\n";
        let stats = parse_numstat(out);
        assert_eq!(stats.lines_added, 5);
        assert_eq!(stats.lines_deleted, 1);
        assert_eq!(stats.files_changed, 2);
    }

    #[test]
    fn test_garbage_field_does_not_abort_parsing() {
        let out = "abc\t4\tweird.txt\nnot a numstat line\n7\t7\tok.rs\n";
        let stats = parse_numstat(out);
        assert_eq!(stats.lines_added, 7, "only the numeric added counts survive");
        assert_eq!(stats.lines_deleted, 11);
        assert_eq!(stats.files_changed, 2, "line without tabs is skipped entirely");
    }

    #[test]
    fn test_paths_with_spaces_are_kept_whole() {
        let out = "1\t0\tdocs/my file.md\n1\t0\tdocs/my other file.md\n";
        let stats = parse_numstat(out);
        assert_eq!(stats.files_changed, 2);
    }

    #[test]
    fn test_empty_output_is_all_zero() {
        assert_eq!(parse_numstat(""), ChangeStats::default());
    }

    #[test]
    fn test_parse_count_reports_field() {
        assert_eq!(parse_count("42"), Ok(42));
        let err = parse_count("-").unwrap_err();
        assert_eq!(err.field, "-");
    }
}
