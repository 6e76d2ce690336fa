use crate::types::{AnalysisRun, RepositoryRecord};

const HEADER: &[&str] = &[
    "Repository",
    "Priority",
    "Risk Score",
    "Change Percentage",
    "Commit Count",
    "Files Changed",
    "Lines Added",
    "Lines Deleted",
    "Last Commit Date",
    "Path",
    "Error",
];

/// One header line plus one line per record. Failed records leave every
/// metric cell empty and fill the Error column.
pub fn render_csv(run: &AnalysisRun) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|s| s.to_string()));
    for record in run.results() {
        push_row(&mut out, fields(record).into_iter());
    }
    out
}

fn fields(r: &RepositoryRecord) -> Vec<String> {
    let path = r.path.display().to_string();
    match r.assessment() {
        Some(a) => vec![
            r.name.clone(),
            a.recommended_priority.to_string(),
            format!("{:.2}", a.risk_score),
            format!("{:.2}", a.change_percentage),
            a.metrics.commit_count.to_string(),
            a.metrics.stats.files_changed.to_string(),
            a.metrics.stats.lines_added.to_string(),
            a.metrics.stats.lines_deleted.to_string(),
            a.metrics.last_commit_date
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            path,
            String::new(),
        ],
        None => {
            let mut row = vec![r.name.clone()];
            row.extend(vec![String::new(); 8]);
            row.push(path);
            row.push(r.error().unwrap_or_default().to_string());
            row
        }
    }
}

fn push_row(out: &mut String, cells: impl Iterator<Item = String>) {
    let line: Vec<String> = cells.map(|c| escape(&c)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

/// RFC 4180 quoting: wrap in quotes when needed, double embedded quotes.
fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::types::*;
    use chrono::{TimeZone, Utc};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            root: PathBuf::from("/repos"),
            period: Duration::from_secs(30 * 86_400),
            period_label: "1m".to_string(),
            min_change: 0.0,
            include_inactive: false,
            jobs: 1,
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_csv_rows() {
        let at = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        let ok = RepositoryRecord::assessed(Path::new("/repos/api"), Assessment {
            metrics: ChangeMetrics {
                commit_count: 12,
                last_commit_date: Some(at),
                stats: ChangeStats { files_changed: 5, lines_added: 70, lines_deleted: 30 },
            },
            total_changes: 100,
            change_percentage: 10.0,
            risk_score: 70.0,
            recommended_priority: Tier::High,
        });
        let bad = RepositoryRecord::failed(Path::new("/repos/x"), "git log failed: \"bad\", really");
        let run = aggregate(vec![ok, bad], 2, &config(), at, false);

        let text = render_csv(&run);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Repository,Priority,Risk Score"));
        assert_eq!(lines[1], "api,HIGH,70.00,10.00,12,5,70,30,2025-02-03 04:05:06,/repos/api,");
        assert_eq!(lines[2], "x,,,,,,,,,/repos/x,\"git log failed: \"\"bad\"\", really\"");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
