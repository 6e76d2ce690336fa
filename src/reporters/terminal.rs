use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use crate::types::{AnalysisRun, Assessment, RepositoryRecord, Tier};
use chrono::{DateTime, Utc};

const NAME_WIDTH: usize = 24;

/// Renders the run as a human-readable table with a priority summary.
/// `styled` turns ANSI colors on; pass `false` when writing to a file.
pub fn render_table(run: &AnalysisRun, styled: bool) -> String {
    let p = Painter { styled };
    let mut out = String::new();

    out.push('\n');
    out.push_str(&p.paint("Pentest Priority Analysis Results", |s| s.red().bold()));
    out.push('\n');
    out.push_str("=================================\n");
    out.push_str(&p.paint(
        &format!(
            "{} | window {} ({} days), {} repositories scanned",
            run.repositories_dir().display(),
            run.time_period(),
            run.period().as_secs() / 86_400,
            run.total_repositories(),
        ),
        |s| s.bright_black(),
    ));
    out.push_str("\n\n");

    if run.interrupted() {
        out.push_str(&p.paint("⚠  Interrupted: results are partial.", |s| s.yellow()));
        out.push_str("\n\n");
    }

    if run.results().is_empty() {
        out.push_str("No repositories found matching the criteria.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    if !styled {
        table.force_no_tty();
    }
    table.set_header(vec!["REPOSITORY", "PRIORITY", "RISK", "COMMITS", "CHANGES%", "LAST COMMIT", "FILES"]);

    for record in run.results() {
        table.add_row(row(record, run.generated_at()));
    }
    out.push_str(&table.to_string());
    out.push('\n');

    // Rows only carry the short "ERROR" marker; the full text goes below.
    let failures: Vec<&RepositoryRecord> = run.results().iter().filter(|r| r.error().is_some()).collect();
    if !failures.is_empty() {
        out.push('\n');
        for r in failures {
            out.push_str(&format!(
                "  {} {}: {}\n",
                p.paint("Error:", |s| s.red()),
                r.name,
                r.error().unwrap_or_default(),
            ));
        }
    }

    out.push_str(&summary(run, &p));
    out
}

fn row(record: &RepositoryRecord, now: DateTime<Utc>) -> Vec<Cell> {
    let name = Cell::new(truncate_name(&record.name));
    match record.assessment() {
        Some(a) => vec![
            name,
            tier_cell(a.recommended_priority),
            risk_cell(a),
            Cell::new(a.metrics.commit_count),
            Cell::new(format!("{:.2}%", a.change_percentage)),
            Cell::new(format_last_commit(a.metrics.last_commit_date, now)),
            Cell::new(a.metrics.stats.files_changed),
        ],
        None => vec![
            name,
            Cell::new("ERROR").fg(Color::Red).add_attribute(Attribute::Bold),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
        ],
    }
}

fn summary(run: &AnalysisRun, p: &Painter) -> String {
    let high   = run.count_by_priority(Tier::High);
    let medium = run.count_by_priority(Tier::Medium);
    let low    = run.count_by_priority(Tier::Low);

    let mut out = String::new();
    out.push_str("\nPriority Summary:\n");
    out.push_str("-----------------\n");
    out.push_str(&format!("🔴 HIGH priority:   {high} repositories (immediate pentesting recommended)\n"));
    out.push_str(&format!("🟡 MEDIUM priority: {medium} repositories (pentest within 3 months)\n"));
    out.push_str(&format!("🟢 LOW priority:    {low} repositories (pentest within 6 months)\n"));

    out.push_str("\nRecommendations:\n");
    out.push_str("----------------\n");
    if high > 0 {
        out.push_str(&format!("{} Start with HIGH priority repositories - these have significant recent changes\n", p.bullet()));
    }
    if medium > 0 {
        out.push_str(&format!("{} Schedule MEDIUM priority repositories for upcoming pentest cycles\n", p.bullet()));
    }
    if low > 0 {
        out.push_str(&format!("{} LOW priority repositories can be tested during maintenance cycles\n", p.bullet()));
    }
    out
}

// ─── Cell builders ────────────────────────────────────────────────────────────

fn tier_cell(tier: Tier) -> Cell {
    match tier {
        Tier::High   => Cell::new("🔴 HIGH").fg(Color::Red).add_attribute(Attribute::Bold),
        Tier::Medium => Cell::new("🟡 MED").fg(Color::Yellow),
        Tier::Low    => Cell::new("🟢 LOW").fg(Color::Green),
    }
}

fn risk_cell(a: &Assessment) -> Cell {
    let cell = Cell::new(format!("{:.1}", a.risk_score));
    match a.recommended_priority {
        Tier::High   => cell.fg(Color::Red),
        Tier::Medium => cell.fg(Color::Yellow),
        Tier::Low    => cell,
    }
}

// ─── Other helpers ────────────────────────────────────────────────────────────

struct Painter {
    styled: bool,
}

impl Painter {
    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.styled { style(text).to_string() } else { text.to_string() }
    }

    fn bullet(&self) -> String {
        self.paint("•", |s| s.cyan())
    }
}

pub fn format_last_commit(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else { return "Never".to_string() };
    let age = now - last;
    if age < chrono::Duration::hours(24) {
        "Today".to_string()
    } else if age < chrono::Duration::days(7) {
        format!("{} days ago", age.num_days())
    } else {
        last.format("%Y-%m-%d").to_string()
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH { return name.to_string(); }
    let head: String = name.chars().take(NAME_WIDTH - 3).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::types::*;
    use chrono::TimeZone;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap()
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            root: PathBuf::from("/srv/repos"),
            period: Duration::from_secs(90 * 86_400),
            period_label: "3m".to_string(),
            min_change: 0.0,
            include_inactive: true,
            jobs: 1,
            timeout: Duration::from_secs(60),
        }
    }

    fn assessed(name: &str, score: f64, last_days_ago: Option<i64>) -> RepositoryRecord {
        RepositoryRecord::assessed(&Path::new("/srv/repos").join(name), Assessment {
            metrics: ChangeMetrics {
                commit_count: 7,
                last_commit_date: last_days_ago.map(|d| now() - chrono::Duration::days(d)),
                stats: ChangeStats { files_changed: 3, lines_added: 10, lines_deleted: 2 },
            },
            total_changes: 12,
            change_percentage: 1.5,
            risk_score: score,
            recommended_priority: crate::scoring::get_tier(score),
        })
    }

    #[test]
    fn test_table_lists_repos_and_summary() {
        let records = vec![
            assessed("payments-api", 82.0, Some(1)),
            RepositoryRecord::failed(Path::new("/srv/repos/legacy"), "Failed to get commit info: corrupt"),
            assessed("docs", 12.0, None),
        ];
        let run = aggregate(records, 3, &config(), now(), false);
        let text = render_table(&run, false);

        assert!(text.contains("payments-api"));
        assert!(text.contains("82.0"));
        assert!(text.contains("🔴 HIGH"));
        assert!(text.contains("ERROR"));
        assert!(text.contains("Error: legacy: Failed to get commit info: corrupt"));
        assert!(text.contains("Never"), "docs has no commits");
        assert!(text.contains("HIGH priority:   1 repositories"));
        assert!(text.contains("LOW priority:    1 repositories"));
        assert!(!text.contains('\u{1b}'), "unstyled output must not contain ANSI escapes");
    }

    #[test]
    fn test_empty_run_message() {
        let run = aggregate(Vec::new(), 0, &config(), now(), false);
        let text = render_table(&run, false);
        assert!(text.contains("No repositories found matching the criteria."));
    }

    #[test]
    fn test_interrupted_banner() {
        let run = aggregate(Vec::new(), 4, &config(), now(), true);
        assert!(render_table(&run, false).contains("Interrupted"));
    }

    #[test]
    fn test_format_last_commit() {
        assert_eq!(format_last_commit(None, now()), "Never");
        assert_eq!(format_last_commit(Some(now() - chrono::Duration::hours(3)), now()), "Today");
        assert_eq!(format_last_commit(Some(now() - chrono::Duration::days(3)), now()), "3 days ago");
        assert_eq!(format_last_commit(Some(now() - chrono::Duration::days(30)), now()), "2025-04-20");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short"), "short");
        let long = "a-really-long-repository-name-here";
        let t = truncate_name(long);
        assert_eq!(t.chars().count(), NAME_WIDTH);
        assert!(t.ends_with("..."));
    }
}
