pub mod csv;
pub mod json;
pub mod terminal;

use crate::config::OutputFormat;
use crate::types::AnalysisRun;
use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::Path;

/// Renders `run` in `format` and writes it to `output`, or stdout if `None`.
pub fn write_report(run: &AnalysisRun, format: OutputFormat, output: Option<&Path>) -> anyhow::Result<()> {
    use anyhow::Context;

    let styled = output.is_none() && std::io::stdout().is_terminal();
    let text = match format {
        OutputFormat::Table => terminal::render_table(run, styled),
        OutputFormat::Json  => json::render_json(run).context("JSON serialization failed")?,
        OutputFormat::Csv   => csv::render_csv(run),
    };

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(text.as_bytes())
                .and_then(|_| writer.flush())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✓ Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            writer.write_all(text.as_bytes())
                .and_then(|_| writer.flush())
                .context("Failed to write stdout")?;
        }
    }
    Ok(())
}
