use crate::types::AnalysisRun;

/// Serializes the run as pretty-printed JSON with a trailing newline.
pub fn render_json(run: &AnalysisRun) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(run)?;
    text.push('\n');
    Ok(text)
}
