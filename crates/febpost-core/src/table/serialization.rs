use std::fs;
use std::path::Path;

/// Render a numeric cell in the round-trip text form used by every artifact
/// (`3.0` stays `3.0`, never `3`).
pub fn render_numeric(value: f64) -> String {
    format!("{value:?}")
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}
