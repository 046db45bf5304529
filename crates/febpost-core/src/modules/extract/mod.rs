mod parser;

use crate::domain::{PostError, PostResult};
use crate::io::{ResolvedInput, SaveTarget, resolve_input};
use crate::table::write_text_artifact;
use parser::{StepReport, scan_report};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    pub directory: Option<PathBuf>,
    pub file: Option<String>,
    pub save: SaveTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub record_count: usize,
    /// Comma-joined field names, absent when no record was ever opened.
    pub header: Option<String>,
    pub save_path: PathBuf,
}

/// Parse a raw step report into the delimited table artifact.
///
/// A report in which the `Step = 0` marker never appears still writes an
/// artifact: the literal header `n,t,` and no data rows. That is the format's
/// silent-loss mode, not an error.
pub fn run_extract(config: &ExtractConfig) -> PostResult<ExtractSummary> {
    let resolved = resolve_input(config.directory.as_deref(), config.file.as_deref())?;
    let source = read_report_source(&resolved)?;

    let report = scan_report(&source);
    let rendered = render_report(&report);

    let save_path = resolved.save_path(&config.save);
    write_text_artifact(&save_path, &rendered).map_err(|source| {
        PostError::io_system(
            "IO.EXTRACT_WRITE",
            format!(
                "failed to write extracted table '{}': {}",
                save_path.display(),
                source
            ),
        )
    })?;

    Ok(ExtractSummary {
        record_count: report.records.len(),
        header: report.header,
        save_path,
    })
}

fn read_report_source(resolved: &ResolvedInput) -> PostResult<String> {
    let path = resolved.input_path();
    fs::read_to_string(&path).map_err(|source| {
        PostError::io_system(
            "IO.EXTRACT_READ",
            format!("failed to read report '{}': {}", path.display(), source),
        )
    })
}

/// Render the collected records as delimited text: `n,t,<fields>` then one
/// line per record with the captured value tokens comma-joined after the
/// index and time.
fn render_report(report: &StepReport) -> String {
    let mut rendered = format!("n,t,{}\n", report.header.as_deref().unwrap_or(""));
    for record in &report.records {
        rendered.push_str(&record.index.to_string());
        rendered.push(',');
        rendered.push_str(&record.time);
        for value in &record.values {
            rendered.push(',');
            rendered.push_str(value);
        }
        rendered.push('\n');
    }
    rendered
}
