//! Line scan over a raw FEBio step report.
//!
//! Records are delimited by a line exactly equal to `Step = {n}` for the next
//! expected index; everything else in the file is tolerated noise and skipped.

/// One simulation increment as captured from the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StepRecord {
    pub(super) index: usize,
    /// Raw time text, preserved exactly as written.
    pub(super) time: String,
    /// Data-line tokens from index 1 onward, preserved verbatim (a doubled
    /// space in the source survives as an empty value).
    pub(super) values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(super) struct StepReport {
    /// Comma-joined field names from the first record's header line.
    pub(super) header: Option<String>,
    pub(super) records: Vec<StepRecord>,
}

/// Scan the report for contiguous step records starting at `Step = 0`.
///
/// Lines that do not match the marker for the current counter are skipped
/// silently, so a report with no markers (or markers that do not start at 0)
/// yields an empty result rather than an error. Each marker is followed by
/// three lines consumed unconditionally: time (token 2), field names
/// (token 2, semicolon-separated, first record only), and values (tokens from
/// index 1). End of file, or a consumed line missing its positional token,
/// ends the scan in whatever state it is in.
pub(super) fn scan_report(source: &str) -> StepReport {
    let lines: Vec<&str> = source.lines().collect();
    let mut report = StepReport::default();
    let mut next_index = 0_usize;
    let mut cursor = 0_usize;

    while cursor < lines.len() {
        let line = lines[cursor].trim();
        cursor += 1;

        if line != format!("Step = {next_index}") {
            continue;
        }

        let Some(time) = consume_token(&lines, &mut cursor, 2) else {
            break;
        };
        let Some(field_names) = consume_token(&lines, &mut cursor, 2) else {
            break;
        };
        let Some(values) = consume_values(&lines, &mut cursor) else {
            break;
        };

        if report.header.is_none() {
            report.header = Some(field_names.replace(';', ","));
        }

        report.records.push(StepRecord {
            index: next_index,
            time,
            values,
        });
        next_index += 1;
    }

    report
}

fn consume_token(lines: &[&str], cursor: &mut usize, token_index: usize) -> Option<String> {
    let line = lines.get(*cursor)?;
    *cursor += 1;
    line.trim()
        .split(' ')
        .nth(token_index)
        .map(str::to_string)
}

fn consume_values(lines: &[&str], cursor: &mut usize) -> Option<Vec<String>> {
    let line = lines.get(*cursor)?;
    *cursor += 1;
    Some(
        line.trim()
            .split(' ')
            .skip(1)
            .map(str::to_string)
            .collect(),
    )
}
