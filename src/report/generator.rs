//! HTML report generation.
//!
//! This module renders the aggregated appearance counts through the
//! bundled Jinja template as a single self-contained HTML page, and
//! optionally as JSON.

use crate::analysis::most_frequent_participants;
use crate::error::ReportError;
use crate::models::{ParticipantAppearances, Report};
use chrono_tz::America::Los_Angeles;
use minijinja::{AutoEscape, Environment, Value};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Name the page template is registered under. The `.html` suffix selects
/// HTML auto-escaping.
const REPORT_TEMPLATE_NAME: &str = "report.html";

const REPORT_TEMPLATE: &str = include_str!("../../templates/report.html");

/// Footer timestamp format, rendered in the show's home timezone.
const TIMESTAMP_FORMAT: &str = "%A, %B %d, %Y %H:%M:%S %Z";

/// Flattened view of a [`Report`] handed to the template.
#[derive(Debug, Serialize)]
struct ReportView<'a> {
    title: &'a str,
    source: &'a str,
    ga_property_code: Option<&'a str>,
    rendered_at: String,
    participant_count: usize,
    total_appearances: u64,
    first_year: Option<i32>,
    last_year: Option<i32>,
    years: &'a [i32],
    top: Vec<TopEntry<'a>>,
    rows: Vec<RowView<'a>>,
}

#[derive(Debug, Serialize)]
struct TopEntry<'a> {
    name: &'a str,
    total: u64,
}

#[derive(Debug, Serialize)]
struct RowView<'a> {
    participant_id: i64,
    name: &'a str,
    cells: Vec<CellView>,
    total: u64,
}

/// One table cell; `count` is `None` for years without an appearance.
#[derive(Debug, Serialize)]
struct CellView {
    year: i32,
    count: Option<u32>,
}

impl<'a> ReportView<'a> {
    fn new(report: &'a Report) -> Self {
        let metadata = &report.metadata;

        Self {
            title: &metadata.title,
            source: &metadata.source,
            ga_property_code: metadata.ga_property_code.as_deref(),
            rendered_at: metadata
                .generated_at
                .with_timezone(&Los_Angeles)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            participant_count: report.participants.len(),
            total_appearances: report.total_appearances,
            first_year: report.years.first().copied(),
            last_year: report.years.last().copied(),
            years: &report.years,
            top: most_frequent_participants(&report.participants, 3)
                .into_iter()
                .map(|(row, total)| TopEntry {
                    name: &row.name,
                    total,
                })
                .collect(),
            rows: report
                .participants
                .iter()
                .map(|row| RowView::new(row, &report.years))
                .collect(),
        }
    }
}

impl<'a> RowView<'a> {
    fn new(row: &'a ParticipantAppearances, years: &[i32]) -> Self {
        Self {
            participant_id: row.participant_id,
            name: &row.name,
            cells: years
                .iter()
                .map(|&year| CellView {
                    year,
                    count: row.count_for(year),
                })
                .collect(),
            total: row.total(),
        }
    }
}

/// Generate a complete HTML report.
pub fn generate_html_report(report: &Report) -> Result<String, ReportError> {
    render_with_template(REPORT_TEMPLATE, report)
}

/// Render `report` through the given template source.
fn render_with_template(source: &str, report: &Report) -> Result<String, ReportError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_template(REPORT_TEMPLATE_NAME, source)?;

    let template = env.get_template(REPORT_TEMPLATE_NAME)?;
    let ctx = Value::from_serialize(ReportView::new(report));
    let rendered = template.render(ctx)?;

    Ok(rendered)
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, ReportError> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered content to `path`, or to stdout when `path` is `-`.
///
/// Missing parent directories are created.
pub fn write_report(content: &str, path: &Path) -> Result<(), ReportError> {
    let render_err = |source| ReportError::Render {
        path: path.to_path_buf(),
        source,
    };

    if path == Path::new("-") {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(content.as_bytes()).map_err(render_err)?;
        handle.flush().map_err(render_err)?;
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating output directory {}", parent.display());
            std::fs::create_dir_all(parent).map_err(render_err)?;
        }
    }

    let mut file = std::fs::File::create(path).map_err(render_err)?;
    file.write_all(content.as_bytes()).map_err(render_err)?;

    Ok(())
}
