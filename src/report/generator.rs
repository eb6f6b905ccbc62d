//! Markdown and JSON report generation.
//!
//! This module renders the summary tables of a dashboard run.

use crate::models::{DrillDown, Report, ReportMetadata, SummaryRow, WorkerRow};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# HitDash Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_hit_summary_section(&report.hit_summary));

    if let Some(ref drill_down) = report.drill_down {
        output.push_str(&generate_drill_down_section(drill_down));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Environment:** {}\n", metadata.environment));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(ref balance) = metadata.balance {
        section.push_str(&format!("- **Available Balance:** ${}\n", balance));
    }
    section.push_str(&format!("- **HITs Listed:** {}\n", metadata.units_listed));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the HIT type summary table.
fn generate_hit_summary_section(rows: &[SummaryRow]) -> String {
    let mut section = String::new();

    section.push_str("## HIT Types\n\n");

    if rows.is_empty() {
        section.push_str("No HITs were found.\n\n");
        return section;
    }

    section.push_str("| Title | Status | Review Status | HITs | HIT Type |\n");
    section.push_str("|:---|:---|:---|:---:|:---|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} | `{}` |\n",
            escape_cell(&row.title),
            row.status,
            row.review_status,
            row.n_units,
            row.type_id
        ));
    }
    section.push('\n');

    section
}

/// Generate the assignment drill-down for one HIT type.
fn generate_drill_down_section(drill_down: &DrillDown) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Completed Assignments: {}\n\n",
        escape_cell(&drill_down.hit_type.label())
    ));
    section.push_str(&format!(
        "*{} {} retrieved*\n\n",
        drill_down.units_retrieved, drill_down.source
    ));

    let totals = &drill_down.totals;
    section.push_str("| Available for workers | In progress | Reviewed (approved or rejected) |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        totals.available, totals.pending, totals.completed
    ));

    if drill_down.stats.total == 0 {
        section.push_str("No assignments for review for this HIT type.\n\n");
        return section;
    }

    section.push_str(&generate_worker_table(&drill_down.workers));

    let stats = &drill_down.stats;
    section.push_str(&format!(
        "- **Assignments pending review:** {}\n",
        stats.pending_review
    ));
    section.push_str(&format!("- **Total assignments:** {}\n", stats.total));
    if !drill_down.answer_fields.is_empty() {
        let fields: Vec<String> = drill_down
            .answer_fields
            .iter()
            .map(|f| format!("`{}`", f))
            .collect();
        section.push_str(&format!("- **Answer fields:** {}\n", fields.join(", ")));
    }
    if stats.extraction_errors > 0 {
        section.push_str(&format!(
            "- **Answers that could not be decoded:** {}\n",
            stats.extraction_errors
        ));
    }
    section.push('\n');

    if !drill_down.extraction_errors.is_empty() {
        section.push_str("### Extraction Errors\n\n");
        section.push_str("| Assignment | Cause |\n");
        section.push_str("|:---|:---|\n");
        for err in &drill_down.extraction_errors {
            section.push_str(&format!(
                "| `{}` | {} |\n",
                err.submission_id,
                escape_cell(&err.cause.to_string())
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_worker_table(workers: &[WorkerRow]) -> String {
    let mut table = String::new();

    table.push_str("### Workers\n\n");
    table.push_str("| Worker | Assignments completed |\n");
    table.push_str("|:---|:---:|\n");
    for row in workers {
        table.push_str(&format!("| `{}` | {} |\n", row.worker_id, row.n_units));
    }
    table.push('\n');

    table
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by HitDash*\n".to_string()
}

/// Pipes would split a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
