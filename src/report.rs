use std::io::{self, Write};

use tracing::error;

use crate::findings::{IdFormatFinding, IdShape, LengthRelation, ShapeCounts};
use crate::stats::{MarkedId, OverviewReport, SourceOverview, SourceStatus, TargetReport};
use crate::utils::format_number;

pub fn print_overview(report: &OverviewReport) {
    let stdout = io::stdout();
    if let Err(e) = write_overview(&mut stdout.lock(), report) {
        error!(action = "write", component = "report", error = %e, "Failed to print overview");
    }
}

pub fn print_targets(report: &TargetReport) {
    let stdout = io::stdout();
    if let Err(e) = write_targets(&mut stdout.lock(), report) {
        error!(action = "write", component = "report", error = %e, "Failed to print target report");
    }
}

pub fn write_overview<W: Write>(out: &mut W, report: &OverviewReport) -> io::Result<()> {
    write_source(out, &report.content_version)?;
    write_source(out, &report.content_document_link)?;

    let Some(overlap) = &report.overlap else {
        return Ok(());
    };

    writeln!(out, "\n=== Common ContentDocumentId ===")?;
    writeln!(
        out,
        "ContentDocumentId in ContentVersion.csv: {}",
        format_number(overlap.version_ids)
    )?;
    writeln!(
        out,
        "ContentDocumentId in ContentDocumentLink.csv: {}",
        format_number(overlap.link_ids)
    )?;
    writeln!(
        out,
        "Common ContentDocumentId: {}",
        format_number(overlap.common_ids)
    )?;

    if overlap.common_ids > 0 {
        writeln!(out, "Common id samples: {}", list(&overlap.common_samples))?;
    } else {
        writeln!(out, "No common ContentDocumentId found!")?;
        writeln!(out, "ContentVersion samples: {}", list(&overlap.version_samples))?;
        writeln!(
            out,
            "ContentDocumentLink samples: {}",
            list(&overlap.link_samples)
        )?;
    }
    Ok(())
}

fn write_source<W: Write>(out: &mut W, status: &SourceStatus) -> io::Result<()> {
    match status {
        SourceStatus::Unavailable { kind, path } => {
            writeln!(out, "\n=== {} ===", kind)?;
            writeln!(out, "{} not found: {}", kind, path.display())
        }
        SourceStatus::Available(overview) => write_available(out, overview),
    }
}

fn write_available<W: Write>(out: &mut W, overview: &SourceOverview) -> io::Result<()> {
    writeln!(out, "\n=== {} ===", overview.kind)?;
    writeln!(out, "Path: {}", overview.path.display())?;
    writeln!(out, "Headers: {}", list(&overview.headers))?;
    if !overview.missing_columns.is_empty() {
        writeln!(out, "Missing columns: {}", list(&overview.missing_columns))?;
    }

    writeln!(out, "\nFirst {} rows:", overview.leading_rows.len())?;
    for (i, row) in overview.leading_rows.iter().enumerate() {
        let fields: Vec<String> = row
            .iter()
            .map(|(column, value)| format!("{}={}", column, value))
            .collect();
        writeln!(out, "Row {}: {}", i + 1, fields.join(", "))?;
    }

    writeln!(out, "\nTotal rows: {}", format_number(overview.row_count))?;
    writeln!(
        out,
        "Unique ContentDocumentId: {}",
        format_number(overview.distinct_document_ids)
    )?;
    if overview.skipped_document_rows > 0 {
        writeln!(
            out,
            "Rows without ContentDocumentId: {}",
            format_number(overview.skipped_document_rows)
        )?;
    }
    writeln!(
        out,
        "ContentDocumentId samples: {}",
        list(&overview.document_id_samples)
    )?;

    if let Some(is_deleted) = &overview.is_deleted {
        writeln!(out, "\nIsDeleted distribution:")?;
        for (value, count) in is_deleted.iter() {
            writeln!(out, "  {:?}: {}", value, format_number(count))?;
        }
    }

    if !overview.top_prefixes.is_empty() {
        writeln!(out, "\nLinkedEntityId prefix distribution:")?;
        for (prefix, count) in &overview.top_prefixes {
            writeln!(out, "  {}: {}", prefix, format_number(*count))?;
        }
    }
    Ok(())
}

pub fn write_targets<W: Write>(out: &mut W, report: &TargetReport) -> io::Result<()> {
    writeln!(
        out,
        "\n=== Target prefixes {} ===",
        report.prefixes.join(", ")
    )?;
    for (kind, path) in &report.unavailable {
        writeln!(out, "{} not found: {}", kind, path.display())?;
    }

    for (prefix, count) in &report.prefix_counts {
        writeln!(out, "Prefix {}: {} rows", prefix, format_number(*count))?;
    }
    writeln!(
        out,
        "Target ContentDocumentId (unique): {}",
        format_number(report.target_ids)
    )?;
    writeln!(
        out,
        "Target records: {}",
        format_number(report.target_records)
    )?;

    writeln!(
        out,
        "\nMatches in ContentVersion.csv: {} (of {} ids)",
        format_number(report.matches),
        format_number(report.version_ids)
    )?;
    if !report.match_samples.is_empty() {
        writeln!(out, "Matched id samples: {}", list(&report.match_samples))?;
    }
    writeln!(
        out,
        "\nUnmatched target ids: {}",
        format_number(report.unmatched)
    )?;

    writeln!(
        out,
        "\nTarget id samples (first {}):",
        report.target_samples.len()
    )?;
    write_marked(out, &report.target_samples)?;

    writeln!(
        out,
        "\nContentVersion id samples (first {}):",
        report.version_samples.len()
    )?;
    write_marked(out, &report.version_samples)?;

    write_finding(out, &report.finding)
}

fn write_marked<W: Write>(out: &mut W, ids: &[MarkedId]) -> io::Result<()> {
    for (i, marked) in ids.iter().enumerate() {
        let status = if marked.matched { "✓" } else { "✗" };
        writeln!(out, "  {:2}. {} {}", i + 1, marked.id, status)?;
    }
    Ok(())
}

fn write_finding<W: Write>(out: &mut W, finding: &IdFormatFinding) -> io::Result<()> {
    writeln!(out, "\n=== Id format ===")?;
    writeln!(
        out,
        "Target id lengths: {}",
        histogram(&finding.left_lengths)
    )?;
    writeln!(
        out,
        "ContentVersion id lengths: {}",
        histogram(&finding.right_lengths)
    )?;
    writeln!(out, "Target id shapes: {}", shapes(&finding.left_shapes))?;
    writeln!(
        out,
        "ContentVersion id shapes: {}",
        shapes(&finding.right_shapes)
    )?;

    match &finding.relation {
        LengthRelation::Empty => writeln!(out, "Finding: not enough ids to compare lengths"),
        LengthRelation::Aligned { lengths } => {
            writeln!(out, "Finding: lengths aligned ({})", lengths_list(lengths))
        }
        LengthRelation::PartialOverlap {
            shared,
            only_left,
            only_right,
        } => writeln!(
            out,
            "Finding: lengths partially overlap (shared {}; target only {}; ContentVersion only {})",
            lengths_list(shared),
            lengths_list(only_left),
            lengths_list(only_right)
        ),
        LengthRelation::Disjoint { left, right } => writeln!(
            out,
            "Finding: lengths disjoint (target {}; ContentVersion {})",
            lengths_list(left),
            lengths_list(right)
        ),
    }
}

fn list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", quoted.join(", "))
}

fn histogram(lengths: &std::collections::BTreeMap<usize, usize>) -> String {
    let entries: Vec<String> = lengths
        .iter()
        .map(|(length, count)| format!("{}: {}", length, format_number(*count)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn shapes(counts: &ShapeCounts) -> String {
    format!(
        "{} {}, {} {}, {} {}",
        IdShape::Short,
        format_number(counts.short),
        IdShape::Long,
        format_number(counts.long),
        IdShape::Other,
        format_number(counts.other)
    )
}

fn lengths_list(lengths: &[usize]) -> String {
    if lengths.is_empty() {
        return "none".to_string();
    }
    lengths
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
