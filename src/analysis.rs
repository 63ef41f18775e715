use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::args::{Args, Command};
use crate::comparator::{
    Comparator, ComparatorConfig, SourceKind, CONTENT_DOCUMENT_ID, IS_DELETED, LINKED_ENTITY_ID,
};
use crate::compare::{self, KeySet, PREFIX_LEN};
use crate::error::SourceError;
use crate::findings::{IdClassifier, IdFormatFinding};
use crate::report;
use crate::stats::{MarkedId, Overlap, OverviewReport, SourceOverview, SourceStatus, TargetReport};
use crate::utils::delimiter_byte;

/// Sample sizes and target prefixes shared by both reports.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub rows: usize,
    pub samples: usize,
    pub top: usize,
    pub prefixes: Vec<String>,
}

impl ReportOptions {
    pub fn from_args(args: &Args) -> Self {
        let mut prefixes = Vec::new();
        for prefix in &args.prefixes {
            if !prefixes.contains(prefix) {
                prefixes.push(prefix.clone());
            }
        }
        Self {
            rows: args.rows,
            samples: args.samples,
            top: args.top,
            prefixes,
        }
    }

    fn allowed_prefixes(&self) -> BTreeSet<String> {
        self.prefixes.iter().cloned().collect()
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            rows: 5,
            samples: 10,
            top: 10,
            prefixes: vec!["001".to_string(), "003".to_string()],
        }
    }
}

pub fn run(args: &Args) -> Result<()> {
    let total_start_time = Instant::now();
    let config = ComparatorConfig {
        content_version: args.content_version.clone(),
        content_document_link: args.content_document_link.clone(),
        delimiter: delimiter_byte(args.delimiter)?,
    };
    info!(action = "configure", component = "analysis", content_version = ?config.content_version, content_document_link = ?config.content_document_link, command = ?args.command(), "Resolved source exports");

    let comparator = Comparator::open(&config).context("Failed to load source exports")?;
    let options = ReportOptions::from_args(args);

    let command = args.command();
    if matches!(command, Command::Overview | Command::All) {
        report::print_overview(&analyze_overview(&comparator, &options));
    }
    if matches!(command, Command::Targets | Command::All) {
        report::print_targets(&analyze_targets(&comparator, &options)?);
    }

    info!(
        action = "complete",
        component = "analysis",
        duration_ms = total_start_time.elapsed().as_millis(),
        "Analysis completed successfully"
    );
    Ok(())
}

fn overview_of(comparator: &Comparator, kind: SourceKind, options: &ReportOptions) -> SourceStatus {
    let table = match comparator.table(kind) {
        Ok(table) => table,
        Err(e) => {
            warn!(action = "skip", component = "overview", source = kind.label(), error = %e, "Skipping source overview");
            return SourceStatus::Unavailable {
                kind,
                path: unavailable_path(e),
            };
        }
    };

    let leading_rows: Vec<Vec<(String, String)>> = table
        .rows()
        .take(options.rows)
        .map(|row| {
            kind.sample_columns()
                .iter()
                .map(|column| (column.to_string(), row.get(column).unwrap_or("N/A").to_string()))
                .collect()
        })
        .collect();

    let document_ids = compare::load_keys(table, CONTENT_DOCUMENT_ID);

    let (is_deleted, top_prefixes) = match kind {
        SourceKind::ContentDocumentLink => {
            let prefixes = compare::count_by_prefix(table, LINKED_ENTITY_ID, PREFIX_LEN);
            let top: Vec<(String, usize)> = prefixes
                .most_common(options.top)
                .into_iter()
                .map(|(prefix, count)| (prefix.to_string(), count))
                .collect();
            (Some(compare::value_counts(table, IS_DELETED)), top)
        }
        SourceKind::ContentVersion => (None, Vec::new()),
    };

    SourceStatus::Available(Box::new(SourceOverview {
        kind,
        path: table.path().to_path_buf(),
        headers: table.headers().into_iter().map(str::to_string).collect(),
        missing_columns: table.missing_columns(kind.required_columns()),
        leading_rows,
        row_count: table.row_count(),
        distinct_document_ids: compare::distinct_value_count(&document_ids),
        skipped_document_rows: table.skipped_rows(CONTENT_DOCUMENT_ID),
        document_id_samples: table
            .column_values(CONTENT_DOCUMENT_ID)
            .take(options.samples)
            .map(str::to_string)
            .collect(),
        is_deleted,
        top_prefixes,
    }))
}

pub fn analyze_overview(comparator: &Comparator, options: &ReportOptions) -> OverviewReport {
    let start_time = Instant::now();
    info!(action = "start", component = "overview", "Starting export overview");

    let content_version = overview_of(comparator, SourceKind::ContentVersion, options);
    let content_document_link = overview_of(comparator, SourceKind::ContentDocumentLink, options);

    let overlap = match (
        comparator.load_keys(SourceKind::ContentVersion, CONTENT_DOCUMENT_ID),
        comparator.load_keys(SourceKind::ContentDocumentLink, CONTENT_DOCUMENT_ID),
    ) {
        (Ok(version_ids), Ok(link_ids)) => {
            let common = compare::intersect(&version_ids, &link_ids);
            let shown = options.samples.min(5);
            Some(Overlap {
                version_ids: version_ids.len(),
                link_ids: link_ids.len(),
                common_ids: common.len(),
                common_samples: owned(common.sample(shown)),
                version_samples: owned(version_ids.sample(shown)),
                link_samples: owned(link_ids.sample(shown)),
            })
        }
        _ => None,
    };

    info!(
        action = "complete",
        component = "overview",
        common_ids = ?overlap.as_ref().map(|o| o.common_ids),
        duration_ms = start_time.elapsed().as_millis(),
        "Export overview completed"
    );

    OverviewReport {
        content_version,
        content_document_link,
        overlap,
    }
}

pub fn analyze_targets(comparator: &Comparator, options: &ReportOptions) -> Result<TargetReport> {
    let start_time = Instant::now();
    info!(action = "start", component = "targets", prefixes = ?options.prefixes, "Starting target prefix analysis");

    let mut unavailable = Vec::new();
    let allowed = options.allowed_prefixes();

    let selection = comparator
        .select_targets(
            SourceKind::ContentDocumentLink,
            LINKED_ENTITY_ID,
            CONTENT_DOCUMENT_ID,
            &allowed,
        )
        .unwrap_or_else(|e| {
            warn!(action = "skip", component = "targets", source = SourceKind::ContentDocumentLink.label(), error = %e, "Target selection skipped");
            unavailable.push((SourceKind::ContentDocumentLink, unavailable_path(e)));
            Default::default()
        });

    let version_ids = comparator
        .load_keys(SourceKind::ContentVersion, CONTENT_DOCUMENT_ID)
        .unwrap_or_else(|e| {
            warn!(action = "skip", component = "targets", source = SourceKind::ContentVersion.label(), error = %e, "ContentVersion keys skipped");
            unavailable.push((SourceKind::ContentVersion, unavailable_path(e)));
            KeySet::default()
        });

    let target_ids = &selection.keys;
    let matches = compare::intersect(target_ids, &version_ids);
    let unmatched = compare::difference(target_ids, &version_ids);

    let classifier = IdClassifier::new().context("Failed to compile id pattern")?;
    let finding = IdFormatFinding::compare(target_ids, &version_ids, &classifier);

    let listed = options.samples.saturating_mul(2);
    let report = TargetReport {
        prefixes: options.prefixes.clone(),
        prefix_counts: options
            .prefixes
            .iter()
            .map(|prefix| (prefix.clone(), selection.prefix_counts.get(prefix)))
            .collect(),
        target_ids: target_ids.len(),
        target_records: selection.records,
        version_ids: version_ids.len(),
        matches: matches.len(),
        match_samples: owned(matches.sample(options.samples)),
        unmatched: unmatched.len(),
        target_samples: mark(target_ids, &version_ids, listed),
        version_samples: mark(&version_ids, target_ids, listed),
        finding,
        unavailable,
    };

    info!(
        action = "complete",
        component = "targets",
        target_ids = report.target_ids,
        matches = report.matches,
        unmatched = report.unmatched,
        mismatch = report.finding.is_mismatch(),
        duration_ms = start_time.elapsed().as_millis(),
        "Target prefix analysis completed"
    );

    Ok(report)
}

fn unavailable_path(error: SourceError) -> PathBuf {
    match error {
        SourceError::SourceUnavailable { path } => path,
        _ => PathBuf::new(),
    }
}

fn mark(ids: &KeySet, against: &KeySet, n: usize) -> Vec<MarkedId> {
    ids.sample(n)
        .into_iter()
        .map(|id| MarkedId {
            id: id.to_string(),
            matched: against.contains(id),
        })
        .collect()
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::LengthRelation;
    use crate::source::Table;

    fn table(input: &str) -> Table {
        Table::from_reader(input.as_bytes(), b',', "inline.csv").unwrap()
    }

    fn comparator() -> Comparator {
        Comparator::from_tables(
            Ok(table(
                "Id,ContentDocumentId,Title\n068a,0690000000000AA,a\n068b,0690000000000AA,b\n068c,0690000000000BB,c\n",
            )),
            Ok(table(
                "ContentDocumentId,LinkedEntityId,IsDeleted\n0690000000000AAQA1,001000000000001,false\n0690000000000BB,003000000000001,false\n0690000000000CC,005000000000001,true\n",
            )),
        )
    }

    #[test]
    fn overview_reports_both_sources_and_overlap() {
        let report = analyze_overview(&comparator(), &ReportOptions::default());

        let SourceStatus::Available(version) = &report.content_version else {
            panic!("ContentVersion should be available");
        };
        assert_eq!(version.row_count, 3);
        assert_eq!(version.distinct_document_ids, 2);
        assert_eq!(version.leading_rows.len(), 3);
        assert_eq!(version.leading_rows[0][2], ("Title".to_string(), "a".to_string()));
        assert!(version.is_deleted.is_none());

        let SourceStatus::Available(link) = &report.content_document_link else {
            panic!("ContentDocumentLink should be available");
        };
        assert_eq!(link.leading_rows[0].len(), 2);
        let is_deleted = link.is_deleted.as_ref().unwrap();
        assert_eq!(is_deleted.get("false"), 2);
        assert_eq!(is_deleted.get("true"), 1);
        assert_eq!(link.top_prefixes.len(), 3);
        assert!(link.missing_columns.is_empty());

        let overlap = report.overlap.unwrap();
        assert_eq!(overlap.common_ids, 1);
        assert_eq!(overlap.common_samples, vec!["0690000000000BB"]);
    }

    #[test]
    fn leading_rows_mark_absent_values() {
        let comparator = Comparator::from_tables(
            Ok(table("Id,ContentDocumentId\n068a,069a\n")),
            Err(PathBuf::from("missing.csv")),
        );
        let report = analyze_overview(&comparator, &ReportOptions::default());

        let SourceStatus::Available(version) = &report.content_version else {
            panic!("ContentVersion should be available");
        };
        assert_eq!(version.leading_rows[0][2].1, "N/A");
        assert_eq!(version.missing_columns, vec!["Title".to_string()]);
        assert!(matches!(report.content_document_link, SourceStatus::Unavailable { .. }));
        assert!(report.overlap.is_none());
    }

    #[test]
    fn targets_mark_matches_and_surface_length_finding() {
        let report = analyze_targets(&comparator(), &ReportOptions::default()).unwrap();

        assert_eq!(report.prefix_counts, vec![("001".to_string(), 1), ("003".to_string(), 1)]);
        assert_eq!(report.target_ids, 2);
        assert_eq!(report.target_records, 2);
        assert_eq!(report.matches, 1);
        assert_eq!(report.unmatched, 1);

        let matched: Vec<bool> = report.target_samples.iter().map(|m| m.matched).collect();
        assert_eq!(matched, vec![false, true]);

        assert_eq!(
            report.finding.relation,
            LengthRelation::PartialOverlap {
                shared: vec![15],
                only_left: vec![18],
                only_right: vec![],
            }
        );
        assert!(report.unavailable.is_empty());
    }

    #[test]
    fn oversized_sample_count_lists_every_id() {
        let options = ReportOptions {
            samples: usize::MAX,
            ..ReportOptions::default()
        };
        let report = analyze_targets(&comparator(), &options).unwrap();

        assert_eq!(report.target_samples.len(), 2);
        assert_eq!(report.version_samples.len(), 2);
        assert_eq!(report.match_samples.len(), 1);
    }

    #[test]
    fn targets_report_zero_when_sources_missing() {
        let comparator = Comparator::from_tables(
            Err(PathBuf::from("ContentVersion.csv")),
            Err(PathBuf::from("ContentDocumentLink.csv")),
        );
        let report = analyze_targets(&comparator, &ReportOptions::default()).unwrap();

        assert_eq!(report.target_ids, 0);
        assert_eq!(report.version_ids, 0);
        assert_eq!(report.matches, 0);
        assert!(report.target_samples.is_empty());
        assert_eq!(report.finding.relation, LengthRelation::Empty);
        assert_eq!(report.unavailable.len(), 2);
    }
}
