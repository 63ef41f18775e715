use std::path::PathBuf;

use crate::comparator::SourceKind;
use crate::compare::Counter;
use crate::findings::IdFormatFinding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOverview {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub missing_columns: Vec<String>,
    /// Leading rows as `(column, value)` pairs; absent values read `N/A`.
    pub leading_rows: Vec<Vec<(String, String)>>,
    pub row_count: usize,
    pub distinct_document_ids: usize,
    pub skipped_document_rows: usize,
    /// ContentDocumentId values in row order, duplicates included.
    pub document_id_samples: Vec<String>,
    pub is_deleted: Option<Counter>,
    pub top_prefixes: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Available(Box<SourceOverview>),
    Unavailable { kind: SourceKind, path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub version_ids: usize,
    pub link_ids: usize,
    pub common_ids: usize,
    pub common_samples: Vec<String>,
    pub version_samples: Vec<String>,
    pub link_samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewReport {
    pub content_version: SourceStatus,
    pub content_document_link: SourceStatus,
    /// Present only when both exports were readable.
    pub overlap: Option<Overlap>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedId {
    pub id: String,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub prefixes: Vec<String>,
    /// Row counts for each target prefix, in the order requested.
    pub prefix_counts: Vec<(String, usize)>,
    pub target_ids: usize,
    pub target_records: usize,
    pub version_ids: usize,
    pub matches: usize,
    pub match_samples: Vec<String>,
    pub unmatched: usize,
    pub target_samples: Vec<MarkedId>,
    pub version_samples: Vec<MarkedId>,
    pub finding: IdFormatFinding,
    pub unavailable: Vec<(SourceKind, PathBuf)>,
}
