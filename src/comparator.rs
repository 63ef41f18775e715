use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::compare::{self, Counter, KeySet, TargetSelection};
use crate::error::SourceError;
use crate::source::Table;

pub const ID: &str = "Id";
pub const TITLE: &str = "Title";
pub const CONTENT_DOCUMENT_ID: &str = "ContentDocumentId";
pub const LINKED_ENTITY_ID: &str = "LinkedEntityId";
pub const IS_DELETED: &str = "IsDeleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    ContentVersion,
    ContentDocumentLink,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::ContentVersion => "ContentVersion.csv",
            SourceKind::ContentDocumentLink => "ContentDocumentLink.csv",
        }
    }

    /// Columns the reports read from this export.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            SourceKind::ContentVersion => &[ID, CONTENT_DOCUMENT_ID, TITLE],
            SourceKind::ContentDocumentLink => &[CONTENT_DOCUMENT_ID, LINKED_ENTITY_ID, IS_DELETED],
        }
    }

    /// Columns shown for each leading sample row.
    pub fn sample_columns(self) -> &'static [&'static str] {
        match self {
            SourceKind::ContentVersion => &[CONTENT_DOCUMENT_ID, ID, TITLE],
            SourceKind::ContentDocumentLink => &[CONTENT_DOCUMENT_ID, LINKED_ENTITY_ID],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Locations of the two exports.
#[derive(Debug, Clone)]
pub struct ComparatorConfig {
    pub content_version: PathBuf,
    pub content_document_link: PathBuf,
    pub delimiter: u8,
}

#[derive(Debug)]
enum Slot {
    Loaded(Table),
    Unavailable(PathBuf),
}

impl Slot {
    fn open(kind: SourceKind, path: &Path, delimiter: u8) -> Result<Self, SourceError> {
        match Table::open(path, delimiter) {
            Ok(table) => Ok(Slot::Loaded(table)),
            Err(SourceError::SourceUnavailable { path }) => {
                warn!(action = "open", component = "comparator", source = kind.label(), path = ?path, "Source export not found, skipping dependent analysis");
                Ok(Slot::Unavailable(path))
            }
            Err(e) => Err(e),
        }
    }

    fn table(&self) -> Result<&Table, SourceError> {
        match self {
            Slot::Loaded(table) => Ok(table),
            Slot::Unavailable(path) => Err(SourceError::SourceUnavailable { path: path.clone() }),
        }
    }
}

/// Owns one parsed table per export. Each export is read once; every
/// statistic is derived from the in-memory rows.
#[derive(Debug)]
pub struct Comparator {
    content_version: Slot,
    content_document_link: Slot,
}

impl Comparator {
    /// Parses both exports. A missing file is recorded and surfaces later as
    /// `SourceUnavailable`; a malformed file fails the whole open.
    pub fn open(config: &ComparatorConfig) -> Result<Self, SourceError> {
        let start_time = Instant::now();
        info!(action = "start", component = "comparator", "Loading source exports");

        let content_version = Slot::open(
            SourceKind::ContentVersion,
            &config.content_version,
            config.delimiter,
        )?;
        let content_document_link = Slot::open(
            SourceKind::ContentDocumentLink,
            &config.content_document_link,
            config.delimiter,
        )?;

        info!(
            action = "complete",
            component = "comparator",
            duration_ms = start_time.elapsed().as_millis(),
            "Source exports loaded"
        );

        Ok(Self {
            content_version,
            content_document_link,
        })
    }

    /// Builds a comparator over already parsed tables; `Err` paths stand in
    /// for exports that could not be found.
    pub fn from_tables(
        content_version: Result<Table, PathBuf>,
        content_document_link: Result<Table, PathBuf>,
    ) -> Self {
        let slot = |source: Result<Table, PathBuf>| match source {
            Ok(table) => Slot::Loaded(table),
            Err(path) => Slot::Unavailable(path),
        };
        Self {
            content_version: slot(content_version),
            content_document_link: slot(content_document_link),
        }
    }

    pub fn table(&self, kind: SourceKind) -> Result<&Table, SourceError> {
        match kind {
            SourceKind::ContentVersion => self.content_version.table(),
            SourceKind::ContentDocumentLink => self.content_document_link.table(),
        }
    }

    pub fn is_available(&self, kind: SourceKind) -> bool {
        self.table(kind).is_ok()
    }

    pub fn load_keys(&self, kind: SourceKind, key_column: &str) -> Result<KeySet, SourceError> {
        Ok(compare::load_keys(self.table(kind)?, key_column))
    }

    pub fn count_by_prefix(
        &self,
        kind: SourceKind,
        column: &str,
        prefix_length: usize,
    ) -> Result<Counter, SourceError> {
        Ok(compare::count_by_prefix(self.table(kind)?, column, prefix_length))
    }

    pub fn value_counts(&self, kind: SourceKind, column: &str) -> Result<Counter, SourceError> {
        Ok(compare::value_counts(self.table(kind)?, column))
    }

    pub fn select_targets(
        &self,
        kind: SourceKind,
        link_column: &str,
        key_column: &str,
        allowed_prefixes: &BTreeSet<String>,
    ) -> Result<TargetSelection, SourceError> {
        Ok(compare::select_targets(
            self.table(kind)?,
            link_column,
            key_column,
            allowed_prefixes,
        ))
    }

    pub fn filter_by_prefix_set(
        &self,
        kind: SourceKind,
        link_column: &str,
        key_column: &str,
        allowed_prefixes: &BTreeSet<String>,
    ) -> Result<KeySet, SourceError> {
        Ok(compare::filter_by_prefix_set(
            self.table(kind)?,
            link_column,
            key_column,
            allowed_prefixes,
        ))
    }
}
