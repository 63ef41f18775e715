use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while opening or parsing a source export.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source file not found: {}", path.display())]
    SourceUnavailable { path: PathBuf },
    #[error("source path is not a regular file: {}", path.display())]
    NotAFile { path: PathBuf },
    #[error("malformed record in {} at line {line}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SourceError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SourceError::SourceUnavailable { .. })
    }
}
