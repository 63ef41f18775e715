pub mod analysis;
pub mod args;
pub mod comparator;
pub mod compare;
pub mod error;
pub mod findings;
pub mod report;
pub mod source;
pub mod stats;
pub mod utils;

pub use analysis::{analyze_overview, analyze_targets, run, ReportOptions};
pub use args::Args;
pub use comparator::{Comparator, ComparatorConfig, SourceKind};
pub use compare::{Counter, KeySet};
pub use error::SourceError;
pub use stats::{OverviewReport, TargetReport};
