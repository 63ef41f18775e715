use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;

use crate::compare::{length_histogram, KeySet};

/// Record ids come in a 15-character case-sensitive form and an
/// 18-character form carrying a 3-character checksum suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdShape {
    Short,
    Long,
    Other,
}

impl fmt::Display for IdShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdShape::Short => write!(f, "15-char"),
            IdShape::Long => write!(f, "18-char"),
            IdShape::Other => write!(f, "other"),
        }
    }
}

const ID_PATTERN: &str = r"^[0-9A-Za-z]{15}(?:[0-9A-Za-z]{3})?$";

#[derive(Debug, Clone)]
pub struct IdClassifier {
    pattern: Regex,
}

impl IdClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(ID_PATTERN)?,
        })
    }

    pub fn classify(&self, id: &str) -> IdShape {
        if !self.pattern.is_match(id) {
            return IdShape::Other;
        }
        if id.len() == 15 {
            IdShape::Short
        } else {
            IdShape::Long
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeCounts {
    pub short: usize,
    pub long: usize,
    pub other: usize,
}

impl ShapeCounts {
    pub fn of(keys: &KeySet, classifier: &IdClassifier) -> Self {
        let mut counts = Self::default();
        for key in keys.iter() {
            match classifier.classify(key) {
                IdShape::Short => counts.short += 1,
                IdShape::Long => counts.long += 1,
                IdShape::Other => counts.other += 1,
            }
        }
        counts
    }
}

/// What the id lengths of two key sets have in common. States the
/// observation only; it does not decide why the formats differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LengthRelation {
    Empty,
    Aligned {
        lengths: Vec<usize>,
    },
    PartialOverlap {
        shared: Vec<usize>,
        only_left: Vec<usize>,
        only_right: Vec<usize>,
    },
    Disjoint {
        left: Vec<usize>,
        right: Vec<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFormatFinding {
    pub left_lengths: BTreeMap<usize, usize>,
    pub right_lengths: BTreeMap<usize, usize>,
    pub left_shapes: ShapeCounts,
    pub right_shapes: ShapeCounts,
    pub relation: LengthRelation,
}

impl IdFormatFinding {
    pub fn compare(left: &KeySet, right: &KeySet, classifier: &IdClassifier) -> Self {
        let left_lengths = length_histogram(left);
        let right_lengths = length_histogram(right);
        let relation = relate(&left_lengths, &right_lengths);

        Self {
            left_shapes: ShapeCounts::of(left, classifier),
            right_shapes: ShapeCounts::of(right, classifier),
            left_lengths,
            right_lengths,
            relation,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(
            self.relation,
            LengthRelation::PartialOverlap { .. } | LengthRelation::Disjoint { .. }
        )
    }
}

fn relate(left: &BTreeMap<usize, usize>, right: &BTreeMap<usize, usize>) -> LengthRelation {
    if left.is_empty() || right.is_empty() {
        return LengthRelation::Empty;
    }

    let left: BTreeSet<usize> = left.keys().copied().collect();
    let right: BTreeSet<usize> = right.keys().copied().collect();
    let shared: Vec<usize> = left.intersection(&right).copied().collect();

    if shared.is_empty() {
        LengthRelation::Disjoint {
            left: left.into_iter().collect(),
            right: right.into_iter().collect(),
        }
    } else if left == right {
        LengthRelation::Aligned { lengths: shared }
    } else {
        LengthRelation::PartialOverlap {
            shared,
            only_left: left.difference(&right).copied().collect(),
            only_right: right.difference(&left).copied().collect(),
        }
    }
}
