//! Key extraction and set comparison over parsed source tables.
//!
//! Every function here is a pure read of a [`Table`]. Keys compare by exact
//! text equality; nothing is trimmed, case folded or re-encoded, since the
//! point is to expose mismatched id formats rather than paper over them.
//! Lengths and prefixes are measured in characters.

use std::collections::{BTreeMap, BTreeSet};

use crate::source::Table;

/// Width of the id prefix used as a coarse object-type discriminator.
pub const PREFIX_LEN: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: BTreeSet<String>,
}

impl KeySet {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// First `n` members in key order.
    pub fn sample(&self, n: usize) -> Vec<&str> {
        self.iter().take(n).collect()
    }

    /// True when every member of `self` is also in `other`.
    pub fn is_subset(&self, other: &KeySet) -> bool {
        self.keys.is_subset(&other.keys)
    }
}

impl<S: Into<String>> FromIterator<S> for KeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Occurrence counts keyed by text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counter {
    counts: BTreeMap<String, usize>,
}

impl Counter {
    pub fn add(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Highest counts first; ties broken by key.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}

/// Result of restricting a link export to a set of entity prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSelection {
    /// Distinct key values of the selected rows.
    pub keys: KeySet,
    /// Selected rows, duplicates included.
    pub records: usize,
    /// Prefix distribution over rows carrying both a link and a key value.
    pub prefix_counts: Counter,
}

/// Leading `len` characters of `value`, or `None` when it is shorter.
pub fn char_prefix(value: &str, len: usize) -> Option<&str> {
    if len == 0 {
        return Some("");
    }
    match value.char_indices().nth(len) {
        Some((end, _)) => Some(&value[..end]),
        None if value.chars().count() == len => Some(value),
        None => None,
    }
}

pub fn load_keys(table: &Table, key_column: &str) -> KeySet {
    table
        .column_values(key_column)
        .filter(|value| !value.is_empty())
        .collect()
}

pub fn count_by_prefix(table: &Table, column: &str, prefix_length: usize) -> Counter {
    let mut counter = Counter::default();
    for value in table.column_values(column) {
        if let Some(prefix) = char_prefix(value, prefix_length) {
            counter.add(prefix);
        }
    }
    counter
}

/// Raw value distribution of `column`, empty values included.
pub fn value_counts(table: &Table, column: &str) -> Counter {
    let mut counter = Counter::default();
    for value in table.column_values(column) {
        counter.add(value);
    }
    counter
}

pub fn distinct_value_count(keys: &KeySet) -> usize {
    keys.len()
}

pub fn intersect(a: &KeySet, b: &KeySet) -> KeySet {
    KeySet {
        keys: a.keys.intersection(&b.keys).cloned().collect(),
    }
}

/// Members of `a` that are absent from `b`.
pub fn difference(a: &KeySet, b: &KeySet) -> KeySet {
    KeySet {
        keys: a.keys.difference(&b.keys).cloned().collect(),
    }
}

pub fn length_histogram(keys: &KeySet) -> BTreeMap<usize, usize> {
    let mut histogram = BTreeMap::new();
    for key in keys.iter() {
        *histogram.entry(key.chars().count()).or_insert(0) += 1;
    }
    histogram
}

pub fn select_targets(
    table: &Table,
    link_column: &str,
    key_column: &str,
    allowed_prefixes: &BTreeSet<String>,
) -> TargetSelection {
    let mut selection = TargetSelection::default();
    let mut keys = BTreeSet::new();

    for row in table.rows() {
        let (Some(link), Some(key)) = (row.get(link_column), row.get(key_column)) else {
            continue;
        };
        if link.is_empty() || key.is_empty() {
            continue;
        }
        let Some(prefix) = char_prefix(link, PREFIX_LEN) else {
            continue;
        };

        selection.prefix_counts.add(prefix);
        if allowed_prefixes.contains(prefix) {
            selection.records += 1;
            keys.insert(key.to_string());
        }
    }

    selection.keys = KeySet { keys };
    selection
}

pub fn filter_by_prefix_set(
    table: &Table,
    link_column: &str,
    key_column: &str,
    allowed_prefixes: &BTreeSet<String>,
) -> KeySet {
    select_targets(table, link_column, key_column, allowed_prefixes).keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(input: &str) -> Table {
        Table::from_reader(input.as_bytes(), b',', "inline.csv").unwrap()
    }

    fn prefixes(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|p| p.to_string()).collect()
    }

    fn keys(items: &[&str]) -> KeySet {
        items.iter().copied().collect()
    }

    #[test]
    fn duplicate_keys_collapse() {
        let t = table("ContentDocumentId,Title\n069x1,a\n069x1,b\n069x2,c\n");
        let loaded = load_keys(&t, "ContentDocumentId");

        assert_eq!(loaded, keys(&["069x1", "069x2"]));
        assert_eq!(distinct_value_count(&loaded), 2);
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn empty_and_missing_values_are_not_keys() {
        let t = table("Id,ContentDocumentId\n1,069a\n2,\n3\n4,069b\n");
        let loaded = load_keys(&t, "ContentDocumentId");

        assert_eq!(loaded, keys(&["069a", "069b"]));
        assert_eq!(t.skipped_rows("ContentDocumentId"), 2);
        assert!(distinct_value_count(&loaded) < t.row_count());
    }

    #[test]
    fn distinct_count_equals_rows_when_unique() {
        let t = table("ContentDocumentId\n069a\n069b\n069c\n");
        assert_eq!(distinct_value_count(&load_keys(&t, "ContentDocumentId")), t.row_count());
    }

    #[test]
    fn keys_are_not_normalised() {
        let t = table("ContentDocumentId\n069AbC\n069abc\n\" 069abc\"\n");
        assert_eq!(load_keys(&t, "ContentDocumentId").len(), 3);
    }

    #[test]
    fn prefix_counter_excludes_short_values() {
        let t = table("LinkedEntityId\n001aaa\n001bbb\n00\n\n003ccc\n005\n");
        let counter = count_by_prefix(&t, "LinkedEntityId", 3);

        assert_eq!(counter.get("001"), 2);
        assert_eq!(counter.get("003"), 1);
        assert_eq!(counter.get("005"), 1);
        assert_eq!(counter.total(), 4);
        assert!(counter.iter().all(|(key, _)| key.chars().count() == 3));
    }

    #[test]
    fn prefix_counter_measures_characters() {
        let t = table("LinkedEntityId\nあいうえ\nあい\n");
        let counter = count_by_prefix(&t, "LinkedEntityId", 3);

        assert_eq!(counter.get("あいう"), 1);
        assert_eq!(counter.total(), 1);
    }

    #[test]
    fn most_common_orders_by_count_then_key() {
        let mut counter = Counter::default();
        for key in ["005", "001", "003", "001", "005", "00Q"] {
            counter.add(key);
        }

        assert_eq!(counter.most_common(3), vec![("001", 2), ("005", 2), ("003", 1)]);
        assert_eq!(counter.most_common(10).len(), 4);
    }

    #[test]
    fn value_counts_keep_empty_values() {
        let t = table("IsDeleted\nfalse\nfalse\ntrue\n\"\"\n");
        let counts = value_counts(&t, "IsDeleted");

        assert_eq!(counts.get("false"), 2);
        assert_eq!(counts.get("true"), 1);
        assert_eq!(counts.get(""), 1);
    }

    #[test]
    fn intersect_is_commutative_and_idempotent() {
        let a = keys(&["069a", "069b", "069c"]);
        let b = keys(&["069b", "069c", "069d"]);

        assert_eq!(intersect(&a, &b), intersect(&b, &a));
        assert_eq!(intersect(&a, &a), a);
        assert_eq!(intersect(&a, &b), keys(&["069b", "069c"]));
        assert!(intersect(&a, &KeySet::default()).is_empty());
    }

    #[test]
    fn difference_keeps_left_only_members() {
        let a = keys(&["069a", "069b"]);
        let b = keys(&["069b"]);

        assert_eq!(difference(&a, &b), keys(&["069a"]));
        assert!(difference(&b, &a).is_empty());
    }

    #[test]
    fn length_histogram_groups_by_char_length() {
        let set = keys(&["069000000000001", "069000000000002", "069000000000003AAA", ""]);
        let histogram = length_histogram(&set);

        assert_eq!(histogram.get(&15), Some(&2));
        assert_eq!(histogram.get(&18), Some(&1));
        assert_eq!(histogram.get(&0), Some(&1));
    }

    #[test]
    fn prefix_filter_selects_allowed_entities() {
        let t = table("LinkedEntityId,ContentDocumentId\n001abc,069x1\n005xyz,069x9\n");
        let selected = filter_by_prefix_set(
            &t,
            "LinkedEntityId",
            "ContentDocumentId",
            &prefixes(&["001", "003"]),
        );

        assert_eq!(selected, keys(&["069x1"]));
    }

    #[test]
    fn prefix_filter_is_subset_of_all_keys() {
        let t = table(
            "LinkedEntityId,ContentDocumentId\n001a,069a\n003b,069b\n005c,069c\n00,069d\n001e,\n,069f\n003g,069a\n",
        );
        let allowed = prefixes(&["001", "003"]);
        let selected = filter_by_prefix_set(&t, "LinkedEntityId", "ContentDocumentId", &allowed);

        assert_eq!(selected, keys(&["069a", "069b"]));
        assert!(selected.is_subset(&load_keys(&t, "ContentDocumentId")));
    }

    #[test]
    fn target_selection_counts_rows_and_prefixes() {
        let t = table(
            "LinkedEntityId,ContentDocumentId\n001a,069a\n001b,069a\n003c,069b\n005d,069c\n005e,\n",
        );
        let selection = select_targets(
            &t,
            "LinkedEntityId",
            "ContentDocumentId",
            &prefixes(&["001", "003"]),
        );

        assert_eq!(selection.records, 3);
        assert_eq!(selection.keys.len(), 2);
        assert_eq!(selection.prefix_counts.get("001"), 2);
        assert_eq!(selection.prefix_counts.get("003"), 1);
        // row without a ContentDocumentId is not counted
        assert_eq!(selection.prefix_counts.get("005"), 1);
    }

    #[test]
    fn char_prefix_boundaries() {
        assert_eq!(char_prefix("001", 3), Some("001"));
        assert_eq!(char_prefix("0012", 3), Some("001"));
        assert_eq!(char_prefix("00", 3), None);
        assert_eq!(char_prefix("", 0), Some(""));
        assert_eq!(char_prefix("日本語テキスト", 2), Some("日本"));
    }

    #[test]
    fn sample_is_ordered_and_bounded() {
        let set = keys(&["069c", "069a", "069b"]);
        assert_eq!(set.sample(2), vec!["069a", "069b"]);
        assert_eq!(set.sample(10).len(), 3);
    }
}
