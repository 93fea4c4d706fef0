//! Column-rename tables and column checks

use crate::types::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One preview row: column name to cell value
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Rename table from an observed column name to the expected one
///
/// Keys and values are trimmed on insert. An empty target means "leave this
/// column alone" and is not stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct ColumnMapping(BTreeMap<String, String>);

impl ColumnMapping {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `observed` to `expected`, replacing any earlier target for `observed`
    ///
    /// Returns `false` when the pair was ignored because either side is blank.
    pub fn insert(&mut self, observed: &str, expected: &str) -> bool {
        let observed = observed.trim();
        let expected = expected.trim();
        if observed.is_empty() || expected.is_empty() {
            return false;
        }
        self.0.insert(observed.to_string(), expected.to_string());
        true
    }

    /// Target for `observed`, looked up by its trimmed form
    pub fn get(&self, observed: &str) -> Option<&str> {
        self.0.get(observed.trim()).map(String::as_str)
    }

    /// Number of renames
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no column is renamed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(observed, expected)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Rename the columns of one row; unmapped columns keep their name
    pub fn apply(&self, row: &Row) -> Row {
        row.iter()
            .map(|(column, value)| {
                let name = self.get(column).unwrap_or(column);
                (name.to_string(), value.clone())
            })
            .collect()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = ColumnMapping::new();
        for (observed, expected) in iter {
            mapping.insert(observed.as_ref(), expected.as_ref());
        }
        mapping
    }
}

impl From<BTreeMap<String, String>> for ColumnMapping {
    fn from(table: BTreeMap<String, String>) -> Self {
        table.into_iter().collect()
    }
}

impl From<ColumnMapping> for BTreeMap<String, String> {
    fn from(mapping: ColumnMapping) -> Self {
        mapping.0
    }
}

/// Encode all mappings as the `column_mappings` JSON object
///
/// Every source file gets a key (its part name), with an empty object when no
/// mapping was confirmed for it.
pub fn column_mappings_json(mappings: &BTreeMap<SourceFile, ColumnMapping>) -> serde_json::Value {
    let object: serde_json::Map<String, serde_json::Value> = SourceFile::ALL
        .iter()
        .map(|file| {
            let table: serde_json::Map<String, serde_json::Value> = mappings
                .get(file)
                .map(|m| {
                    m.iter()
                        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                        .collect()
                })
                .unwrap_or_default();
            (file.part_name().to_string(), serde_json::Value::Object(table))
        })
        .collect();
    serde_json::Value::Object(object)
}

/// Observed columns compared against what a source file should contain
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiff {
    /// Observed columns the optimizer does not know
    pub extra: Vec<String>,
    /// Expected columns that were not observed
    pub missing: Vec<String>,
}

impl ColumnDiff {
    /// Whether the columns match exactly
    pub fn is_clean(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty()
    }
}

/// Compare `observed` column names (after trimming) with the expected set for `file`
pub fn column_diff<S: AsRef<str>>(file: SourceFile, observed: &[S]) -> ColumnDiff {
    let expected = file.expected_columns();
    let observed: Vec<&str> = observed.iter().map(|c| c.as_ref().trim()).collect();

    let extra = observed
        .iter()
        .filter(|c| !expected.iter().any(|e| e == *c))
        .map(|c| c.to_string())
        .collect();
    let missing = expected
        .iter()
        .filter(|e| !observed.iter().any(|c| c == *e))
        .map(|e| e.to_string())
        .collect();

    ColumnDiff { extra, missing }
}
