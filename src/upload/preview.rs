//! Preview endpoint response

use super::mapping::{ColumnDiff, Row};
use serde::{Deserialize, Serialize};

/// What the preview endpoint reports about one uploaded file
///
/// A body-level `error` does not make the response unusable: the server may
/// still return partial rows and column lists alongside it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    /// First rows of the parsed file
    #[serde(default)]
    pub preview: Vec<Row>,

    /// Columns the server did not expect
    #[serde(default)]
    pub extra_cols: Vec<String>,

    /// Expected columns the file lacks
    #[serde(default)]
    pub missing_cols: Vec<String>,

    /// Problem reported by the server while parsing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreviewResponse {
    /// Column names of the first row
    pub fn columns(&self) -> Vec<&str> {
        self.preview
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Server's column comparison
    pub fn column_diff(&self) -> ColumnDiff {
        ColumnDiff {
            extra: self.extra_cols.clone(),
            missing: self.missing_cols.clone(),
        }
    }

    /// Whether the file yielded at least one row
    pub fn has_rows(&self) -> bool {
        !self.preview.is_empty()
    }
}
