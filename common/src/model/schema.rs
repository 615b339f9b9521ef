use serde::{Deserialize, Serialize};

/// Declared type of a column in a data-collection schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Number,
    Date,
    Boolean,
}

/// Per-column aggregation strategy for the statistics report.
///
/// This is a closed set on purpose: the aggregator matches exhaustively on
/// it, so adding a mode is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    /// Flat tally across all documents.
    Accumulate,
    /// Tally partitioned by the value of `group_by_field`.
    GroupBy,
}

impl Default for MergeMode {
    fn default() -> Self {
        MergeMode::Accumulate
    }
}

/// One column of a [`TableSchema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub merge_mode: MergeMode,
    /// Column whose value partitions the documents. Meaningful only when
    /// `merge_mode` is `GroupBy`; `GroupBy` without it is a configuration
    /// error that callers must surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by_field: Option<String>,
}

/// Ordered column definitions plus a title.
///
/// Defines both the shape expected in per-submission JSON documents and the
/// shape of the aggregated report. Stored as a JSON document alongside the
/// task configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub title: String,
    pub columns: Vec<ColumnDefinition>,
}
