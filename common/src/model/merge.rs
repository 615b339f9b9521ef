use serde::{Deserialize, Serialize};

/// Outcome of one merge or aggregation run.
///
/// Produced fresh by every merge call and never persisted. Per-file failures
/// are accumulated here instead of aborting the batch: the operator sees an
/// overall success flag plus counts and diagnostics, not a stack trace per
/// bad row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    /// Source files (or JSON documents) successfully folded into the output.
    pub files_merged: u32,
    /// Files skipped because they could not be opened or parsed.
    pub files_failed: u32,
    /// Rows (or documents) in the output after deduplication.
    pub rows_merged: u32,
    /// Rows dropped by the deduplication pass.
    pub duplicates_removed: u32,
    pub success: bool,
    /// One diagnostic line per skipped file.
    pub errors: Vec<String>,
}

impl MergeResult {
    pub fn new() -> Self {
        MergeResult {
            files_merged: 0,
            files_failed: 0,
            rows_merged: 0,
            duplicates_removed: 0,
            success: false,
            errors: Vec::new(),
        }
    }

    /// Records one unreadable or unparsable source file.
    pub fn record_failure(&mut self, detail: impl Into<String>) {
        self.files_failed += 1;
        self.errors.push(detail.into());
    }
}

impl Default for MergeResult {
    fn default() -> Self {
        Self::new()
    }
}
