use crate::model::task::sanitize_component;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable record of one accepted upload or form entry.
///
/// Created exactly once when a submission is accepted and never mutated
/// afterwards; the operator may delete records individually or in bulk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub task_id: String,
    pub submitter_name: String,
    pub contact: String,
    pub department: String,
    /// Filename as sent by the client.
    pub original_filename: String,
    /// Filename actually used on disk (after versioning).
    pub stored_filename: String,
    pub submitted_at: DateTime<Utc>,
    pub client_addr: Option<String>,
    /// Relative path of an accompanying attachment, when one was uploaded.
    pub attachment_path: Option<String>,
}

/// Derives the logical base filename for a submission from the submitter's
/// identity fields plus the original file's extension (with leading dot).
///
/// All version-suffixed copies of a re-submitting user share this base name.
pub fn base_filename(name: &str, contact: &str, department: &str, extension: &str) -> String {
    format!(
        "{}_{}_{}{}",
        sanitize_component(name),
        sanitize_component(contact),
        sanitize_component(department),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_filename_joins_identity_fields() {
        assert_eq!(
            base_filename("Ada Lovelace", "13800001111", "R&D", ".xlsx"),
            "Ada_Lovelace_13800001111_R&D.xlsx"
        );
    }
}
