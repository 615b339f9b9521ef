use serde::{Deserialize, Serialize};

/// What kind of submissions a task collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    /// Submitters upload a spreadsheet file.
    FileCollection,
    /// Submitters fill an online form; entries land as JSON documents.
    DataCollection,
}

/// Policy applied when an incoming file collides with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersioningMode {
    /// The existing file is silently replaced.
    Overwrite,
    /// The new file gets the next free `_v<N>` suffix.
    AutoVersion,
}

/// A configured collection point with its own folder tree and policies.
///
/// Tasks are created by the operator and mutated only through the submission
/// pipeline (counts) or explicit configuration edits. Deleting a task does
/// not retroactively alter the submission records already taken under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identifier (UUID).
    pub id: String,
    /// URL-safe short name, part of the collection folder name.
    pub slug: String,
    /// Human-readable title shown to submitters.
    pub title: String,
    pub task_type: TaskType,
    pub versioning: VersioningMode,
    /// Number of submissions accepted so far.
    pub submission_count: u32,
    /// Optional cap on accepted submissions.
    pub max_submissions: Option<u32>,
    pub is_active: bool,
    /// Extension allow-list for uploads, with leading dot (".xlsx", ".csv").
    pub allowed_extensions: Vec<String>,
    pub allow_attachments: bool,
}

impl Task {
    /// Folder name under the storage root where this task's submissions land.
    ///
    /// Derived deterministically from title and slug so that re-loading the
    /// same task configuration always resolves to the same directory.
    pub fn collection_dir_name(&self) -> String {
        format!(
            "{}_{}",
            sanitize_component(&self.title),
            sanitize_component(&self.slug)
        )
    }

    pub fn is_full(&self) -> bool {
        match self.max_submissions {
            Some(max) => self.submission_count >= max,
            None => false,
        }
    }
}

/// Strips characters that are hostile in file or folder names and collapses
/// whitespace to underscores. Never returns an empty string.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
