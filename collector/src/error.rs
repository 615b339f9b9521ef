use std::path::PathBuf;
use thiserror::Error;

/// The engine's error taxonomy.
///
/// Only failures that abort an operation live here. Per-file problems inside
/// a merge batch (an unparsable spreadsheet, a malformed JSON document) are
/// isolated, counted in the `MergeResult` diagnostics and never raised.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Disk-full, permission-denied and friends. Always surfaced, never
    /// retried by the engine; the caller decides whether to retry.
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `GroupBy` column with no group-by field configured.
    #[error("column '{column}' uses GroupBy but has no groupByField")]
    GroupByMissingField { column: String },

    /// The merge source folder contains no candidate files at all.
    #[error("source folder {path} contains no input files")]
    EmptySourceFolder { path: PathBuf },

    /// The merge template itself could not be opened or parsed.
    #[error("failed to read template {path}: {detail}")]
    TemplateUnreadable { path: PathBuf, detail: String },

    /// A merge template whose header matches no column of any source file.
    #[error("template {path} has no columns in common with the source files")]
    TemplateWithoutMatches { path: PathBuf },

    /// Candidate files existed but none could be read; nothing was written.
    #[error("no readable source files in {path}")]
    NoReadableFiles { path: PathBuf },

    /// Two files share the same logical identity and the same `_v<N>`
    /// suffix. Must not occur under the versioned writer's contract, so it
    /// is surfaced as a data-integrity problem rather than resolved.
    #[error("conflicting version {version} for '{base}'")]
    DuplicateVersion { base: String, version: u32 },

    #[error("failed to parse schema {path}: {source}")]
    SchemaParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A submission rejected before anything was written.
    #[error("submission rejected: {reason}")]
    SubmissionRejected { reason: String },
}

pub type CollectorResult<T> = Result<T, CollectorError>;

impl CollectorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollectorError::Io {
            path: path.into(),
            source,
        }
    }
}
