//! # Spreadsheet merge service
//!
//! Consolidates the many small per-submission spreadsheets of one task into
//! a single canonical output file.
//!
//! ## Workflow:
//!
//! 1. **Snapshot**: the merger acquires the global I/O coordinator, so the
//!    whole pass sees exactly the uploads completed before it and nothing
//!    from uploads still queued behind it.
//!
//! 2. **Version selection**: the source listing is grouped by logical
//!    identity (filename minus the `_v<N>` suffix) and only the latest
//!    version of each logical file participates.
//!
//! 3. **Row collection**: rows are read from each selected file starting at
//!    the configured header row. A file that fails to open or parse is
//!    skipped and recorded in the result's diagnostics; the batch aborts
//!    only when zero files could be read.
//!
//! 4. **Column resolution**: with a template, its header row dictates the
//!    output column set and order (source columns matched by exact name,
//!    unmatched template columns emitted empty, unmatched source columns
//!    dropped). Without one, the output columns are the first-seen union of
//!    the source headers.
//!
//! 5. **Deduplication**: optionally, rows sharing a composite key built
//!    from the configured columns are collapsed, first occurrence wins.
//!
//! 6. **Output**: the surviving rows are written as one spreadsheet,
//!    atomically, before the lock is released.

mod dedup;
mod sheet;

pub use dedup::{dedup_rows, Row};
pub use sheet::{MergeOptions, SheetMerger};
