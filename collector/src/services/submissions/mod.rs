//! Submission write path.
//!
//! Every accepted upload lands in its task's collection folder through the
//! [`VersionedWriter`], which resolves filename collisions according to the
//! task's versioning mode and finalizes writes atomically under the global
//! I/O lock. The `versions` module owns the `_v<N>` naming convention: the
//! probe used while writing, and the latest-version selection used later by
//! the merge pass.

mod versions;
mod write;

pub use versions::{group_by_identity, select_latest, split_version, versioned_name};
pub use write::{validate_submitter, IncomingSubmission, StoreRequest, VersionedWriter};
