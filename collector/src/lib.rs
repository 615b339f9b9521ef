//! Collection & merge engine.
//!
//! Lands per-task submissions on disk without collision or corruption and
//! later consolidates them into one canonical artifact: a merged spreadsheet
//! for file-collection tasks, or an aggregated statistics report for
//! data-collection tasks.
//!
//! All disk access funnels through a single [`coordinator::IoCoordinator`];
//! the services acquire it before touching the collection tree so a merge
//! pass always sees a stable snapshot of completed uploads.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod fs;
pub mod services;
pub mod task_controller;
pub mod validate;

pub use error::{CollectorError, CollectorResult};
