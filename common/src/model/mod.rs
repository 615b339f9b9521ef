pub mod merge;
pub mod schema;
pub mod submission;
pub mod task;
