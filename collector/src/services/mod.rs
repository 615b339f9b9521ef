pub mod merge;
pub mod stats;
pub mod submissions;
