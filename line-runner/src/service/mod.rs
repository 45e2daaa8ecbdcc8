//! Service layer
//!
//! Services hold the run's reporting logic: result URL construction, build
//! identifier generation, and status and failure comment synchronization.

mod build_id;
mod reporter;
mod urls;

pub use build_id::{BuildIdGenerator, RandomBuildIds};
pub use reporter::{ReportOptions, Sinks, StatusReporter};
pub use urls::ResultUrls;

#[cfg(test)]
pub use build_id::SequentialBuildIds;
