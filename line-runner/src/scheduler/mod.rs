//! Scheduler layer for the runner
//!
//! This layer drives one run from submission to a terminal status:
//! starting the backend unit, polling it, and handing every status
//! transition to the reporter. All waiting happens through the [`Pacer`].

pub mod lifecycle;
pub mod pacer;

pub use lifecycle::BuildLifecycle;
pub use pacer::Pacer;
