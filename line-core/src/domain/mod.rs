//! Core domain types
//!
//! These types describe one CI run and the objects the runner reads from or
//! writes to GitHub, Kubernetes and Jenkins.

pub mod comment;
pub mod jenkins;
pub mod job;
pub mod pod;
pub mod run;
pub mod status;
