//! Line Core
//!
//! Shared domain types for the line CI run driver.
//!
//! This crate contains the structures exchanged between the runner and its
//! external collaborators: run descriptors, job definitions, pod templates,
//! commit statuses, discussion comments and Jenkins build records.
//! Transport lives in `line-client`, behaviour in `line-runner`.

pub mod domain;
