//! Build identifier generation

#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of build identifiers for pod runs
///
/// Identifiers name the pod and appear in result URLs, so they only need to
/// be unique within the namespace.
pub trait BuildIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random non-negative 63-bit identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBuildIds;

impl BuildIdGenerator for RandomBuildIds {
    fn next_id(&self) -> String {
        ((Uuid::new_v4().as_u128() as u64) >> 1).to_string()
    }
}

/// Monotonic counter, for deterministic runs
#[cfg(test)]
#[derive(Debug)]
pub struct SequentialBuildIds {
    next: AtomicU64,
}

#[cfg(test)]
impl SequentialBuildIds {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

#[cfg(test)]
impl BuildIdGenerator for SequentialBuildIds {
    fn next_id(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}
