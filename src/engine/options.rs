use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::config::EngineSection;

/// How groups are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Run the groups of a dimension on a rayon pool
    pub parallel: bool,
    /// Dedicated pool size; `None` uses the global pool
    pub threads: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

impl EngineOptions {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            threads: None,
        }
    }
}

impl From<&EngineSection> for EngineOptions {
    fn from(section: &EngineSection) -> Self {
        Self {
            parallel: section.parallel,
            threads: section.threads,
        }
    }
}

/// Shared flag a host sets to stop a run between groups
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
