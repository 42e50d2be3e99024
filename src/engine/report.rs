//! Run results

use serde::Serialize;
use crate::error::ErrorKind;
use crate::output::OutputStore;

/// One failed dimension, group or widget
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FailureRecord {
    pub dimension: String,
    /// `None` when the whole dimension failed (relation build)
    pub group_id: Option<String>,
    pub widget: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of a run
#[derive(Debug, Default)]
pub struct RunReport {
    pub outputs: OutputStore,
    /// Sorted by dimension, group, widget
    pub failures: Vec<FailureRecord>,
    pub groups_processed: usize,
    pub cancelled: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Failures of one dimension
    pub fn failures_for<'r>(&'r self, dimension: &'r str) -> impl Iterator<Item = &'r FailureRecord> + 'r {
        self.failures.iter().filter(move |f| f.dimension == dimension)
    }
}
