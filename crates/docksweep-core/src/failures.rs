//! Failure set calculation: which submitted items never produced output.

use std::collections::{HashMap, HashSet};

use crate::manifest::WorkItem;

/// Outcome of comparing a run's submitted items against its completed set.
#[derive(Debug)]
pub struct FailureReport {
    /// Unique submitted items.
    pub total: usize,
    /// Submitted items that appear in the completed set.
    pub completed: usize,
    /// Submitted items absent from the completed set, in manifest read
    /// order (stable across runs with unchanged inputs).
    pub failed: Vec<WorkItem>,
}

impl FailureReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Percentage of submitted items that completed, for the counts report.
    /// Rendered with one decimal place.
    pub fn completed_pct(&self) -> f64 {
        pct(self.completed, self.total)
    }

    pub fn failed_pct(&self) -> f64 {
        pct(self.failed.len(), self.total)
    }
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Computes `submitted − finished`. Duplicate identifiers in `submitted`
/// collapse to one entry (last row wins for the ligand path, first
/// occurrence wins for position), mirroring how the manifests were built.
pub fn failure_report(submitted: Vec<WorkItem>, finished: &HashSet<String>) -> FailureReport {
    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, WorkItem> = HashMap::new();
    for item in submitted {
        if !by_name.contains_key(&item.name) {
            order.push(item.name.clone());
        }
        by_name.insert(item.name.clone(), item);
    }

    let total = order.len();
    let failed: Vec<WorkItem> = order
        .iter()
        .filter(|name| !finished.contains(*name))
        .filter_map(|name| by_name.remove(name))
        .collect();

    FailureReport {
        total,
        completed: total - failed.len(),
        failed,
    }
}
