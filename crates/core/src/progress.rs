//! Per-module study progress for one exam-selection lifecycle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Tracks the lifecycle state of every module in the selected track.
///
/// Statuses never regress: `start` only promotes `NotStarted` modules, and a
/// `Completed` module stays completed. The tracker outlives individual chat
/// screens and is discarded only when a different exam is selected.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    // Catalog order is preserved for dashboard rendering.
    modules: Vec<(String, ModuleStatus)>,
}

impl ProgressTracker {
    pub fn new(module_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            modules: module_ids
                .into_iter()
                .map(|id| (id, ModuleStatus::NotStarted))
                .collect(),
        }
    }

    /// Marks a module as entered. No-op unless it is `NotStarted`.
    pub fn start(&mut self, module_id: &str) {
        if let Some((_, status)) = self.modules.iter_mut().find(|(id, _)| id == module_id) {
            if *status == ModuleStatus::NotStarted {
                *status = ModuleStatus::InProgress;
            }
        }
    }

    /// Marks a module completed, regardless of its current status.
    pub fn complete(&mut self, module_id: &str) {
        if let Some((_, status)) = self.modules.iter_mut().find(|(id, _)| id == module_id) {
            *status = ModuleStatus::Completed;
        }
    }

    pub fn status(&self, module_id: &str) -> Option<ModuleStatus> {
        self.modules
            .iter()
            .find(|(id, _)| id == module_id)
            .map(|(_, status)| *status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ModuleStatus)> {
        self.modules.iter().map(|(id, status)| (id.as_str(), *status))
    }

    /// Completed modules as a whole-number percentage, rounded to nearest.
    /// Defined as 0 for an empty module set.
    pub fn percent_complete(&self) -> u8 {
        if self.modules.is_empty() {
            return 0;
        }
        let completed = self
            .modules
            .iter()
            .filter(|(_, status)| *status == ModuleStatus::Completed)
            .count();
        ((completed as f64 * 100.0) / self.modules.len() as f64).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(n: usize) -> ProgressTracker {
        ProgressTracker::new((0..n).map(|i| format!("module-{i}")))
    }

    #[test]
    fn start_promotes_only_not_started() {
        let mut progress = tracker(2);
        progress.start("module-0");
        assert_eq!(progress.status("module-0"), Some(ModuleStatus::InProgress));

        progress.complete("module-0");
        progress.start("module-0");
        assert_eq!(progress.status("module-0"), Some(ModuleStatus::Completed));
    }

    #[test]
    fn complete_is_unconditional_and_final() {
        let mut progress = tracker(1);
        progress.complete("module-0");
        assert_eq!(progress.status("module-0"), Some(ModuleStatus::Completed));
    }

    #[test]
    fn unknown_module_is_ignored() {
        let mut progress = tracker(1);
        progress.start("missing");
        progress.complete("missing");
        assert_eq!(progress.status("missing"), None);
        assert_eq!(progress.percent_complete(), 0);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        let mut progress = tracker(9);
        for i in 0..3 {
            progress.complete(&format!("module-{i}"));
        }
        // 3 of 9 -> 33.33 -> 33
        assert_eq!(progress.percent_complete(), 33);

        progress.complete("module-3");
        progress.complete("module-4");
        // 5 of 9 -> 55.55 -> 56
        assert_eq!(progress.percent_complete(), 56);
    }

    #[test]
    fn empty_module_set_is_zero_percent() {
        assert_eq!(tracker(0).percent_complete(), 0);
    }
}
