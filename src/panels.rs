//! View-state for the collapsible detail panels of the dashboard.
//!
//! Each build cell, module row and case row has an associated details panel
//! and a shown-details marker on its summary row. `PanelState` owns one
//! record per known id; the toggle operations keep two invariants: at most
//! one build panel and at most one case panel is visible at any time, and
//! collapsing module details always collapses case details with them.

use crate::report::{CaseId, CommitId, ModuleId, Report};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PanelEntry {
    details_visible: bool,
    marker: bool,
}

#[derive(Debug, Default)]
pub struct PanelState {
    builds: HashMap<CommitId, PanelEntry>,
    modules: HashMap<ModuleId, PanelEntry>,
    cases: HashMap<CaseId, PanelEntry>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_report(report: &Report) -> Self {
        let mut state = Self::new();
        state.rebuild_for(report);
        state
    }

    /// Syncs the known ids with a (re)loaded report. Panels that survive the
    /// reload keep their visibility; vanished ids are dropped.
    pub fn rebuild_for(&mut self, report: &Report) {
        let mut builds = HashMap::new();
        for commit in &report.commits {
            let entry = self.builds.get(&commit.id).copied().unwrap_or_default();
            builds.insert(commit.id.clone(), entry);
        }
        let mut modules = HashMap::new();
        let mut cases = HashMap::new();
        for module in &report.modules {
            let entry = self.modules.get(&module.id).copied().unwrap_or_default();
            modules.insert(module.id.clone(), entry);
            for case in &module.cases {
                let entry = self.cases.get(&case.id).copied().unwrap_or_default();
                cases.insert(case.id.clone(), entry);
            }
        }
        self.builds = builds;
        self.modules = modules;
        self.cases = cases;
    }

    pub fn register_commit(&mut self, id: CommitId) {
        self.builds.entry(id).or_default();
    }

    pub fn register_module(&mut self, id: ModuleId) {
        self.modules.entry(id).or_default();
    }

    pub fn register_case(&mut self, id: CaseId) {
        self.cases.entry(id).or_default();
    }

    /// Toggles the visibility of the build details for the given commit.
    ///
    /// Selecting a new commit first closes any other open build panel
    /// (radio-button semantics); selecting the currently open one closes it.
    /// An unknown commit behaves like an empty selection: every marker is
    /// cleared and every build panel ends up hidden.
    pub fn toggle_build_details(&mut self, commit: &CommitId) {
        for entry in self.builds.values_mut() {
            entry.marker = false;
        }

        let was_visible = self.builds.get(commit).is_some_and(|e| e.details_visible);
        if was_visible {
            if let Some(entry) = self.builds.get_mut(commit) {
                entry.details_visible = false;
            }
        } else {
            for entry in self.builds.values_mut() {
                entry.details_visible = false;
            }
            if let Some(entry) = self.builds.get_mut(commit) {
                entry.marker = true;
                entry.details_visible = true;
            }
        }
    }

    /// Hides all shown case results and details for every case. Idempotent.
    pub fn hide_case_results_and_details(&mut self) {
        for entry in self.cases.values_mut() {
            entry.marker = false;
            entry.details_visible = false;
        }
    }

    /// Toggles the visibility of the details for the given module.
    ///
    /// Case details are hidden afterwards even when the module was just
    /// expanded: a newly expanded module starts with no case expanded.
    pub fn toggle_module_details(&mut self, module: &ModuleId) {
        if let Some(entry) = self.modules.get_mut(module) {
            entry.details_visible = !entry.details_visible;
            entry.marker = entry.details_visible;
        }
        self.hide_case_results_and_details();
    }

    /// Toggles the visibility of the details for the given case. Opening a
    /// case closes every other one first.
    pub fn toggle_case_details(&mut self, case: &CaseId) {
        let was_visible = self.cases.get(case).is_some_and(|e| e.details_visible);
        self.hide_case_results_and_details();
        if !was_visible {
            if let Some(entry) = self.cases.get_mut(case) {
                entry.marker = true;
                entry.details_visible = true;
            }
        }
    }

    // --- Queries ---

    pub fn build_details_visible(&self, commit: &CommitId) -> bool {
        self.builds.get(commit).is_some_and(|e| e.details_visible)
    }

    pub fn build_cell_marked(&self, commit: &CommitId) -> bool {
        self.builds.get(commit).is_some_and(|e| e.marker)
    }

    pub fn module_details_visible(&self, module: &ModuleId) -> bool {
        self.modules.get(module).is_some_and(|e| e.details_visible)
    }

    pub fn module_row_marked(&self, module: &ModuleId) -> bool {
        self.modules.get(module).is_some_and(|e| e.marker)
    }

    pub fn case_details_visible(&self, case: &CaseId) -> bool {
        self.cases.get(case).is_some_and(|e| e.details_visible)
    }

    pub fn case_row_marked(&self, case: &CaseId) -> bool {
        self.cases.get(case).is_some_and(|e| e.marker)
    }

    pub fn visible_build(&self) -> Option<&CommitId> {
        self.builds
            .iter()
            .find(|(_, e)| e.details_visible)
            .map(|(id, _)| id)
    }

    pub fn visible_case(&self) -> Option<&CaseId> {
        self.cases
            .iter()
            .find(|(_, e)| e.details_visible)
            .map(|(id, _)| id)
    }

    pub fn marked_build_count(&self) -> usize {
        self.builds.values().filter(|e| e.marker).count()
    }

    pub fn marked_case_count(&self) -> usize {
        self.cases.values().filter(|e| e.marker).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state_with_builds(ids: &[&str]) -> PanelState {
        let mut state = PanelState::new();
        for id in ids {
            state.register_commit(CommitId::new(*id));
        }
        state
    }

    fn state_with_cases(ids: &[&str]) -> PanelState {
        let mut state = PanelState::new();
        for id in ids {
            state.register_case(CaseId::new(*id));
        }
        state
    }

    // --- Build panels ---

    #[test]
    fn toggle_build_shows_panel_and_marks_cell() {
        let mut state = state_with_builds(&["a", "b"]);
        let a = CommitId::new("a");
        state.toggle_build_details(&a);
        assert!(state.build_details_visible(&a));
        assert!(state.build_cell_marked(&a));
        assert_eq!(state.marked_build_count(), 1);
    }

    #[test]
    fn toggle_build_twice_returns_to_all_hidden() {
        let mut state = state_with_builds(&["a", "b"]);
        let a = CommitId::new("a");
        state.toggle_build_details(&a);
        state.toggle_build_details(&a);
        assert!(!state.build_details_visible(&a));
        assert_eq!(state.marked_build_count(), 0);
        assert_eq!(state.visible_build(), None);
    }

    #[test]
    fn selecting_second_build_closes_first() {
        let mut state = state_with_builds(&["a", "b"]);
        let a = CommitId::new("a");
        let b = CommitId::new("b");
        state.toggle_build_details(&a);
        state.toggle_build_details(&b);
        assert!(!state.build_details_visible(&a));
        assert!(state.build_details_visible(&b));
        assert!(!state.build_cell_marked(&a));
        assert!(state.build_cell_marked(&b));
        assert_eq!(state.marked_build_count(), 1);
    }

    #[test]
    fn at_most_one_build_panel_visible() {
        let mut state = state_with_builds(&["a", "b", "c"]);
        for id in ["a", "b", "c", "b"] {
            state.toggle_build_details(&CommitId::new(id));
            let visible = ["a", "b", "c"]
                .iter()
                .filter(|i| state.build_details_visible(&CommitId::new(**i)))
                .count();
            assert!(visible <= 1);
        }
    }

    #[test]
    fn toggle_unknown_build_collapses_everything() {
        let mut state = state_with_builds(&["a"]);
        let a = CommitId::new("a");
        state.toggle_build_details(&a);
        assert!(state.build_details_visible(&a));

        // Empty-selection semantics: the marker sweep and the hide-all branch
        // still run for an id that matches nothing.
        state.toggle_build_details(&CommitId::new("nope"));
        assert!(!state.build_details_visible(&a));
        assert_eq!(state.marked_build_count(), 0);
    }

    #[test]
    fn marker_iff_visible_for_builds() {
        let mut state = state_with_builds(&["a", "b"]);
        for id in ["a", "b", "a", "a", "b", "b"] {
            state.toggle_build_details(&CommitId::new(id));
            for i in ["a", "b"] {
                let commit = CommitId::new(i);
                assert_eq!(
                    state.build_cell_marked(&commit),
                    state.build_details_visible(&commit)
                );
            }
        }
    }

    // --- Case panels ---

    #[test]
    fn hide_case_results_and_details_is_idempotent() {
        let mut state = state_with_cases(&["17", "42"]);
        state.toggle_case_details(&CaseId::new("17"));
        state.hide_case_results_and_details();
        let after_once: Vec<bool> = ["17", "42"]
            .iter()
            .map(|i| state.case_details_visible(&CaseId::new(*i)))
            .collect();
        state.hide_case_results_and_details();
        let after_twice: Vec<bool> = ["17", "42"]
            .iter()
            .map(|i| state.case_details_visible(&CaseId::new(*i)))
            .collect();
        assert_eq!(after_once, after_twice);
        assert_eq!(state.marked_case_count(), 0);
    }

    #[test]
    fn case_toggle_round_trip() {
        let mut state = state_with_cases(&["17"]);
        let case = CaseId::new("17");
        state.toggle_case_details(&case);
        assert!(state.case_details_visible(&case));
        assert!(state.case_row_marked(&case));
        state.toggle_case_details(&case);
        assert!(!state.case_details_visible(&case));
        assert!(!state.case_row_marked(&case));
    }

    #[test]
    fn switching_cases_is_single_selection() {
        let mut state = state_with_cases(&["17", "42"]);
        let first = CaseId::new("17");
        let second = CaseId::new("42");
        state.toggle_case_details(&first);
        state.toggle_case_details(&second);
        assert!(!state.case_details_visible(&first));
        assert!(!state.case_row_marked(&first));
        assert!(state.case_details_visible(&second));
        assert!(state.case_row_marked(&second));
        assert_eq!(state.visible_case(), Some(&second));
    }

    #[test]
    fn toggle_unknown_case_collapses_open_case() {
        let mut state = state_with_cases(&["17"]);
        let case = CaseId::new("17");
        state.toggle_case_details(&case);
        state.toggle_case_details(&CaseId::new("99"));
        assert!(!state.case_details_visible(&case));
        assert_eq!(state.marked_case_count(), 0);
    }

    // --- Module panels and the cascade ---

    #[test]
    fn module_toggle_sets_and_clears_marker() {
        let mut state = PanelState::new();
        state.register_module(ModuleId::new("core"));
        let module = ModuleId::new("core");
        state.toggle_module_details(&module);
        assert!(state.module_details_visible(&module));
        assert!(state.module_row_marked(&module));
        state.toggle_module_details(&module);
        assert!(!state.module_details_visible(&module));
        assert!(!state.module_row_marked(&module));
    }

    #[test]
    fn collapsing_module_hides_case_details() {
        let mut state = PanelState::new();
        state.register_module(ModuleId::new("core"));
        state.register_case(CaseId::new("17"));
        let module = ModuleId::new("core");
        let case = CaseId::new("17");

        state.toggle_module_details(&module);
        state.toggle_case_details(&case);
        assert!(state.case_details_visible(&case));

        state.toggle_module_details(&module);
        assert!(!state.module_details_visible(&module));
        assert!(!state.case_details_visible(&case));
        assert!(!state.case_row_marked(&case));
    }

    #[test]
    fn expanding_module_also_clears_case_details() {
        // The cascade runs even when the module was just expanded: a freshly
        // opened module starts with no case expanded.
        let mut state = PanelState::new();
        state.register_module(ModuleId::new("a"));
        state.register_module(ModuleId::new("b"));
        state.register_case(CaseId::new("17"));

        state.toggle_module_details(&ModuleId::new("a"));
        state.toggle_case_details(&CaseId::new("17"));
        state.toggle_module_details(&ModuleId::new("b"));
        assert!(state.module_details_visible(&ModuleId::new("b")));
        assert!(!state.case_details_visible(&CaseId::new("17")));
    }

    #[test]
    fn toggle_unknown_module_still_cascades() {
        let mut state = PanelState::new();
        state.register_case(CaseId::new("17"));
        state.toggle_case_details(&CaseId::new("17"));

        state.toggle_module_details(&ModuleId::new("ghost"));
        assert!(!state.case_details_visible(&CaseId::new("17")));
    }

    #[test]
    fn modules_are_independent_of_each_other() {
        let mut state = PanelState::new();
        state.register_module(ModuleId::new("a"));
        state.register_module(ModuleId::new("b"));
        state.toggle_module_details(&ModuleId::new("a"));
        state.toggle_module_details(&ModuleId::new("b"));
        // No radio semantics for modules: both may be open at once.
        assert!(state.module_details_visible(&ModuleId::new("a")));
        assert!(state.module_details_visible(&ModuleId::new("b")));
    }

    // --- Scenario from the original dashboard behavior ---

    #[test]
    fn case_seventeen_then_forty_two() {
        let mut state = state_with_cases(&["17", "42"]);
        let seventeen = CaseId::new("17");
        let forty_two = CaseId::new("42");

        state.toggle_case_details(&seventeen);
        assert!(state.case_details_visible(&seventeen));
        assert!(state.case_row_marked(&seventeen));

        state.toggle_case_details(&seventeen);
        assert!(!state.case_details_visible(&seventeen));
        assert!(!state.case_row_marked(&seventeen));

        state.toggle_case_details(&seventeen);
        state.toggle_case_details(&forty_two);
        assert!(!state.case_details_visible(&seventeen));
        assert!(!state.case_row_marked(&seventeen));
        assert!(state.case_details_visible(&forty_two));
        assert!(state.case_row_marked(&forty_two));
    }

    // --- Rebuild across reloads ---

    fn tiny_report(commits: &[&str], modules: &[(&str, &[&str])]) -> Report {
        use crate::report::{Build, BuildStatus, Case, Commit, Module};
        use std::collections::HashMap;
        Report {
            project: "p".to_string(),
            generated_at: chrono::Utc::now(),
            commits: commits
                .iter()
                .map(|id| Commit {
                    id: CommitId::new(*id),
                    author: "a".to_string(),
                    subject: "s".to_string(),
                    date: chrono::Utc::now(),
                    build: Build {
                        status: BuildStatus::Succeeded,
                        runtime_secs: None,
                        log_tail: Vec::new(),
                    },
                })
                .collect(),
            modules: modules
                .iter()
                .map(|(id, cases)| Module {
                    id: ModuleId::new(*id),
                    cases: cases
                        .iter()
                        .map(|cid| Case {
                            id: CaseId::new(*cid),
                            name: format!("Test{cid}"),
                            tool_args: None,
                            results: HashMap::new(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn rebuild_preserves_surviving_panels() {
        let report = tiny_report(&["a"], &[("m", &["1"])]);
        let mut state = PanelState::for_report(&report);
        state.toggle_module_details(&ModuleId::new("m"));
        state.toggle_build_details(&CommitId::new("a"));

        state.rebuild_for(&report);
        assert!(state.module_details_visible(&ModuleId::new("m")));
        assert!(state.build_details_visible(&CommitId::new("a")));
    }

    #[test]
    fn rebuild_drops_vanished_ids() {
        let report = tiny_report(&["a", "b"], &[("m", &["1"])]);
        let mut state = PanelState::for_report(&report);
        state.toggle_build_details(&CommitId::new("b"));

        let smaller = tiny_report(&["a"], &[("m", &["1"])]);
        state.rebuild_for(&smaller);
        assert_eq!(state.visible_build(), None);
        assert!(!state.build_details_visible(&CommitId::new("b")));
    }

    #[test]
    fn rebuild_registers_new_ids_collapsed() {
        let report = tiny_report(&["a"], &[("m", &["1"])]);
        let mut state = PanelState::for_report(&report);

        let bigger = tiny_report(&["a", "b"], &[("m", &["1", "2"])]);
        state.rebuild_for(&bigger);
        assert!(!state.build_details_visible(&CommitId::new("b")));
        assert!(!state.case_details_visible(&CaseId::new("2")));
    }
}
