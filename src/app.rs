use crate::panels::PanelState;
use crate::report::{
    format_runtime, limit_shown_commits, Case, CaseId, CaseStatus, Commit, CommitId, Report,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

// UI constants
pub const NOTIFICATION_TTL_SECS: u64 = 5;
pub const ERROR_TTL_SECS: u64 = 10;
pub const SPINNER_FRAME_COUNT: usize = 10;
pub const QUICK_SELECT_MAX: usize = 9;
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;

/// Cap on log-tail and captured-output lines shown inside a details panel.
pub const DETAIL_MAX_LINES: usize = 20;

/// One line of the dashboard. Detail rows carry their text directly; summary
/// rows are resolved against the report at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Build {
        commit_idx: usize,
        expanded: bool,
    },
    BuildDetail {
        line: String,
    },
    Module {
        module_idx: usize,
        expanded: bool,
    },
    Case {
        module_idx: usize,
        case_idx: usize,
        expanded: bool,
    },
    CaseDetail {
        line: String,
    },
}

impl Row {
    pub fn selectable(&self) -> bool {
        matches!(
            self,
            Row::Build { .. } | Row::Module { .. } | Row::Case { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    All,
    FailingOnly,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub timestamp: Instant,
}

pub struct ToolArgsOverlay {
    pub case_name: String,
    pub args: String,
}

pub enum ActiveOverlay {
    None,
    ToolArgs(ToolArgsOverlay),
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub report_path: PathBuf,
    pub commits: Option<usize>,
    pub commit_url: Option<String>,
}

pub struct AppState {
    pub config: AppConfig,

    // Report data
    pub report: Option<Report>,
    pub panels: PanelState,
    pub shown_commits_count: usize,
    pub previous_snapshot: HashMap<(CaseId, CommitId), (CaseStatus, u64)>,
    pub poll_count: u64,

    // Row navigation
    pub rows: Vec<Row>,
    pub cursor: usize,
    pub filter: FilterMode,

    // Polling
    pub last_poll: Option<Instant>,
    pub next_poll_in: u64,
    pub poll_interval: u64,

    // Transient UI
    pub notifications: Vec<Notification>,
    pub error: Option<(String, Instant)>,
    pub spinner_frame: usize,
    pub is_loading: bool,
    pub should_quit: bool,

    // Active overlay (at most one)
    pub overlay: ActiveOverlay,

    // Desktop notifications
    pub desktop_notify: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            report: None,
            panels: PanelState::new(),
            shown_commits_count: 0,
            previous_snapshot: HashMap::new(),
            poll_count: 0,
            rows: Vec::new(),
            cursor: 0,
            filter: FilterMode::All,
            last_poll: None,
            next_poll_in: 0,
            poll_interval: 30,
            notifications: Vec::new(),
            error: None,
            spinner_frame: 0,
            is_loading: false,
            should_quit: false,
            overlay: ActiveOverlay::None,
            desktop_notify: true,
        }
    }

    /// Installs a (re)loaded report, carrying panel visibility over for ids
    /// that survived the reload.
    pub fn apply_report(&mut self, report: Report) {
        self.panels.rebuild_for(&report);
        self.shown_commits_count =
            limit_shown_commits(self.config.commits, report.commits.len());
        self.report = Some(report);
        self.rebuild_rows();
    }

    /// The slice of recent commits the dashboard displays, newest first.
    pub fn shown_commits(&self) -> &[Commit] {
        match &self.report {
            Some(report) => {
                let n = self.shown_commits_count.min(report.commits.len());
                &report.commits[..n]
            }
            None => &[],
        }
    }

    pub fn rebuild_rows(&mut self) {
        let mut rows = Vec::new();
        if let Some(report) = &self.report {
            let shown = self.shown_commits_count.min(report.commits.len());
            let newest = report.commits.first().map(|c| c.id.clone());

            for (commit_idx, commit) in report.commits.iter().take(shown).enumerate() {
                let expanded = self.panels.build_details_visible(&commit.id);
                rows.push(Row::Build {
                    commit_idx,
                    expanded,
                });
                if expanded {
                    for line in commit_detail_lines(commit) {
                        rows.push(Row::BuildDetail { line });
                    }
                }
            }

            for (module_idx, module) in report.modules.iter().enumerate() {
                let keep = match self.filter {
                    FilterMode::All => true,
                    FilterMode::FailingOnly => newest
                        .as_ref()
                        .is_some_and(|c| module.is_failing_for(c)),
                };
                if !keep {
                    continue;
                }
                let expanded = self.panels.module_details_visible(&module.id);
                rows.push(Row::Module {
                    module_idx,
                    expanded,
                });
                if expanded {
                    for (case_idx, case) in module.cases.iter().enumerate() {
                        let case_expanded = self.panels.case_details_visible(&case.id);
                        rows.push(Row::Case {
                            module_idx,
                            case_idx,
                            expanded: case_expanded,
                        });
                        if case_expanded {
                            for line in case_detail_lines(case, &report.commits[..shown]) {
                                rows.push(Row::CaseDetail { line });
                            }
                        }
                    }
                }
            }
        }
        self.rows = rows;
        self.snap_cursor();
    }

    fn snap_cursor(&mut self) {
        if self.rows.is_empty() {
            self.cursor = 0;
            return;
        }
        if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len() - 1;
        }
        if self.rows[self.cursor].selectable() {
            return;
        }
        // Nearest selectable row, searching up first (detail lines always
        // follow their summary row).
        if let Some(i) = (0..self.cursor).rev().find(|&i| self.rows[i].selectable()) {
            self.cursor = i;
        } else if let Some(i) =
            (self.cursor + 1..self.rows.len()).find(|&i| self.rows[i].selectable())
        {
            self.cursor = i;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if let Some(i) = (0..self.cursor).rev().find(|&i| self.rows[i].selectable()) {
            self.cursor = i;
        }
    }

    pub fn move_cursor_down(&mut self) {
        if let Some(i) =
            (self.cursor + 1..self.rows.len()).find(|&i| self.rows[i].selectable())
        {
            self.cursor = i;
        }
    }

    pub fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.cursor)
    }

    /// Toggles the details panel belonging to the selected row, dispatching
    /// to the controller operation for the row's kind.
    pub fn toggle_current(&mut self) {
        let Some(report) = &self.report else {
            return;
        };
        match self.rows.get(self.cursor) {
            Some(&Row::Build { commit_idx, .. }) => {
                if let Some(commit) = report.commits.get(commit_idx) {
                    let id = commit.id.clone();
                    self.panels.toggle_build_details(&id);
                }
            }
            Some(&Row::Module { module_idx, .. }) => {
                if let Some(module) = report.modules.get(module_idx) {
                    let id = module.id.clone();
                    self.panels.toggle_module_details(&id);
                }
            }
            Some(&Row::Case {
                module_idx,
                case_idx,
                ..
            }) => {
                if let Some(case) = report
                    .modules
                    .get(module_idx)
                    .and_then(|m| m.cases.get(case_idx))
                {
                    let id = case.id.clone();
                    self.panels.toggle_case_details(&id);
                }
            }
            _ => return,
        }
        self.rebuild_rows();
    }

    /// Collapses the selected row's panel, or jumps to the parent row when
    /// there is nothing to collapse.
    pub fn collapse_current(&mut self) {
        match self.rows.get(self.cursor) {
            Some(&Row::Build { expanded, .. } | &Row::Module { expanded, .. }) => {
                if expanded {
                    self.toggle_current();
                }
            }
            Some(&Row::Case {
                module_idx,
                expanded,
                ..
            }) => {
                if expanded {
                    self.toggle_current();
                } else {
                    // Go up to the parent module row
                    for (i, row) in self.rows.iter().enumerate() {
                        if matches!(row, Row::Module { module_idx: m, .. } if *m == module_idx) {
                            self.cursor = i;
                            break;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    pub fn quick_select(&mut self, n: usize) {
        // Select the nth visible module (1-indexed)
        let mut module_count = 0;
        for (i, row) in self.rows.iter().enumerate() {
            if matches!(row, Row::Module { .. }) {
                module_count += 1;
                if module_count == n {
                    self.cursor = i;
                    break;
                }
            }
        }
    }

    pub fn cycle_filter(&mut self) {
        self.filter = match self.filter {
            FilterMode::All => FilterMode::FailingOnly,
            FilterMode::FailingOnly => FilterMode::All,
        };
        self.rebuild_rows();
    }

    // --- Tool-args overlay ---

    /// Shows the given tool arguments in a blocking modal.
    pub fn show_tool_args(&mut self, case_name: impl Into<String>, args: impl Into<String>) {
        self.overlay = ActiveOverlay::ToolArgs(ToolArgsOverlay {
            case_name: case_name.into(),
            args: args.into(),
        });
    }

    /// Shows tool arguments for the selected case row, if it has any.
    pub fn show_tool_args_for_current(&mut self) {
        let Some(report) = &self.report else {
            return;
        };
        if let Some(&Row::Case {
            module_idx,
            case_idx,
            ..
        }) = self.rows.get(self.cursor)
        {
            let case = report
                .modules
                .get(module_idx)
                .and_then(|m| m.cases.get(case_idx));
            if let Some(case) = case {
                match &case.tool_args {
                    Some(args) => {
                        let name = case.name.clone();
                        let args = args.clone();
                        self.show_tool_args(name, args);
                    }
                    None => self.set_error("No tool arguments for this case".to_string()),
                }
            }
        }
    }

    pub fn close_tool_args(&mut self) {
        if matches!(self.overlay, ActiveOverlay::ToolArgs(_)) {
            self.overlay = ActiveOverlay::None;
        }
    }

    pub fn has_tool_args_overlay(&self) -> bool {
        matches!(self.overlay, ActiveOverlay::ToolArgs(_))
    }

    // --- Browser ---

    /// URL of the selected commit's details page, built from the configured
    /// template ("{commit}" is substituted; a plain prefix gets the id
    /// appended).
    pub fn current_commit_url(&self) -> Option<String> {
        let template = self.config.commit_url.as_ref()?;
        let report = self.report.as_ref()?;
        if let Some(&Row::Build { commit_idx, .. }) = self.rows.get(self.cursor) {
            let commit = report.commits.get(commit_idx)?;
            let url = if template.contains("{commit}") {
                template.replace("{commit}", commit.id.as_str())
            } else {
                format!("{}{}", template, commit.id)
            };
            return Some(url);
        }
        None
    }

    // --- Transient UI state ---

    pub fn prune_notifications(&mut self) {
        let now = Instant::now();
        self.notifications
            .retain(|n| now.duration_since(n.timestamp).as_secs() < NOTIFICATION_TTL_SECS);
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}

fn status_label(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Passed => "passed",
        CaseStatus::Failed => "FAILED",
        CaseStatus::Skipped => "skipped",
        CaseStatus::Errored => "ERRORED",
        CaseStatus::Unknown => "unknown",
    }
}

fn commit_detail_lines(commit: &Commit) -> Vec<String> {
    let mut lines = vec![
        format!("author  {}", commit.author),
        format!("date    {}", commit.date.format("%Y-%m-%d %H:%M UTC")),
    ];
    let status = match commit.build.status {
        crate::report::BuildStatus::Succeeded => "succeeded",
        crate::report::BuildStatus::Failed => "FAILED",
        crate::report::BuildStatus::InProgress => "in progress",
        crate::report::BuildStatus::Unknown => "unknown",
    };
    match commit.build.runtime_secs {
        Some(secs) => lines.push(format!("build   {} in {}", status, format_runtime(secs))),
        None => lines.push(format!("build   {status}")),
    }
    let tail = &commit.build.log_tail;
    let skip = tail.len().saturating_sub(DETAIL_MAX_LINES);
    for line in tail.iter().skip(skip) {
        lines.push(line.clone());
    }
    lines
}

fn case_detail_lines(case: &Case, shown: &[Commit]) -> Vec<String> {
    let mut lines = Vec::new();
    for commit in shown {
        if let Some(result) = case.result_for(&commit.id) {
            let mut line = format!("{}  {}", commit.id.short(), status_label(result.status));
            if let Some(secs) = result.runtime_secs {
                line.push_str(&format!(" in {}", format_runtime(secs)));
            }
            lines.push(line);
        }
    }
    // Captured output of the newest failing result, falling back to the
    // newest result that captured anything.
    let output = shown
        .iter()
        .filter_map(|c| case.result_for(&c.id))
        .find(|r| r.status.is_failing() && r.output.is_some())
        .or_else(|| {
            shown
                .iter()
                .filter_map(|c| case.result_for(&c.id))
                .find(|r| r.output.is_some())
        })
        .and_then(|r| r.output.as_deref());
    if let Some(output) = output {
        lines.push(String::new());
        for line in output.lines().take(DETAIL_MAX_LINES) {
            lines.push(line.to_string());
        }
    }
    lines
}
