use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use std::collections::HashMap;
use std::fmt;

/// Identifier of a commit whose build and results appear in the report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first 8 characters).
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a test module (a group of cases, e.g. "tools.fileinfo").
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single test case. Unique across the whole report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Succeeded,
    Failed,
    InProgress,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
    Skipped,
    Errored,
    #[serde(other)]
    Unknown,
}

impl CaseStatus {
    /// Ordering used when aggregating case statuses into a module status.
    fn severity(self) -> u8 {
        match self {
            CaseStatus::Passed => 0,
            CaseStatus::Skipped => 1,
            CaseStatus::Unknown => 2,
            CaseStatus::Failed => 3,
            CaseStatus::Errored => 4,
        }
    }

    pub fn is_failing(self) -> bool {
        matches!(self, CaseStatus::Failed | CaseStatus::Errored)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    /// Newest commit first, as emitted by the report generator.
    pub commits: Vec<Commit>,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: CommitId,
    pub author: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub build: Build,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub status: BuildStatus,
    #[serde(default)]
    pub runtime_secs: Option<f64>,
    #[serde(default)]
    pub log_tail: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: CaseId,
    pub name: String,
    #[serde(default)]
    pub tool_args: Option<String>,
    pub results: HashMap<CommitId, CaseResult>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub status: CaseStatus,
    #[serde(default)]
    pub runtime_secs: Option<f64>,
    #[serde(default)]
    pub output: Option<String>,
}

impl Module {
    /// Aggregated status of the module for one commit: the worst status among
    /// its cases, or `None` when no case has a result for that commit.
    pub fn status_for(&self, commit: &CommitId) -> Option<CaseStatus> {
        self.cases
            .iter()
            .filter_map(|c| c.results.get(commit).map(|r| r.status))
            .max_by_key(|s| s.severity())
    }

    pub fn is_failing_for(&self, commit: &CommitId) -> bool {
        self.status_for(commit).is_some_and(CaseStatus::is_failing)
    }
}

impl Case {
    pub fn result_for(&self, commit: &CommitId) -> Option<&CaseResult> {
        self.results.get(commit)
    }
}

pub fn parse_report(json: &str) -> Result<Report> {
    let report: Report = serde_json::from_str(json)?;
    Ok(report)
}

/// Limits the number of shown commits based on the selected and maximal count.
/// An absent or out-of-range selection falls back to the maximum.
pub fn limit_shown_commits(selected: Option<usize>, max: usize) -> usize {
    match selected {
        Some(n) if n > 0 && n < max => n,
        _ => max,
    }
}

pub fn format_runtime(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let whole = secs as u64;
        format!("{}m {}s", whole / 60, whole % 60)
    }
}

/// Human age of a timestamp relative to now ("just now", "5m ago", ...).
pub fn format_age(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(date).num_seconds().max(0);
    if secs < 60 {
        "just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}
