use crate::app::{AppState, Notification};
use crate::report::{CaseStatus, CommitId, Report};
use std::time::Instant;

/// Maximum number of polls a result can be absent before being evicted from
/// the snapshot.
const SNAPSHOT_EVICTION_POLLS: u64 = 10;

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub case_name: String,
    pub commit: CommitId,
    pub old: CaseStatus,
    pub new: CaseStatus,
}

impl StatusChange {
    pub fn message(&self) -> String {
        match self.new {
            CaseStatus::Failed | CaseStatus::Errored => {
                format!("{} started failing ({})", self.case_name, self.commit.short())
            }
            CaseStatus::Passed => {
                format!("{} fixed ({})", self.case_name, self.commit.short())
            }
            CaseStatus::Skipped => {
                format!("{} now skipped ({})", self.case_name, self.commit.short())
            }
            CaseStatus::Unknown => {
                format!("{} changed to unknown ({})", self.case_name, self.commit.short())
            }
        }
    }

    pub fn is_regression(&self) -> bool {
        self.new.is_failing() && !self.old.is_failing()
    }

    pub fn is_fix(&self) -> bool {
        self.new == CaseStatus::Passed && self.old.is_failing()
    }
}

/// Compares per-case per-commit statuses against the previous snapshot and
/// pushes a notification for every transition. Returns the transitions so the
/// caller can raise desktop notifications for the interesting ones.
pub fn detect_changes(state: &mut AppState, new_report: &Report) -> Vec<StatusChange> {
    let now = Instant::now();
    state.poll_count += 1;
    let current_poll = state.poll_count;

    let mut changes = Vec::new();
    for module in &new_report.modules {
        for case in &module.cases {
            for (commit, result) in &case.results {
                let key = (case.id.clone(), commit.clone());
                if let Some(&(old_status, _)) = state.previous_snapshot.get(&key) {
                    if old_status != result.status {
                        changes.push(StatusChange {
                            case_name: case.name.clone(),
                            commit: commit.clone(),
                            old: old_status,
                            new: result.status,
                        });
                    }
                }
            }
        }
    }

    for change in &changes {
        state.notifications.push(Notification {
            message: change.message(),
            timestamp: now,
        });
    }

    // Merge new results into the existing snapshot (instead of replacing)
    for module in &new_report.modules {
        for case in &module.cases {
            for (commit, result) in &case.results {
                state
                    .previous_snapshot
                    .insert((case.id.clone(), commit.clone()), (result.status, current_poll));
            }
        }
    }

    // Evict entries not seen in the last SNAPSHOT_EVICTION_POLLS polls
    state.previous_snapshot.retain(|_, (_, last_seen)| {
        current_poll.saturating_sub(*last_seen) <= SNAPSHOT_EVICTION_POLLS
    });

    changes
}
