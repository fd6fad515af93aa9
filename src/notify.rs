use crate::diff::StatusChange;
use crate::report::CaseStatus;
use notify_rust::{Notification, Urgency};

pub fn send_desktop(change: &StatusChange) {
    let (summary, icon, urgency) = match change.new {
        CaseStatus::Failed | CaseStatus::Errored => {
            ("Regression", "dialog-error", Urgency::Critical)
        }
        CaseStatus::Passed => ("Test fixed", "dialog-information", Urgency::Normal),
        _ => ("Test status changed", "dialog-information", Urgency::Normal),
    };

    let _ = Notification::new()
        .summary(summary)
        .body(&change.message())
        .icon(icon)
        .urgency(urgency)
        .show();
}
