use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, warn};

use super::reconcile::{Mode, Reconciler, StepResult, SyncOutcome, SyncStatus};
use crate::model::Member;

/// Aggregated outcomes of a bulk synchronization.
#[derive(Debug, Default, Serialize)]
pub(crate) struct BatchSummary {
    pub(crate) dry_run: bool,
    /// Set when the batch was stopped before every member was processed.
    pub(crate) interrupted: bool,
    pub(crate) success_count: usize,
    pub(crate) skipped_count: usize,
    pub(crate) failure_count: usize,
    /// One entry per processed member, in processing order.
    pub(crate) outcomes: Vec<SyncOutcome>,
}

impl BatchSummary {
    fn record(&mut self, outcome: SyncOutcome) {
        match outcome.status {
            SyncStatus::Success => self.success_count += 1,
            SyncStatus::Skipped => self.skipped_count += 1,
            SyncStatus::Failed => self.failure_count += 1,
        }
        self.outcomes.push(outcome);
    }

    pub(crate) fn failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.with_status(SyncStatus::Failed)
    }

    pub(crate) fn skipped(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.with_status(SyncStatus::Skipped)
    }

    fn with_status(&self, status: SyncStatus) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }
}

/// Reconciles `members` one after the other.
///
/// Members are never processed concurrently: role endpoints are rate-limited per server and
/// concurrent changes to one account race on its role set. A failing member never stops the
/// batch; `interrupted` is only checked between members.
pub(crate) async fn sync_all(
    reconciler: &mut Reconciler<'_>,
    members: &[Member],
    mode: Mode,
    interrupted: &AtomicBool,
) -> BatchSummary {
    let mut summary = BatchSummary {
        dry_run: mode == Mode::DryRun,
        ..BatchSummary::default()
    };
    for member in members {
        if interrupted.load(Ordering::Relaxed) {
            warn!(
                processed = summary.outcomes.len(),
                remaining = members.len() - summary.outcomes.len(),
                "Bulk sync interrupted"
            );
            summary.interrupted = true;
            break;
        }
        let rec = reconciler.reconcile(member, mode).await;
        summary.record(rec.outcome);
    }
    info!(
        success = summary.success_count,
        skipped = summary.skipped_count,
        failed = summary.failure_count,
        dry_run = summary.dry_run,
        "Bulk sync finished"
    );
    summary
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Dry run, no role was changed. Intended changes:")?;
            for outcome in self.outcomes.iter().filter(|o| o.changed()) {
                let handle = outcome.discord_handle.as_deref().unwrap_or("<unlinked>");
                for step in outcome
                    .steps
                    .iter()
                    .filter(|s| s.result == StepResult::Planned)
                {
                    writeln!(f, "  {handle}: {} `{}`", step.action, step.role)?;
                }
            }
        }
        let mut failures = self.failures().peekable();
        if failures.peek().is_some() {
            writeln!(f, "Failures:")?;
            for outcome in failures {
                writeln!(f, "  {outcome}")?;
            }
        }
        let mut skipped = self.skipped().peekable();
        if skipped.peek().is_some() {
            writeln!(f, "Skipped:")?;
            for outcome in skipped {
                writeln!(f, "  {outcome}")?;
            }
        }
        if self.interrupted {
            writeln!(f, "Interrupted after {} members.", self.outcomes.len())?;
        }
        write!(
            f,
            "{} succeeded, {} skipped, {} failed",
            self.success_count, self.skipped_count, self.failure_count
        )
    }
}
