//! Final classification of a run and the summary block.

use std::process::ExitCode;

use crate::{batch::BatchResult, runlog::RunLog};

/// Terminal state of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Everything that matched succeeded
    Completed,
    /// At least one matched entity failed
    PartialFailure,
    /// The filters matched nothing
    NoMatch,
    /// Dry run; nothing was executed
    Preview,
}

impl RunOutcome {
    pub fn classify(result: &BatchResult) -> Self {
        if result.failed > 0 {
            RunOutcome::PartialFailure
        } else if result.succeeded == 0 {
            RunOutcome::NoMatch
        } else {
            RunOutcome::Completed
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, RunOutcome::Completed | RunOutcome::Preview)
    }

    pub fn exit_code(self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Print the tallies and return the outcome they imply.
pub fn report(result: &BatchResult, operation: &str, log: &mut RunLog) -> RunOutcome {
    let outcome = RunOutcome::classify(result);

    log.line("");
    log.line(&format!("===== {operation} summary ====="));
    log.line(&format!("succeeded: {}", result.succeeded));
    log.line(&format!("failed:    {}", result.failed));
    log.line(&format!("skipped:   {}", result.skipped));
    log.line(&format!("total:     {}", result.total()));

    match outcome {
        RunOutcome::Completed => {
            log.line(&format!("✅ {operation} completed for all {} matched APIs", result.succeeded))
        }
        RunOutcome::PartialFailure => log.line(&format!(
            "❌ {operation} failed for {} of {} matched APIs",
            result.failed,
            result.matched()
        )),
        RunOutcome::NoMatch => log.line(&format!(
            "❌ no APIs matched the given filters; nothing to {operation}"
        )),
        RunOutcome::Preview => {}
    }
    if let Some(path) = log.path() {
        let path = path.display().to_string();
        log.line(&format!("log written to {path}"));
    }

    outcome
}
