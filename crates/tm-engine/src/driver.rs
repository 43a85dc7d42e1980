//! The per-file attempt driver: runs backend attempts under the retry state
//! machine until the file completes, fails permanently, or is cancelled.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tm_core::{PlanAction, Result};
use tm_plan::Plan;

use crate::backend::ExecutionBackend;
use crate::retry::{Advance, GiveUpReason, RetryState};

/// Output larger than this percentage of the source triggers a quality bump.
pub const SIZE_CEILING_PCT: u64 = 105;

/// Diagnostic tail length carried into failure reports.
const DIAGNOSTIC_TAIL_CHARS: usize = 2000;

/// Why a file failed permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Strict mode: first error is final, no classification.
    Strict,
    /// No category with an unapplied fix matched the diagnostic.
    Unclassified,
    /// The attempt ceiling was reached.
    AttemptsExhausted,
}

impl From<GiveUpReason> for FailureReason {
    fn from(reason: GiveUpReason) -> Self {
        match reason {
            GiveUpReason::Unclassified => FailureReason::Unclassified,
            GiveUpReason::AttemptsExhausted => FailureReason::AttemptsExhausted,
        }
    }
}

/// Terminal result of driving one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOutcome {
    Completed {
        /// Fix attempts consumed in the final quality pass.
        attempts: u32,
        quality_passes: u32,
        output_size: u64,
    },
    Failed {
        reason: FailureReason,
        diagnostic_tail: String,
    },
    Cancelled,
}

fn oversized(output_size: u64, source_size: u64) -> bool {
    // Unknown source size can never trip the ceiling.
    source_size > 0 && output_size * 100 > source_size * SIZE_CEILING_PCT
}

fn tail(diagnostic: &str) -> String {
    let trimmed = diagnostic.trim_end();
    match trimmed.char_indices().nth_back(DIAGNOSTIC_TAIL_CHARS - 1) {
        Some((idx, _)) => trimmed[idx..].to_string(),
        None => trimmed.to_string(),
    }
}

async fn remove_partial(plan: &Plan) {
    // Leftover partial or rejected outputs must not survive between attempts.
    let _ = tokio::fs::remove_file(&plan.output).await;
}

/// Drive one plan to a terminal outcome.
///
/// Cancellation is checked at every loop entry and distinguishes a stopped
/// run from a failed file; partial outputs are removed either way. Errors
/// from the backend itself (spawn failures, timeouts) propagate to the
/// caller rather than entering classification.
pub async fn drive(
    backend: &dyn ExecutionBackend,
    plan: &Plan,
    strict: bool,
    step: u8,
    source_size: u64,
    cancel: &CancellationToken,
) -> Result<DriveOutcome> {
    let mut state = RetryState::seeded(plan);

    loop {
        if cancel.is_cancelled() {
            remove_partial(plan).await;
            return Ok(DriveOutcome::Cancelled);
        }

        let outcome = match backend.run_attempt(plan, &state, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if cancel.is_cancelled() {
                    remove_partial(plan).await;
                    return Ok(DriveOutcome::Cancelled);
                }
                remove_partial(plan).await;
                return Err(e);
            }
        };

        if outcome.succeeded {
            let output_size = outcome.output_size.unwrap_or(0);
            // The size ceiling only applies to encodes; a remux is accepted
            // at whatever size the copy produced.
            if plan.action == PlanAction::Encode && oversized(output_size, source_size) {
                if state.bump_quality(step) {
                    remove_partial(plan).await;
                    continue;
                }
                warn!(
                    input = %plan.input.display(),
                    output_size,
                    source_size,
                    "output still oversized after final quality pass; keeping it"
                );
            }
            info!(
                input = %plan.input.display(),
                attempts = state.attempts,
                quality_passes = state.quality_passes,
                "conversion complete"
            );
            return Ok(DriveOutcome::Completed {
                attempts: state.attempts,
                quality_passes: state.quality_passes,
                output_size,
            });
        }

        remove_partial(plan).await;

        if strict {
            return Ok(DriveOutcome::Failed {
                reason: FailureReason::Strict,
                diagnostic_tail: tail(&outcome.diagnostic),
            });
        }

        match state.advance(&outcome.diagnostic) {
            Advance::Retry(_) => continue,
            Advance::GiveUp(reason) => {
                return Ok(DriveOutcome::Failed {
                    reason: reason.into(),
                    diagnostic_tail: tail(&outcome.diagnostic),
                });
            }
        }
    }
}
