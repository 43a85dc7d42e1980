//! The execution engine: drives external tool attempts for one plan through
//! failure classification, targeted fixes, and size-triggered quality bumps.

mod backend;
mod classify;
mod driver;
mod retry;

pub use backend::{AttemptOutcome, ExecutionBackend, FfmpegBackend};
pub use classify::{classify, FixCategory};
pub use driver::{drive, DriveOutcome, FailureReason, SIZE_CEILING_PCT};
pub use retry::{
    Advance, GiveUpReason, RetryState, MAX_ATTEMPTS, MAX_QUALITY_PASSES, MUX_QUEUE_ESCALATED,
};
