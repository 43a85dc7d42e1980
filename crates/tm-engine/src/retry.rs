//! Mutable retry state for a single file's conversion.
//!
//! The state starts from the plan's seed and only ever moves toward a more
//! conservative invocation: fixes accumulate and survive quality bumps.

use tracing::{info, warn};

use tm_core::QualityPair;
use tm_plan::Plan;

use crate::classify::FixCategory;

/// Inner-loop ceiling: failed attempts per quality pass.
pub const MAX_ATTEMPTS: u32 = 4;

/// Outer-loop ceiling: size-triggered quality bumps per file.
pub const MAX_QUALITY_PASSES: u32 = 2;

/// Mux queue size after the overflow fix.
pub const MUX_QUEUE_ESCALATED: u32 = 4096;

/// Result of advancing the state after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A fix was applied; run the attempt again.
    Retry(FixCategory),
    /// No further attempt will help.
    GiveUp(GiveUpReason),
}

/// Why the inner loop stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUpReason {
    /// The diagnostic matched no category with an unapplied fix.
    Unclassified,
    /// The per-pass attempt ceiling was reached.
    AttemptsExhausted,
}

/// Per-file retry state, seeded from the plan and mutated between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Current quality on both scales; bumps move it, fixes never do.
    pub quality: QualityPair,
    /// Failed attempts in the current quality pass.
    pub attempts: u32,
    /// Size-triggered quality bumps taken so far.
    pub quality_passes: u32,
    pub mux_queue_size: u32,
    pub timestamp_fix: bool,
    pub include_subtitles: bool,
    pub include_attachments: bool,
}

impl RetryState {
    /// Initial state for a plan.
    pub fn seeded(plan: &Plan) -> Self {
        Self {
            quality: plan.quality,
            attempts: 0,
            quality_passes: 0,
            mux_queue_size: plan.retry_seed.mux_queue_size,
            timestamp_fix: plan.retry_seed.timestamp_fix,
            include_subtitles: plan.retry_seed.include_subtitles,
            include_attachments: plan.retry_seed.include_attachments,
        }
    }

    /// Whether a category's fix is already in effect.
    ///
    /// Derived from the invocation state itself, so a plan seeded with a fix
    /// (e.g. `clean_timestamps`) never wastes an attempt re-applying it.
    pub fn applied(&self, category: FixCategory) -> bool {
        match category {
            FixCategory::AttachmentTag => !self.include_attachments,
            FixCategory::SubtitleCodec => !self.include_subtitles,
            FixCategory::MuxQueueOverflow => self.mux_queue_size >= MUX_QUEUE_ESCALATED,
            FixCategory::Timestamp => self.timestamp_fix,
        }
    }

    fn apply(&mut self, category: FixCategory) {
        match category {
            FixCategory::AttachmentTag => self.include_attachments = false,
            FixCategory::SubtitleCodec => self.include_subtitles = false,
            FixCategory::MuxQueueOverflow => self.mux_queue_size = MUX_QUEUE_ESCALATED,
            FixCategory::Timestamp => self.timestamp_fix = true,
        }
    }

    /// Advance after a failed attempt: apply exactly one fix, or give up.
    ///
    /// Categories are consulted in precedence order; the first one whose
    /// pattern matches the diagnostic and whose fix is not yet in effect is
    /// applied. A diagnostic matching nothing actionable fails immediately
    /// rather than burning the remaining attempts.
    pub fn advance(&mut self, diagnostic: &str) -> Advance {
        if self.attempts >= MAX_ATTEMPTS {
            warn!(attempts = self.attempts, "attempt ceiling reached");
            return Advance::GiveUp(GiveUpReason::AttemptsExhausted);
        }

        let Some(category) = FixCategory::ALL
            .into_iter()
            .find(|cat| cat.matches(diagnostic) && !self.applied(*cat))
        else {
            return Advance::GiveUp(GiveUpReason::Unclassified);
        };

        self.apply(category);
        self.attempts += 1;
        info!(%category, attempt = self.attempts, "applying fix and retrying");
        Advance::Retry(category)
    }

    /// Take a quality-bump pass after an oversized output.
    ///
    /// Returns `false` when the pass ceiling is reached. A successful bump
    /// resets the attempt counter; applied fixes persist.
    pub fn bump_quality(&mut self, step: u8) -> bool {
        if self.quality_passes >= MAX_QUALITY_PASSES {
            return false;
        }
        self.quality_passes += 1;
        self.quality = self.quality.bumped(step);
        self.attempts = 0;
        info!(
            pass = self.quality_passes,
            nvenc = self.quality.nvenc,
            x265 = self.quality.x265,
            "output oversized; bumping quality"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_core::{NVENC_QUALITY_MAX, X265_QUALITY_MAX};
    use tm_plan::RetrySeed;

    fn state() -> RetryState {
        RetryState {
            quality: QualityPair::clamped(25, 22),
            attempts: 0,
            quality_passes: 0,
            mux_queue_size: 1024,
            timestamp_fix: false,
            include_subtitles: true,
            include_attachments: true,
        }
    }

    #[test]
    fn seeded_state_reflects_plan_seed() {
        let seed = RetrySeed {
            mux_queue_size: 1024,
            timestamp_fix: true,
            include_subtitles: false,
            include_attachments: true,
        };
        let mut s = state();
        s.timestamp_fix = seed.timestamp_fix;
        s.include_subtitles = seed.include_subtitles;
        // Seeded fixes count as applied.
        assert!(s.applied(FixCategory::Timestamp));
        assert!(s.applied(FixCategory::SubtitleCodec));
        assert!(!s.applied(FixCategory::AttachmentTag));
        assert!(!s.applied(FixCategory::MuxQueueOverflow));
    }

    #[test]
    fn mux_overflow_escalates_queue_once() {
        let mut s = state();
        let a = s.advance("Too many packets buffered for output stream 0:1.");
        assert_eq!(a, Advance::Retry(FixCategory::MuxQueueOverflow));
        assert_eq!(s.mux_queue_size, MUX_QUEUE_ESCALATED);
        assert_eq!(s.attempts, 1);

        // Same failure again: fix already applied, nothing else matches.
        let a = s.advance("Too many packets buffered for output stream 0:1.");
        assert_eq!(a, Advance::GiveUp(GiveUpReason::Unclassified));
    }

    #[test]
    fn exactly_one_fix_per_attempt() {
        let mut s = state();
        let log = "Attachment stream 0:4 has no mimetype tag\n\
                   Subtitle codec 'ass' is not supported";
        let a = s.advance(log);
        assert_eq!(a, Advance::Retry(FixCategory::AttachmentTag));
        assert!(s.include_subtitles, "second fix must wait for its own attempt");

        let a = s.advance(log);
        assert_eq!(a, Advance::Retry(FixCategory::SubtitleCodec));
        assert!(!s.include_subtitles);
    }

    #[test]
    fn unclassified_diagnostic_gives_up_immediately() {
        let mut s = state();
        let a = s.advance("Conversion failed!");
        assert_eq!(a, Advance::GiveUp(GiveUpReason::Unclassified));
        assert_eq!(s.attempts, 0);
    }

    #[test]
    fn attempt_ceiling_after_all_fixes_spent() {
        let mut s = state();
        let log = "Attachment stream 0:1 has no mimetype tag\n\
                   Subtitle codec 'ass' is not supported\n\
                   Too many packets buffered for output stream 0:0\n\
                   non-monotonous DTS in output stream 0:0";
        assert_eq!(s.advance(log), Advance::Retry(FixCategory::AttachmentTag));
        assert_eq!(s.advance(log), Advance::Retry(FixCategory::SubtitleCodec));
        assert_eq!(s.advance(log), Advance::Retry(FixCategory::MuxQueueOverflow));
        assert_eq!(s.advance(log), Advance::Retry(FixCategory::Timestamp));
        assert_eq!(s.attempts, MAX_ATTEMPTS);
        assert_eq!(s.advance(log), Advance::GiveUp(GiveUpReason::AttemptsExhausted));
    }

    #[test]
    fn bump_resets_attempts_but_keeps_fixes() {
        let mut s = state();
        s.advance("non-monotonous DTS in output stream 0:0");
        assert_eq!(s.attempts, 1);
        assert!(s.timestamp_fix);

        assert!(s.bump_quality(2));
        assert_eq!(s.attempts, 0);
        assert!(s.timestamp_fix);
        assert_eq!(s.quality, QualityPair::clamped(27, 24));
    }

    #[test]
    fn bump_ceiling_is_two_passes() {
        let mut s = state();
        assert!(s.bump_quality(2));
        assert!(s.bump_quality(2));
        assert!(!s.bump_quality(2));
        assert_eq!(s.quality_passes, MAX_QUALITY_PASSES);
    }

    #[test]
    fn bump_clamps_at_scale_max() {
        let mut s = state();
        s.quality = QualityPair::clamped(36, 30);
        assert!(s.bump_quality(2));
        assert_eq!(s.quality.nvenc, NVENC_QUALITY_MAX);
        assert_eq!(s.quality.x265, X265_QUALITY_MAX);
    }
}
