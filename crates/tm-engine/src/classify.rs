//! Failure classification from tool diagnostics.
//!
//! Each category carries the patterns that identify it in ffmpeg stderr. The
//! category order is part of the retry contract: when a diagnostic matches
//! several categories, the first unapplied one wins.

use std::fmt;
use std::sync::LazyLock;

use regex::RegexSet;

/// A recognized, fixable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixCategory {
    /// Attachment streams missing mimetype/filename tags.
    AttachmentTag,
    /// Subtitle codec the muxer cannot carry.
    SubtitleCodec,
    /// Muxer packet queue overflow.
    MuxQueueOverflow,
    /// Non-monotonic or missing timestamps.
    Timestamp,
}

impl FixCategory {
    /// Categories in match precedence order.
    pub const ALL: [FixCategory; 4] = [
        FixCategory::AttachmentTag,
        FixCategory::SubtitleCodec,
        FixCategory::MuxQueueOverflow,
        FixCategory::Timestamp,
    ];

    fn patterns(&self) -> &'static LazyLock<RegexSet> {
        match self {
            FixCategory::AttachmentTag => &ATTACHMENT_PATTERNS,
            FixCategory::SubtitleCodec => &SUBTITLE_PATTERNS,
            FixCategory::MuxQueueOverflow => &MUX_QUEUE_PATTERNS,
            FixCategory::Timestamp => &TIMESTAMP_PATTERNS,
        }
    }

    /// Whether the diagnostic text matches this category.
    pub fn matches(&self, diagnostic: &str) -> bool {
        self.patterns().is_match(diagnostic)
    }
}

impl fmt::Display for FixCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixCategory::AttachmentTag => write!(f, "attachment-tag"),
            FixCategory::SubtitleCodec => write!(f, "subtitle-codec"),
            FixCategory::MuxQueueOverflow => write!(f, "mux-queue-overflow"),
            FixCategory::Timestamp => write!(f, "timestamp-discontinuity"),
        }
    }
}

fn build_set(patterns: &[&str]) -> RegexSet {
    match RegexSet::new(patterns) {
        Ok(set) => set,
        // The pattern literals are fixed at compile time.
        Err(_) => RegexSet::empty(),
    }
}

static ATTACHMENT_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(&[r"(?i)attachment stream .* has no (mimetype|filename) tag"])
});

static SUBTITLE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(&[
        r"(?i)subtitle codec .* is not supported",
        r"(?i)could not find tag for codec (srt|subrip|ass|ssa|mov_text)",
        r"(?i)error initializing output stream .*subtitle",
    ])
});

static MUX_QUEUE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(&[r"(?i)too many packets buffered for output stream"])
});

static TIMESTAMP_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(&[
        r"(?i)non[- ]?monoton(ous|ically increasing) dts",
        r"(?i)invalid dts",
        r"(?i)timestamps are unset",
    ])
});

/// First category, in precedence order, that matches the diagnostic.
pub fn classify(diagnostic: &str) -> Option<FixCategory> {
    FixCategory::ALL
        .into_iter()
        .find(|cat| cat.matches(diagnostic))
}
