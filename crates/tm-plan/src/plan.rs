//! The immutable per-file decision artifact.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tm_core::{PlanAction, QualityPair};

use crate::audio::AudioPlan;
use crate::filters::ColorMetadata;
use crate::subs::{AttachmentPlan, SubtitlePlan};

/// Initial mux-queue size handed to ffmpeg before any fix escalates it.
pub const DEFAULT_MUX_QUEUE_SIZE: u32 = 1024;

/// The complete transcode plan for one file.
///
/// Created once by [`crate::build_plan`] and read-only thereafter; the only
/// mutable companion is the engine's retry state, seeded from
/// [`Plan::retry_seed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Source file path, as given by the caller.
    pub input: PathBuf,
    /// Output file path, as given by the caller (transmog never derives it).
    pub output: PathBuf,
    /// The action decision.
    pub action: PlanAction,
    /// ffmpeg video codec identifier ("copy" for remux).
    pub video_codec: String,
    /// Resolved quality on both encoder scales.
    pub quality: QualityPair,
    /// Ordered video filter chain; empty for remux.
    pub video_filters: Vec<String>,
    /// HDR color metadata to carry through; `None` for remux or SDR sources.
    pub color: Option<ColorMetadata>,
    /// Audio handling.
    pub audio: AudioPlan,
    /// Subtitle handling.
    pub subtitles: SubtitlePlan,
    /// Attachment handling.
    pub attachments: AttachmentPlan,
    /// Container-specific output options (e.g. `-movflags +faststart`).
    pub container_opts: Vec<String>,
    /// Per-stream disposition flags as `(stream specifier, value)` pairs.
    pub dispositions: Vec<(String, String)>,
    /// Observability note from the action decision, if any.
    pub note: Option<String>,
    /// How the quality values were arrived at.
    pub quality_note: String,
    /// Initial values for the engine's retry state.
    pub retry_seed: RetrySeed,
}

/// The retry-state seed carried by every plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrySeed {
    /// Initial mux-queue size.
    pub mux_queue_size: u32,
    /// Whether timestamp-fix flags are enabled from the start.
    pub timestamp_fix: bool,
    /// Whether subtitle streams are included.
    pub include_subtitles: bool,
    /// Whether attachment streams are included.
    pub include_attachments: bool,
}
