//! The planning core: turns per-file media metadata plus the run
//! configuration into an immutable [`Plan`], the single contract an
//! execution layer needs to build a tool invocation.

mod action;
mod audio;
mod builder;
mod estimate;
mod filters;
mod plan;
mod quality;
mod subs;

pub use action::{decide_action, edge_safe, ActionDecision, TARGET_VIDEO_CODEC};
pub use audio::{plan_audio, AudioMode, AudioPlan, AudioStreamPlan};
pub use builder::build_plan;
pub use estimate::{estimate_bitrate, BitrateEstimate};
pub use filters::{color_metadata, video_filters, ColorMetadata};
pub use plan::{Plan, RetrySeed, DEFAULT_MUX_QUEUE_SIZE};
pub use quality::{resolve_quality, ResolvedQuality};
pub use subs::{plan_attachments, plan_subtitles, AttachmentPlan, SubtitlePlan};
