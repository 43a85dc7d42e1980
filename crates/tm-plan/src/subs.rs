//! Subtitle and attachment planning.

use serde::{Deserialize, Serialize};
use tm_core::Container;
use tm_probe::SubtitleStream;

/// Codec text subtitles are converted to inside MP4.
const MP4_TEXT_SUBTITLE_CODEC: &str = "mov_text";

/// How subtitles are handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePlan {
    /// No subtitle streams mapped.
    Exclude,
    /// Every subtitle stream copied verbatim.
    CopyAll,
    /// Subtitles converted to `codec`. `streams` is `None` to take every
    /// subtitle stream, or subtitle-relative indices when bitmap streams
    /// have to be filtered out.
    Convert {
        codec: String,
        streams: Option<Vec<u32>>,
    },
}

/// How attachments are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentPlan {
    Include,
    Exclude,
}

/// Build the subtitle plan.
///
/// Matroska carries any subtitle codec, so everything is copied. MP4 only
/// carries timed text: text streams are converted to mov_text, and any bitmap
/// streams present are dropped by selecting the text indices explicitly. A
/// file with only bitmap subtitles targeting MP4 ends up with none.
pub fn plan_subtitles(
    streams: &[SubtitleStream],
    container: Container,
    keep_subtitles: bool,
) -> SubtitlePlan {
    if !keep_subtitles || streams.is_empty() {
        return SubtitlePlan::Exclude;
    }

    if container.supports_any_subtitle() {
        return SubtitlePlan::CopyAll;
    }

    let text_indices: Vec<u32> = streams
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.bitmap)
        .map(|(i, _)| i as u32)
        .collect();

    if text_indices.is_empty() {
        SubtitlePlan::Exclude
    } else if text_indices.len() == streams.len() {
        SubtitlePlan::Convert {
            codec: MP4_TEXT_SUBTITLE_CODEC.into(),
            streams: None,
        }
    } else {
        SubtitlePlan::Convert {
            codec: MP4_TEXT_SUBTITLE_CODEC.into(),
            streams: Some(text_indices),
        }
    }
}

/// Build the attachment plan.
pub fn plan_attachments(
    attachment_count: u32,
    container: Container,
    keep_attachments: bool,
) -> AttachmentPlan {
    if keep_attachments && attachment_count > 0 && container.supports_attachments() {
        AttachmentPlan::Include
    } else {
        AttachmentPlan::Exclude
    }
}
