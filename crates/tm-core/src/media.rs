//! Media-domain enums for containers, encoder modes, HDR handling, and the
//! per-file plan action.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`)
//! and implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Supported output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mkv,
    Mp4,
}

impl Container {
    /// File extension (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mkv => "mkv",
            Self::Mp4 => "mp4",
        }
    }

    /// Whether the container can carry arbitrary subtitle codecs.
    ///
    /// MP4 only supports text subtitles (mov_text); MKV takes anything.
    pub fn supports_any_subtitle(&self) -> bool {
        matches!(self, Self::Mkv)
    }

    /// Whether the container supports embedded attachment streams (fonts etc.).
    pub fn supports_attachments(&self) -> bool {
        matches!(self, Self::Mkv)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mkv => write!(f, "mkv"),
            Self::Mp4 => write!(f, "mp4"),
        }
    }
}

// ---------------------------------------------------------------------------
// EncoderMode
// ---------------------------------------------------------------------------

/// Which HEVC encoder drives the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderMode {
    /// NVENC hardware encoder (`hevc_nvenc`).
    #[default]
    Hardware,
    /// libx265 software encoder.
    Software,
}

impl EncoderMode {
    /// The ffmpeg encoder name for this mode.
    pub fn encoder_name(&self) -> &'static str {
        match self {
            Self::Hardware => "hevc_nvenc",
            Self::Software => "libx265",
        }
    }
}

impl fmt::Display for EncoderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => write!(f, "hardware"),
            Self::Software => write!(f, "software"),
        }
    }
}

// ---------------------------------------------------------------------------
// HdrMode
// ---------------------------------------------------------------------------

/// How HDR sources are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HdrMode {
    /// Carry HDR color metadata through unchanged.
    #[default]
    Preserve,
    /// Tonemap HDR sources down to SDR.
    Tonemap,
}

impl fmt::Display for HdrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preserve => write!(f, "preserve"),
            Self::Tonemap => write!(f, "tonemap"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlanAction
// ---------------------------------------------------------------------------

/// The per-file action decision.
///
/// `Skip` never originates in the plan builder; the batch processor produces
/// it before planning (e.g. for files without a video stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    /// Re-encode video to the target codec.
    Encode,
    /// Repackage existing streams into the target container without
    /// re-encoding video.
    Remux,
    /// Leave the file untouched.
    Skip,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "encode"),
            Self::Remux => write!(f, "remux"),
            Self::Skip => write!(f, "skip"),
        }
    }
}
