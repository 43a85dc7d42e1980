//! Run configuration.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for encoder choice, output format, quality, audio targets, and
//! behavior toggles. Every section defaults sensibly so a completely empty
//! `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::quality::{NVENC_QUALITY_MAX, NVENC_QUALITY_MIN, X265_QUALITY_MAX, X265_QUALITY_MIN};
use crate::{Container, EncoderMode, Error, HdrMode};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root run configuration, immutable for the duration of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub quality: QualityConfig,
    pub audio: AudioConfig,
    pub behavior: BehaviorConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(q) = self.quality.quality_override {
            let (min, max) = match self.output.encoder {
                EncoderMode::Hardware => (NVENC_QUALITY_MIN, NVENC_QUALITY_MAX),
                EncoderMode::Software => (X265_QUALITY_MIN, X265_QUALITY_MAX),
            };
            if q < min || q > max {
                warnings.push(format!(
                    "quality.override {q} is outside the {} scale [{min}, {max}] and will be clamped",
                    self.output.encoder
                ));
            }
        }

        if self.quality.step == 0 {
            warnings.push(
                "quality.step is 0; oversized encodes will be accepted without a quality bump"
                    .into(),
            );
        }

        if self.quality.bias.unsigned_abs() > 8 {
            warnings.push(format!(
                "quality.bias {} is large; resolved values will mostly sit at a scale boundary",
                self.quality.bias
            ));
        }

        if self.audio.channels == 0 {
            warnings.push("audio.channels is 0; audio streams would be dropped".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Output format and encoder selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub container: Container,
    pub encoder: EncoderMode,
    pub hdr: HdrMode,
}

/// Quality defaults and smart-adaptation knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Default NVENC constant-quality value.
    pub nvenc_default: u8,
    /// Default x265 CRF value.
    pub x265_default: u8,
    /// Scalar added after the curves (negative = higher quality).
    pub bias: i8,
    /// Step applied per quality-bump pass when output exceeds the size ceiling.
    pub step: u8,
    /// Whether smart per-file adaptation is enabled.
    pub smart: bool,
    /// Manual fixed quality value, applied verbatim (clamped) to both scales.
    #[serde(rename = "override")]
    pub quality_override: Option<u8>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            nvenc_default: 25,
            x265_default: 22,
            bias: 0,
            step: 2,
            smart: true,
            quality_override: None,
        }
    }
}

/// Audio transcode targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Maximum channel count; source channels are clamped to this.
    pub channels: u32,
    /// Target bitrate in kbps for transcoded streams.
    pub bitrate_kbps: u32,
    /// Target sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            channels: 6,
            bitrate_kbps: 192,
            sample_rate: 48000,
        }
    }
}

/// Feature toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Deinterlace automatically when the source is interlaced.
    pub deinterlace: bool,
    /// Carry subtitle streams into the output when the container allows.
    pub keep_subtitles: bool,
    /// Carry attachment streams (fonts etc.) into the output.
    pub keep_attachments: bool,
    /// Attach a resample filter that pins a canonical channel layout.
    pub match_audio_layout: bool,
    /// Seed every encode with the timestamp-fix flags enabled.
    pub clean_timestamps: bool,
    /// Fail permanently on the first error, with no classification.
    pub strict: bool,
    /// Remux instead of re-encoding files already in an edge-safe target codec.
    pub skip_compatible: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            deinterlace: true,
            keep_subtitles: true,
            keep_attachments: true,
            match_audio_layout: false,
            clean_timestamps: false,
            strict: false,
            skip_compatible: true,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}
