//! Encoder quality scales.
//!
//! NVENC constant-quality and x265 CRF use different numeric ranges and
//! different perceptual curves, so both values are always carried together.
//! Every operation that sets a value clamps it into its scale's valid range.

use serde::{Deserialize, Serialize};

use crate::EncoderMode;

/// Lowest (best quality) NVENC constant-quality value transmog will use.
pub const NVENC_QUALITY_MIN: u8 = 14;
/// Highest (most compressed) NVENC constant-quality value transmog will use.
pub const NVENC_QUALITY_MAX: u8 = 36;
/// Lowest (best quality) x265 CRF value transmog will use.
pub const X265_QUALITY_MIN: u8 = 16;
/// Highest (most compressed) x265 CRF value transmog will use.
pub const X265_QUALITY_MAX: u8 = 30;

/// A quality value on both encoder scales.
///
/// Both scales are always resolved together so a later encoder-mode switch
/// needs no re-derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPair {
    /// NVENC constant-quality value, always within `[14, 36]`.
    pub nvenc: u8,
    /// x265 CRF value, always within `[16, 30]`.
    pub x265: u8,
}

impl QualityPair {
    /// Build a pair from possibly out-of-range signed values, clamping each
    /// into its scale's valid range.
    pub fn clamped(nvenc: i32, x265: i32) -> Self {
        Self {
            nvenc: clamp_scale(nvenc, NVENC_QUALITY_MIN, NVENC_QUALITY_MAX),
            x265: clamp_scale(x265, X265_QUALITY_MIN, X265_QUALITY_MAX),
        }
    }

    /// Increase both values by `step` (more compression), clamped.
    pub fn bumped(self, step: u8) -> Self {
        Self::clamped(
            i32::from(self.nvenc) + i32::from(step),
            i32::from(self.x265) + i32::from(step),
        )
    }

    /// The value for the active encoder mode.
    pub fn for_mode(&self, mode: EncoderMode) -> u8 {
        match mode {
            EncoderMode::Hardware => self.nvenc,
            EncoderMode::Software => self.x265,
        }
    }
}

fn clamp_scale(value: i32, min: u8, max: u8) -> u8 {
    value.clamp(i32::from(min), i32::from(max)) as u8
}
