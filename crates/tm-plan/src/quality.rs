//! Per-file quality resolution.
//!
//! Smart quality starts from the configured per-scale default and adds a
//! resolution-curve adjustment, a bitrate-curve adjustment, and the
//! configured bias, then clamps into the scale's valid range. The curves are
//! disjoint-range data tables, defined independently per scale because the
//! two encoders' perceptual-quality-to-setting relationships differ.
//!
//! The numeric tables are a fixed contract: tests pin their shape and the
//! bounds they must satisfy. Do not retune them casually.

use tm_core::config::QualityConfig;
use tm_core::QualityPair;

/// One band of an adjustment curve: applies when the key is below `upper`.
struct Band {
    upper: u64,
    adjust: i8,
}

/// NVENC resolution curve, keyed on pixel count.
const NVENC_RESOLUTION_CURVE: &[Band] = &[
    Band { upper: 307_200, adjust: 5 },    // below 640x480
    Band { upper: 921_600, adjust: 3 },    // below 720p
    Band { upper: 2_073_600, adjust: 1 },  // below 1080p
    Band { upper: 8_294_400, adjust: 0 },  // up to 4K
    Band { upper: u64::MAX, adjust: -2 },
];

/// x265 resolution curve, keyed on pixel count.
const X265_RESOLUTION_CURVE: &[Band] = &[
    Band { upper: 307_200, adjust: 4 },
    Band { upper: 921_600, adjust: 2 },
    Band { upper: 2_073_600, adjust: 1 },
    Band { upper: 8_294_400, adjust: 0 },
    Band { upper: u64::MAX, adjust: -1 },
];

/// NVENC bitrate curve, keyed on source kbps.
const NVENC_BITRATE_CURVE: &[Band] = &[
    Band { upper: 1_000, adjust: 3 },
    Band { upper: 2_500, adjust: 2 },
    Band { upper: 5_000, adjust: 1 },
    Band { upper: 10_000, adjust: 0 },
    Band { upper: 20_000, adjust: -1 },
    Band { upper: u64::MAX, adjust: -2 },
];

/// x265 bitrate curve, keyed on source kbps.
const X265_BITRATE_CURVE: &[Band] = &[
    Band { upper: 1_000, adjust: 2 },
    Band { upper: 2_500, adjust: 1 },
    Band { upper: 5_000, adjust: 1 },
    Band { upper: 10_000, adjust: 0 },
    Band { upper: 20_000, adjust: -1 },
    Band { upper: u64::MAX, adjust: -1 },
];

/// A resolved quality pair plus a note describing how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuality {
    pub quality: QualityPair,
    pub note: String,
}

fn curve_lookup(curve: &[Band], key: u64) -> i8 {
    curve
        .iter()
        .find(|band| key < band.upper)
        .map(|band| band.adjust)
        .unwrap_or(0)
}

/// Resolve the quality values for one file.
///
/// Precedence: manual override, then configured defaults when smart
/// adaptation is disabled, then the curve-based smart value. Both scales are
/// always computed so a later encoder-mode switch needs no re-derivation.
///
/// `source_kbps = None` (bitrate unknown) applies no bitrate adjustment.
pub fn resolve_quality(
    cfg: &QualityConfig,
    pixels: u64,
    source_kbps: Option<u64>,
) -> ResolvedQuality {
    if let Some(q) = cfg.quality_override {
        return ResolvedQuality {
            quality: QualityPair::clamped(i32::from(q), i32::from(q)),
            note: "manual override".into(),
        };
    }

    if !cfg.smart {
        return ResolvedQuality {
            quality: QualityPair::clamped(
                i32::from(cfg.nvenc_default),
                i32::from(cfg.x265_default),
            ),
            note: "smart quality disabled; using defaults".into(),
        };
    }

    let nvenc_res = curve_lookup(NVENC_RESOLUTION_CURVE, pixels);
    let x265_res = curve_lookup(X265_RESOLUTION_CURVE, pixels);
    let (nvenc_rate, x265_rate) = match source_kbps {
        Some(kbps) => (
            curve_lookup(NVENC_BITRATE_CURVE, kbps),
            curve_lookup(X265_BITRATE_CURVE, kbps),
        ),
        None => (0, 0),
    };

    let bias = i32::from(cfg.bias);
    let nvenc = i32::from(cfg.nvenc_default) + i32::from(nvenc_res) + i32::from(nvenc_rate) + bias;
    let x265 = i32::from(cfg.x265_default) + i32::from(x265_res) + i32::from(x265_rate) + bias;

    ResolvedQuality {
        quality: QualityPair::clamped(nvenc, x265),
        note: format!(
            "smart quality (resolution {nvenc_res:+}/{x265_res:+}, bitrate {nvenc_rate:+}/{x265_rate:+}, bias {bias:+})"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_core::{NVENC_QUALITY_MAX, NVENC_QUALITY_MIN, X265_QUALITY_MAX, X265_QUALITY_MIN};

    fn cfg(nvenc: u8, x265: u8) -> QualityConfig {
        QualityConfig {
            nvenc_default: nvenc,
            x265_default: x265,
            bias: 0,
            step: 2,
            smart: true,
            quality_override: None,
        }
    }

    #[test]
    fn manual_override_wins() {
        let mut c = cfg(25, 22);
        c.quality_override = Some(18);
        let r = resolve_quality(&c, 230_400, Some(800));
        assert_eq!(r.quality.nvenc, 18);
        assert_eq!(r.quality.x265, 18);
        assert_eq!(r.note, "manual override");
    }

    #[test]
    fn manual_override_is_clamped() {
        let mut c = cfg(25, 22);
        c.quality_override = Some(50);
        let r = resolve_quality(&c, 2_073_600, Some(5000));
        assert_eq!(r.quality.nvenc, NVENC_QUALITY_MAX);
        assert_eq!(r.quality.x265, X265_QUALITY_MAX);
    }

    #[test]
    fn smart_disabled_uses_defaults() {
        let mut c = cfg(25, 22);
        c.smart = false;
        let r = resolve_quality(&c, 230_400, Some(800));
        assert_eq!(r.quality.nvenc, 25);
        assert_eq!(r.quality.x265, 22);
        assert!(r.note.contains("disabled"));
    }

    #[test]
    fn low_resolution_low_bitrate_raises_both_scales() {
        // 640x360 at 800 kbps must resolve strictly above the defaults.
        let r = resolve_quality(&cfg(19, 19), 640 * 360, Some(800));
        assert!(r.quality.nvenc > 19);
        assert!(r.quality.x265 > 19);
        assert!(r.quality.nvenc <= NVENC_QUALITY_MAX);
        assert!(r.quality.x265 <= X265_QUALITY_MAX);
    }

    #[test]
    fn uhd_high_bitrate_lowers_both_scales() {
        let r = resolve_quality(&cfg(25, 22), 3840 * 2160, Some(40_000));
        assert!(r.quality.nvenc < 25);
        assert!(r.quality.x265 < 22);
        assert!(r.quality.nvenc >= NVENC_QUALITY_MIN);
        assert!(r.quality.x265 >= X265_QUALITY_MIN);
    }

    #[test]
    fn fhd_mid_bitrate_is_neutral() {
        let r = resolve_quality(&cfg(25, 22), 1920 * 1080, Some(8000));
        assert_eq!(r.quality.nvenc, 25);
        assert_eq!(r.quality.x265, 22);
    }

    #[test]
    fn unknown_bitrate_applies_no_rate_adjustment() {
        let r = resolve_quality(&cfg(25, 22), 1920 * 1080, None);
        assert_eq!(r.quality.nvenc, 25);
        assert_eq!(r.quality.x265, 22);
    }

    #[test]
    fn bias_shifts_result() {
        let mut c = cfg(25, 22);
        c.bias = -3;
        let r = resolve_quality(&c, 1920 * 1080, Some(8000));
        assert_eq!(r.quality.nvenc, 22);
        assert_eq!(r.quality.x265, 19);
    }

    #[test]
    fn result_always_clamped() {
        let mut c = cfg(25, 22);
        c.bias = 120;
        let r = resolve_quality(&c, 100, Some(100));
        assert_eq!(r.quality.nvenc, NVENC_QUALITY_MAX);
        assert_eq!(r.quality.x265, X265_QUALITY_MAX);

        c.bias = -120;
        let r = resolve_quality(&c, u64::MAX - 1, Some(100_000));
        assert_eq!(r.quality.nvenc, NVENC_QUALITY_MIN);
        assert_eq!(r.quality.x265, X265_QUALITY_MIN);
    }

    #[test]
    fn curves_are_monotonically_non_increasing() {
        for curve in [
            NVENC_RESOLUTION_CURVE,
            X265_RESOLUTION_CURVE,
            NVENC_BITRATE_CURVE,
            X265_BITRATE_CURVE,
        ] {
            for pair in curve.windows(2) {
                assert!(pair[0].upper < pair[1].upper, "bands must be ordered");
                assert!(
                    pair[0].adjust >= pair[1].adjust,
                    "larger keys must not raise the adjustment"
                );
            }
        }
    }

    #[test]
    fn determinism() {
        let a = resolve_quality(&cfg(25, 22), 1_234_567, Some(4321));
        let b = resolve_quality(&cfg(25, 22), 1_234_567, Some(4321));
        assert_eq!(a, b);
    }
}
