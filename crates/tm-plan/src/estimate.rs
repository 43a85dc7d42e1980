//! Pre-encode output size estimation.
//!
//! Ratios are expressed in tenths of a percent of the source bitrate so the
//! tables stay integral. They were fitted against a mixed library of real
//! encodes and are treated as a fixed contract.

use tm_core::EncoderMode;

/// One band of a ratio table: applies when quality is at or below `upper`.
struct RatioBand {
    upper: u8,
    tenths: i32,
}

/// NVENC CQ to output-ratio table.
const NVENC_RATIO: &[RatioBand] = &[
    RatioBand { upper: 16, tenths: 700 },
    RatioBand { upper: 18, tenths: 620 },
    RatioBand { upper: 20, tenths: 540 },
    RatioBand { upper: 22, tenths: 470 },
    RatioBand { upper: 24, tenths: 410 },
    RatioBand { upper: 26, tenths: 350 },
    RatioBand { upper: 28, tenths: 300 },
    RatioBand { upper: 31, tenths: 250 },
    RatioBand { upper: 34, tenths: 200 },
    RatioBand { upper: 36, tenths: 160 },
];

/// x265 CRF to output-ratio table.
const X265_RATIO: &[RatioBand] = &[
    RatioBand { upper: 17, tenths: 650 },
    RatioBand { upper: 19, tenths: 580 },
    RatioBand { upper: 21, tenths: 500 },
    RatioBand { upper: 23, tenths: 430 },
    RatioBand { upper: 25, tenths: 370 },
    RatioBand { upper: 27, tenths: 310 },
    RatioBand { upper: 30, tenths: 250 },
];

/// Source codecs whose streams compress much further when re-encoded.
const LEGACY_CODECS: &[&str] = &["mpeg2video", "mpeg4", "msmpeg4v3", "vc1", "wmv3"];

/// Source codecs already near the target's efficiency.
const MODERN_CODECS: &[&str] = &["hevc", "av1", "vp9"];

const RATIO_MIN_TENTHS: i32 = 80;
const RATIO_MAX_TENTHS: i32 = 950;

/// Predicted output bitrate range for one encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitrateEstimate {
    pub low_kbps: u64,
    pub high_kbps: u64,
    /// Low bound as a percentage of the source bitrate.
    pub low_pct: f64,
    /// High bound as a percentage of the source bitrate.
    pub high_pct: f64,
}

fn ratio_lookup(table: &[RatioBand], quality: u8) -> i32 {
    table
        .iter()
        .find(|band| quality <= band.upper)
        .map(|band| band.tenths)
        .unwrap_or(RATIO_MIN_TENTHS)
}

fn codec_bias(codec: &str) -> i32 {
    if LEGACY_CODECS.contains(&codec) {
        -80
    } else if MODERN_CODECS.contains(&codec) {
        100
    } else {
        0
    }
}

fn resolution_bias(pixels: u64) -> i32 {
    if pixels < 307_200 {
        50
    } else if pixels > 8_294_400 {
        -30
    } else {
        0
    }
}

fn bitrate_bias(source_kbps: u64) -> i32 {
    if source_kbps < 1_500 {
        100
    } else if source_kbps < 3_000 {
        50
    } else {
        0
    }
}

/// Estimate the output bitrate range for an encode.
///
/// The quality value is interpreted on the active encoder's scale. Biases for
/// the source codec, resolution and bitrate shift the base ratio before it is
/// clamped and widened into a low/high band.
pub fn estimate_bitrate(
    mode: EncoderMode,
    quality: u8,
    source_kbps: u64,
    source_codec: &str,
    pixels: u64,
) -> BitrateEstimate {
    let base = match mode {
        EncoderMode::Hardware => ratio_lookup(NVENC_RATIO, quality),
        EncoderMode::Software => ratio_lookup(X265_RATIO, quality),
    };

    let tenths = (base + codec_bias(source_codec) + resolution_bias(pixels) + bitrate_bias(source_kbps))
        .clamp(RATIO_MIN_TENTHS, RATIO_MAX_TENTHS);

    let ratio = f64::from(tenths) / 1000.0;
    let low = ratio * 0.8;
    let high = ratio * 1.2;
    let source = source_kbps as f64;

    BitrateEstimate {
        low_kbps: (source * low).round() as u64,
        high_kbps: (source * high).round() as u64,
        low_pct: low * 100.0,
        high_pct: high * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_quality_value_shrinks_estimate() {
        let loose = estimate_bitrate(EncoderMode::Hardware, 32, 8000, "h264", 2_073_600);
        let tight = estimate_bitrate(EncoderMode::Hardware, 18, 8000, "h264", 2_073_600);
        assert!(loose.high_kbps < tight.low_kbps);
    }

    #[test]
    fn legacy_codec_compresses_further_than_modern() {
        let legacy = estimate_bitrate(EncoderMode::Software, 22, 8000, "mpeg2video", 2_073_600);
        let modern = estimate_bitrate(EncoderMode::Software, 22, 8000, "hevc", 2_073_600);
        assert!(legacy.low_kbps < modern.low_kbps);
        assert!(legacy.high_kbps < modern.high_kbps);
    }

    #[test]
    fn band_is_widened_around_the_ratio() {
        let e = estimate_bitrate(EncoderMode::Hardware, 25, 10_000, "h264", 2_073_600);
        assert!(e.low_kbps < e.high_kbps);
        assert!((e.high_pct / e.low_pct - 1.5).abs() < 1e-9);
    }

    #[test]
    fn ratio_never_exceeds_bounds() {
        // Every bias pushing upward still clamps below 95%.
        let e = estimate_bitrate(EncoderMode::Hardware, 14, 1_000, "hevc", 100_000);
        assert!(e.high_pct <= 95.0 * 1.2);
        // Every bias pushing downward still clamps above 8%.
        let e = estimate_bitrate(EncoderMode::Hardware, 36, 50_000, "mpeg2video", 9_000_000);
        assert!(e.low_pct >= 8.0 * 0.8);
    }

    #[test]
    fn ratio_tables_are_monotonic() {
        for table in [NVENC_RATIO, X265_RATIO] {
            for pair in table.windows(2) {
                assert!(pair[0].upper < pair[1].upper);
                assert!(pair[0].tenths > pair[1].tenths);
            }
        }
    }

    #[test]
    fn zero_source_bitrate_yields_zero_estimate() {
        let e = estimate_bitrate(EncoderMode::Software, 22, 0, "h264", 2_073_600);
        assert_eq!(e.low_kbps, 0);
        assert_eq!(e.high_kbps, 0);
    }
}
