//! Per-stream audio planning.

use serde::{Deserialize, Serialize};
use tm_core::config::AudioConfig;
use tm_probe::AudioStream;

/// Codec eligible for passthrough when its bitrate is already modest.
const PASSTHROUGH_CODEC: &str = "aac";

/// Streams above this bitrate are re-encoded even when already AAC.
const PASSTHROUGH_MAX_KBPS: u64 = 256;

/// How one audio stream is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioMode {
    Copy,
    Transcode,
}

/// Plan for a single audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStreamPlan {
    pub mode: AudioMode,
    /// Target channel count; `None` keeps the source layout.
    pub channels: Option<u32>,
    /// Target bitrate for transcoded streams.
    pub bitrate_kbps: Option<u64>,
    pub sample_rate: Option<u32>,
    /// Audio filter string, present only when layout matching is on.
    pub filter: Option<String>,
}

/// Plan for all audio in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioPlan {
    /// Source has no audio.
    None,
    /// Remux path: every stream copied verbatim.
    CopyAll,
    /// Encode path: one entry per source stream, in stream order.
    Streams(Vec<AudioStreamPlan>),
}

fn passthrough_eligible(stream: &AudioStream) -> bool {
    // Unknown bitrate could hide an oversized stream, so it is re-encoded.
    stream.codec == PASSTHROUGH_CODEC
        && stream
            .bitrate_kbps
            .map(|kbps| kbps <= PASSTHROUGH_MAX_KBPS)
            .unwrap_or(false)
}

fn layout_filter(cfg: &AudioConfig) -> String {
    let mut filter = format!("aresample={}", cfg.sample_rate);
    // Downmix targets need an explicit layout constraint; surround targets
    // let ffmpeg negotiate the closest layout.
    if cfg.channels <= 2 {
        filter.push_str(",aformat=channel_layouts=mono|stereo");
    }
    filter
}

/// Build the audio plan for an encode.
///
/// Modest AAC streams pass through untouched; everything else is transcoded
/// to the configured target. A file where every stream is passthrough
/// collapses to [`AudioPlan::CopyAll`]. When `match_audio_layout` is set,
/// transcoded streams also get a resample filter pinning the configured
/// sample rate and, for stereo-or-below targets, the channel layout.
pub fn plan_audio(
    streams: &[AudioStream],
    cfg: &AudioConfig,
    match_audio_layout: bool,
) -> AudioPlan {
    if streams.is_empty() {
        return AudioPlan::None;
    }

    if streams.iter().all(passthrough_eligible) {
        return AudioPlan::CopyAll;
    }

    let plans = streams
        .iter()
        .map(|stream| {
            if passthrough_eligible(stream) {
                AudioStreamPlan {
                    mode: AudioMode::Copy,
                    channels: None,
                    bitrate_kbps: None,
                    sample_rate: None,
                    filter: None,
                }
            } else {
                // Never upmix: a stereo source stays stereo even with a
                // surround target.
                let channels = if stream.channels > 0 {
                    stream.channels.min(cfg.channels)
                } else {
                    cfg.channels
                };
                AudioStreamPlan {
                    mode: AudioMode::Transcode,
                    channels: Some(channels),
                    bitrate_kbps: Some(u64::from(cfg.bitrate_kbps)),
                    sample_rate: Some(cfg.sample_rate),
                    filter: match_audio_layout.then(|| layout_filter(cfg)),
                }
            }
        })
        .collect();

    AudioPlan::Streams(plans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(codec: &str, bitrate_kbps: Option<u64>) -> AudioStream {
        AudioStream {
            codec: codec.into(),
            channels: 6,
            sample_rate: Some(48_000),
            bitrate_kbps,
            language: None,
            default: false,
        }
    }

    fn cfg() -> AudioConfig {
        AudioConfig {
            channels: 6,
            bitrate_kbps: 192,
            sample_rate: 48_000,
        }
    }

    #[test]
    fn no_streams_yields_none() {
        assert_eq!(plan_audio(&[], &cfg(), false), AudioPlan::None);
    }

    #[test]
    fn all_streams_passthrough_collapses_to_copy_all() {
        let plan = plan_audio(
            &[stream("aac", Some(192)), stream("aac", Some(128))],
            &cfg(),
            false,
        );
        assert_eq!(plan, AudioPlan::CopyAll);
    }

    #[test]
    fn oversized_aac_is_transcoded() {
        let plan = plan_audio(&[stream("aac", Some(640))], &cfg(), false);
        let AudioPlan::Streams(plans) = plan else {
            panic!("expected per-stream plans");
        };
        assert_eq!(plans[0].mode, AudioMode::Transcode);
        assert_eq!(plans[0].bitrate_kbps, Some(192));
    }

    #[test]
    fn unknown_bitrate_aac_is_transcoded() {
        let plan = plan_audio(&[stream("aac", None)], &cfg(), false);
        let AudioPlan::Streams(plans) = plan else {
            panic!("expected per-stream plans");
        };
        assert_eq!(plans[0].mode, AudioMode::Transcode);
    }

    #[test]
    fn non_aac_is_transcoded() {
        let plan = plan_audio(&[stream("dts", Some(1_536))], &cfg(), false);
        let AudioPlan::Streams(plans) = plan else {
            panic!("expected per-stream plans");
        };
        assert_eq!(plans[0].mode, AudioMode::Transcode);
        assert_eq!(plans[0].channels, Some(6));
        assert_eq!(plans[0].sample_rate, Some(48_000));
    }

    #[test]
    fn layout_matching_adds_resample_filter() {
        let plan = plan_audio(&[stream("ac3", Some(448))], &cfg(), true);
        let AudioPlan::Streams(plans) = plan else {
            panic!("expected per-stream plans");
        };
        assert_eq!(plans[0].filter.as_deref(), Some("aresample=48000"));
    }

    #[test]
    fn stereo_target_constrains_channel_layout() {
        let mut c = cfg();
        c.channels = 2;
        let plan = plan_audio(&[stream("ac3", Some(448))], &c, true);
        let AudioPlan::Streams(plans) = plan else {
            panic!("expected per-stream plans");
        };
        assert_eq!(
            plans[0].filter.as_deref(),
            Some("aresample=48000,aformat=channel_layouts=mono|stereo")
        );
    }

    #[test]
    fn stereo_source_is_not_upmixed() {
        let mut s = stream("mp3", Some(320));
        s.channels = 2;
        let plan = plan_audio(&[s], &cfg(), false);
        let AudioPlan::Streams(plans) = plan else {
            panic!("expected per-stream plans");
        };
        assert_eq!(plans[0].channels, Some(2));
    }

    #[test]
    fn mixed_streams_keep_source_order() {
        let plan = plan_audio(
            &[stream("aac", Some(128)), stream("dts", Some(1_536))],
            &cfg(),
            false,
        );
        let AudioPlan::Streams(plans) = plan else {
            panic!("expected per-stream plans");
        };
        assert_eq!(plans[0].mode, AudioMode::Copy);
        assert_eq!(plans[1].mode, AudioMode::Transcode);
    }
}
