//! Assembles the full per-file [`Plan`] from probe output and configuration.

use std::path::Path;

use tracing::debug;

use tm_core::config::Config;
use tm_core::{Error, PlanAction, Result};
use tm_probe::MediaInfo;

use crate::action::decide_action;
use crate::audio::{plan_audio, AudioPlan};
use crate::filters::{color_metadata, video_filters};
use crate::plan::{Plan, RetrySeed, DEFAULT_MUX_QUEUE_SIZE};
use crate::quality::resolve_quality;
use crate::subs::{plan_attachments, plan_subtitles, AttachmentPlan, SubtitlePlan};

fn container_opts(cfg: &Config) -> Vec<String> {
    match cfg.output.container {
        tm_core::Container::Mp4 => vec!["-movflags".into(), "+faststart".into()],
        tm_core::Container::Mkv => Vec::new(),
    }
}

fn dispositions(audio_count: usize) -> Vec<(String, String)> {
    let mut flags = vec![("v:0".to_string(), "default".to_string())];
    if audio_count > 0 {
        flags.push(("a:0".into(), "default".into()));
        for i in 1..audio_count {
            flags.push((format!("a:{i}"), "0".into()));
        }
    }
    flags
}

/// Build the complete plan for one file.
///
/// Deterministic: the same metadata and configuration always produce the same
/// plan. Fails with [`Error::Plan`] when the source has no video stream;
/// callers filter such files out before planning, so reaching this is a bug
/// upstream.
pub fn build_plan(info: &MediaInfo, cfg: &Config, output: &Path) -> Result<Plan> {
    let video = info
        .video
        .as_ref()
        .ok_or_else(|| Error::Plan(format!("{}: no video stream", info.path.display())))?;

    let decision = decide_action(video, cfg.behavior.skip_compatible);
    let resolved = resolve_quality(&cfg.quality, video.pixels(), info.source_bitrate_kbps());

    let (video_codec, filters, color, audio) = match decision.action {
        PlanAction::Encode => (
            cfg.output.encoder.encoder_name().to_string(),
            video_filters(video, cfg.output.encoder, cfg.output.hdr, cfg.behavior.deinterlace),
            color_metadata(video, cfg.output.hdr),
            plan_audio(&info.audio_streams, &cfg.audio, cfg.behavior.match_audio_layout),
        ),
        PlanAction::Remux | PlanAction::Skip => (
            "copy".to_string(),
            Vec::new(),
            None,
            if info.audio_streams.is_empty() {
                AudioPlan::None
            } else {
                AudioPlan::CopyAll
            },
        ),
    };

    let subtitles = plan_subtitles(
        &info.subtitle_streams,
        cfg.output.container,
        cfg.behavior.keep_subtitles,
    );
    let attachments = plan_attachments(
        info.attachment_count,
        cfg.output.container,
        cfg.behavior.keep_attachments,
    );

    let retry_seed = RetrySeed {
        mux_queue_size: DEFAULT_MUX_QUEUE_SIZE,
        timestamp_fix: cfg.behavior.clean_timestamps,
        include_subtitles: subtitles != SubtitlePlan::Exclude,
        include_attachments: attachments == AttachmentPlan::Include,
    };

    debug!(
        input = %info.path.display(),
        action = %decision.action,
        codec = %video_codec,
        nvenc = resolved.quality.nvenc,
        x265 = resolved.quality.x265,
        "plan built"
    );

    let dispositions = dispositions(info.audio_streams.len());

    Ok(Plan {
        input: info.path.clone(),
        output: output.to_path_buf(),
        action: decision.action,
        video_codec,
        quality: resolved.quality,
        video_filters: filters,
        color,
        audio,
        subtitles,
        attachments,
        container_opts: container_opts(cfg),
        dispositions,
        note: decision.note,
        quality_note: resolved.note,
        retry_seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tm_core::{Container, EncoderMode, QualityPair};
    use tm_probe::{AudioStream, SubtitleStream, VideoStream};

    fn video(codec: &str) -> VideoStream {
        VideoStream {
            codec: codec.into(),
            profile: Some("Main 10".into()),
            pix_fmt: Some("yuv420p10le".into()),
            width: 1920,
            height: 1080,
            bitrate_kbps: Some(8000),
            field_order: None,
            color_transfer: None,
            color_primaries: None,
            color_space: None,
        }
    }

    fn info(codec: &str) -> MediaInfo {
        MediaInfo {
            path: PathBuf::from("/in/movie.mkv"),
            file_size: 4_000_000_000,
            bitrate_kbps: Some(9000),
            duration_secs: Some(7200.0),
            video: Some(video(codec)),
            audio_streams: vec![AudioStream {
                codec: "dts".into(),
                channels: 6,
                sample_rate: Some(48_000),
                bitrate_kbps: Some(1_536),
                language: Some("eng".into()),
                default: true,
            }],
            subtitle_streams: vec![SubtitleStream {
                codec: "subrip".into(),
                bitmap: false,
            }],
            attachment_count: 2,
        }
    }

    fn out() -> PathBuf {
        PathBuf::from("/out/movie.mkv")
    }

    #[test]
    fn missing_video_is_a_plan_error() {
        let mut i = info("h264");
        i.video = None;
        let err = build_plan(&i, &Config::default(), &out()).unwrap_err();
        assert!(matches!(err, Error::Plan(_)));
    }

    #[test]
    fn encode_plan_uses_configured_encoder() {
        let mut cfg = Config::default();
        cfg.output.encoder = EncoderMode::Hardware;
        let plan = build_plan(&info("h264"), &cfg, &out()).unwrap();
        assert_eq!(plan.action, PlanAction::Encode);
        assert_eq!(plan.video_codec, "hevc_nvenc");

        cfg.output.encoder = EncoderMode::Software;
        let plan = build_plan(&info("h264"), &cfg, &out()).unwrap();
        assert_eq!(plan.video_codec, "libx265");
    }

    #[test]
    fn remux_plan_copies_everything() {
        let plan = build_plan(&info("hevc"), &Config::default(), &out()).unwrap();
        assert_eq!(plan.action, PlanAction::Remux);
        assert_eq!(plan.video_codec, "copy");
        assert!(plan.video_filters.is_empty());
        assert!(plan.color.is_none());
        assert_eq!(plan.audio, AudioPlan::CopyAll);
        // The quality pair is still resolved so a later bump needs nothing.
        assert!(plan.quality.nvenc >= tm_core::NVENC_QUALITY_MIN);
    }

    #[test]
    fn mp4_target_adds_faststart() {
        let mut cfg = Config::default();
        cfg.output.container = Container::Mp4;
        let plan = build_plan(&info("h264"), &cfg, &out()).unwrap();
        assert_eq!(plan.container_opts, vec!["-movflags", "+faststart"]);
    }

    #[test]
    fn dispositions_mark_first_streams_default() {
        let mut i = info("h264");
        i.audio_streams.push(AudioStream {
            codec: "aac".into(),
            channels: 2,
            sample_rate: Some(48_000),
            bitrate_kbps: Some(128),
            language: Some("fre".into()),
            default: false,
        });
        let plan = build_plan(&i, &Config::default(), &out()).unwrap();
        assert_eq!(
            plan.dispositions,
            vec![
                ("v:0".to_string(), "default".to_string()),
                ("a:0".to_string(), "default".to_string()),
                ("a:1".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn retry_seed_reflects_config_and_stream_plans() {
        let mut cfg = Config::default();
        cfg.behavior.clean_timestamps = true;
        let plan = build_plan(&info("h264"), &cfg, &out()).unwrap();
        assert_eq!(plan.retry_seed.mux_queue_size, DEFAULT_MUX_QUEUE_SIZE);
        assert!(plan.retry_seed.timestamp_fix);
        assert!(plan.retry_seed.include_subtitles);
        assert!(plan.retry_seed.include_attachments);

        cfg.behavior.clean_timestamps = false;
        cfg.behavior.keep_subtitles = false;
        cfg.behavior.keep_attachments = false;
        let plan = build_plan(&info("h264"), &cfg, &out()).unwrap();
        assert!(!plan.retry_seed.timestamp_fix);
        assert!(!plan.retry_seed.include_subtitles);
        assert!(!plan.retry_seed.include_attachments);
    }

    #[test]
    fn manual_override_reaches_plan_quality() {
        let mut cfg = Config::default();
        cfg.quality.quality_override = Some(20);
        let plan = build_plan(&info("h264"), &cfg, &out()).unwrap();
        assert_eq!(plan.quality, QualityPair { nvenc: 20, x265: 20 });
        assert_eq!(plan.quality_note, "manual override");
    }

    #[test]
    fn same_inputs_build_identical_plans() {
        let cfg = Config::default();
        let a = build_plan(&info("h264"), &cfg, &out()).unwrap();
        let b = build_plan(&info("h264"), &cfg, &out()).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
