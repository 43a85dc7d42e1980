//! Execution backends: turn a plan plus retry state into one tool attempt.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use tm_av::ToolCommand;
use tm_core::{EncoderMode, Result};
use tm_plan::{AudioMode, AudioPlan, Plan, SubtitlePlan};

use crate::retry::RetryState;

/// Result of one tool attempt.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub succeeded: bool,
    /// Tool stderr, used for failure classification.
    pub diagnostic: String,
    /// Output file size, present when the attempt produced a file.
    pub output_size: Option<u64>,
}

/// Runs one attempt for a plan. Implemented by the real ffmpeg backend and by
/// test fakes.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn run_attempt(
        &self,
        plan: &Plan,
        retry: &RetryState,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome>;
}

/// Build the full ffmpeg argument vector for one attempt.
///
/// Pure so the exact invocation can be asserted without spawning a process.
/// Everything mutable across attempts comes from `retry`, not the plan.
pub fn build_args(plan: &Plan, retry: &RetryState) -> Vec<String> {
    let mut args: Vec<String> = vec!["-hide_banner".into(), "-y".into()];

    if retry.timestamp_fix {
        args.extend([
            "-fflags".into(),
            "+genpts".into(),
            "-avoid_negative_ts".into(),
            "make_zero".into(),
        ]);
    }

    args.extend(["-i".into(), plan.input.to_string_lossy().into_owned()]);

    // Stream mapping. Video first, then audio, subtitles, attachments.
    args.extend(["-map".into(), "0:v:0".into()]);

    match &plan.audio {
        AudioPlan::None => {}
        AudioPlan::CopyAll => {
            args.extend(["-map".into(), "0:a?".into(), "-c:a".into(), "copy".into()]);
        }
        AudioPlan::Streams(streams) => {
            for (i, stream) in streams.iter().enumerate() {
                args.extend(["-map".into(), format!("0:a:{i}")]);
                match stream.mode {
                    AudioMode::Copy => {
                        args.extend([format!("-c:a:{i}"), "copy".into()]);
                    }
                    AudioMode::Transcode => {
                        args.extend([format!("-c:a:{i}"), "aac".into()]);
                        if let Some(channels) = stream.channels {
                            args.extend([format!("-ac:a:{i}"), channels.to_string()]);
                        }
                        if let Some(kbps) = stream.bitrate_kbps {
                            args.extend([format!("-b:a:{i}"), format!("{kbps}k")]);
                        }
                        if let Some(rate) = stream.sample_rate {
                            args.extend([format!("-ar:a:{i}"), rate.to_string()]);
                        }
                        if let Some(filter) = &stream.filter {
                            args.extend([format!("-filter:a:{i}"), filter.clone()]);
                        }
                    }
                }
            }
        }
    }

    if retry.include_subtitles {
        match &plan.subtitles {
            SubtitlePlan::Exclude => {}
            SubtitlePlan::CopyAll => {
                args.extend(["-map".into(), "0:s?".into(), "-c:s".into(), "copy".into()]);
            }
            SubtitlePlan::Convert { codec, streams } => {
                match streams {
                    Some(indices) => {
                        for idx in indices {
                            args.extend(["-map".into(), format!("0:s:{idx}")]);
                        }
                    }
                    None => args.extend(["-map".into(), "0:s?".into()]),
                }
                args.extend(["-c:s".into(), codec.clone()]);
            }
        }
    } else {
        args.push("-sn".into());
    }

    if retry.include_attachments {
        args.extend(["-map".into(), "0:t?".into()]);
    }

    args.extend(["-c:v".into(), plan.video_codec.clone()]);

    if plan.video_codec == EncoderMode::Hardware.encoder_name() {
        args.extend(["-cq".into(), retry.quality.nvenc.to_string()]);
    } else if plan.video_codec == EncoderMode::Software.encoder_name() {
        args.extend(["-crf".into(), retry.quality.x265.to_string()]);
    }

    if !plan.video_filters.is_empty() {
        args.extend(["-vf".into(), plan.video_filters.join(",")]);
    }

    if let Some(color) = &plan.color {
        args.extend([
            "-color_trc".into(),
            color.transfer.clone(),
            "-color_primaries".into(),
            color.primaries.clone(),
            "-colorspace".into(),
            color.space.clone(),
        ]);
    }

    for (spec, value) in &plan.dispositions {
        args.extend([format!("-disposition:{spec}"), value.clone()]);
    }

    args.extend([
        "-max_muxing_queue_size".into(),
        retry.mux_queue_size.to_string(),
    ]);

    args.extend(plan.container_opts.iter().cloned());
    args.push(plan.output.to_string_lossy().into_owned());

    args
}

/// The real backend: spawns ffmpeg and reports its exit status and stderr.
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
}

impl FfmpegBackend {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }
}

#[async_trait]
impl ExecutionBackend for FfmpegBackend {
    async fn run_attempt(
        &self,
        plan: &Plan,
        retry: &RetryState,
        cancel: &CancellationToken,
    ) -> Result<AttemptOutcome> {
        let args = build_args(plan, retry);
        debug!(input = %plan.input.display(), "spawning ffmpeg");

        let mut cmd = ToolCommand::new(self.ffmpeg.clone());
        cmd.args(args);
        let output = cmd.run(Some(cancel)).await?;

        let output_size = tokio::fs::metadata(&plan.output).await.ok().map(|m| m.len());

        Ok(AttemptOutcome {
            succeeded: output.status.success(),
            diagnostic: output.stderr,
            output_size,
        })
    }
}
