//! Batch discovery and sequential file processing.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use walkdir::WalkDir;

use tm_core::config::Config;
use tm_core::PlanAction;
use tm_engine::{drive, DriveOutcome, FailureReason, FfmpegBackend};
use tm_plan::build_plan;
use tm_probe::probe_file;

use crate::report::{self, ReportStyle};

/// Extensions considered media input.
const MEDIA_EXTENSIONS: &[&str] = &[
    "avi", "flv", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "ts", "webm", "wmv",
];

/// Terminal state of one input file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Converted {
        input: PathBuf,
        output_size: u64,
        attempts: u32,
        quality_passes: u32,
    },
    Remuxed {
        input: PathBuf,
        output_size: u64,
    },
    Skipped {
        input: PathBuf,
        reason: String,
    },
    Failed {
        input: PathBuf,
        reason: String,
    },
    Cancelled {
        input: PathBuf,
    },
}

/// End-of-run totals.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub converted: usize,
    pub remuxed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl BatchSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Converted { output_size, .. } => {
                self.converted += 1;
                self.output_bytes += output_size;
            }
            FileOutcome::Remuxed { output_size, .. } => {
                self.remuxed += 1;
                self.output_bytes += output_size;
            }
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
            FileOutcome::Cancelled { .. } => self.cancelled += 1,
        }
    }
}

/// Collect media files under `input`, sorted for a stable processing order.
pub fn discover(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| MEDIA_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

fn failure_text(reason: FailureReason, diagnostic_tail: &str) -> String {
    let what = match reason {
        FailureReason::Strict => "failed in strict mode",
        FailureReason::Unclassified => "unrecognized failure",
        FailureReason::AttemptsExhausted => "retries exhausted",
    };
    match diagnostic_tail.lines().last() {
        Some(line) if !line.trim().is_empty() => format!("{what}: {}", line.trim()),
        _ => what.to_string(),
    }
}

/// Sequential batch driver over one input set.
pub struct BatchProcessor {
    config: Config,
    backend: FfmpegBackend,
    style: ReportStyle,
    cancel: CancellationToken,
}

impl BatchProcessor {
    pub fn new(
        config: Config,
        ffmpeg: PathBuf,
        style: ReportStyle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            backend: FfmpegBackend::new(ffmpeg),
            style,
            cancel,
        }
    }

    fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".into());
        output_dir.join(format!("{stem}.{}", self.config.output.container.extension()))
    }

    /// Process every discovered file in order, stopping early on cancellation.
    pub async fn run(&self, input: &Path, output_dir: &Path) -> anyhow::Result<BatchSummary> {
        let files = discover(input);
        if files.is_empty() {
            anyhow::bail!("no media files found under {}", input.display());
        }
        info!(count = files.len(), "starting batch");

        std::fs::create_dir_all(output_dir)?;

        let mut summary = BatchSummary::default();
        let registry = tm_av::ToolRegistry::discover(&self.config.tools);

        for file in files {
            if self.cancel.is_cancelled() {
                let outcome = FileOutcome::Cancelled { input: file };
                report::print_outcome(&self.style, &outcome);
                summary.record(&outcome);
                break;
            }

            let outcome = self.process_one(&registry, &file, output_dir).await;
            if matches!(
                outcome,
                FileOutcome::Converted { .. } | FileOutcome::Remuxed { .. }
            ) {
                summary.input_bytes += std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);
            }
            report::print_outcome(&self.style, &outcome);
            summary.record(&outcome);

            if matches!(outcome, FileOutcome::Cancelled { .. }) {
                break;
            }
        }

        Ok(summary)
    }

    async fn process_one(
        &self,
        registry: &tm_av::ToolRegistry,
        file: &Path,
        output_dir: &Path,
    ) -> FileOutcome {
        let info = match probe_file(registry, file).await {
            Ok(info) => info,
            Err(e) => {
                warn!(input = %file.display(), "probe failed: {e}");
                return FileOutcome::Failed {
                    input: file.to_path_buf(),
                    reason: format!("probe failed: {e}"),
                };
            }
        };

        if info.video.is_none() {
            return FileOutcome::Skipped {
                input: file.to_path_buf(),
                reason: "no video stream".into(),
            };
        }

        let output = self.output_path(file, output_dir);
        if output == file {
            return FileOutcome::Skipped {
                input: file.to_path_buf(),
                reason: "output would overwrite input".into(),
            };
        }

        let plan = match build_plan(&info, &self.config, &output) {
            Ok(plan) => plan,
            Err(e) => {
                return FileOutcome::Failed {
                    input: file.to_path_buf(),
                    reason: e.to_string(),
                };
            }
        };

        let drive_result = drive(
            &self.backend,
            &plan,
            self.config.behavior.strict,
            self.config.quality.step,
            info.file_size,
            &self.cancel,
        )
        .await;

        match drive_result {
            Ok(DriveOutcome::Completed {
                attempts,
                quality_passes,
                output_size,
            }) => {
                if plan.action == PlanAction::Remux {
                    FileOutcome::Remuxed {
                        input: file.to_path_buf(),
                        output_size,
                    }
                } else {
                    FileOutcome::Converted {
                        input: file.to_path_buf(),
                        output_size,
                        attempts,
                        quality_passes,
                    }
                }
            }
            Ok(DriveOutcome::Failed {
                reason,
                diagnostic_tail,
            }) => FileOutcome::Failed {
                input: file.to_path_buf(),
                reason: failure_text(reason, &diagnostic_tail),
            },
            Ok(DriveOutcome::Cancelled) => FileOutcome::Cancelled {
                input: file.to_path_buf(),
            },
            Err(e) => FileOutcome::Failed {
                input: file.to_path_buf(),
                reason: e.to_string(),
            },
        }
    }
}
