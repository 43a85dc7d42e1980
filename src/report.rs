//! Terminal output for batch runs.

use tm_core::PlanAction;
use tm_plan::Plan;

use crate::processor::{BatchSummary, FileOutcome};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Styling for human-readable output.
#[derive(Debug, Clone, Copy)]
pub struct ReportStyle {
    pub color: bool,
}

impl ReportStyle {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn ok(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    pub fn err(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Print a plan for `--dry-run` or the `plan` subcommand.
pub fn print_plan(style: &ReportStyle, plan: &Plan) {
    println!("{}", plan.input.display());
    let action = match plan.action {
        PlanAction::Encode => style.ok("encode"),
        PlanAction::Remux => style.warn("remux"),
        PlanAction::Skip => style.dim("skip"),
    };
    println!("  action:  {action}");
    if let Some(note) = &plan.note {
        println!("  note:    {note}");
    }
    println!("  video:   {}", plan.video_codec);
    if plan.action == PlanAction::Encode {
        println!(
            "  quality: cq {} / crf {} ({})",
            plan.quality.nvenc, plan.quality.x265, plan.quality_note
        );
    }
    if !plan.video_filters.is_empty() {
        println!("  filters: {}", plan.video_filters.join(","));
    }
    println!("  output:  {}", plan.output.display());
}

/// One line per finished file.
pub fn print_outcome(style: &ReportStyle, outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Converted {
            input,
            output_size,
            attempts,
            quality_passes,
        } => {
            let mut detail = format!("{}", human_size(*output_size));
            if *attempts > 0 {
                detail.push_str(&format!(", {attempts} retries"));
            }
            if *quality_passes > 0 {
                detail.push_str(&format!(", {quality_passes} quality passes"));
            }
            println!("{} {} ({detail})", style.ok("done"), input.display());
        }
        FileOutcome::Remuxed { input, output_size } => {
            println!(
                "{} {} ({})",
                style.warn("remuxed"),
                input.display(),
                human_size(*output_size)
            );
        }
        FileOutcome::Skipped { input, reason } => {
            println!("{} {} ({reason})", style.dim("skipped"), input.display());
        }
        FileOutcome::Failed { input, reason } => {
            println!("{} {} ({reason})", style.err("failed"), input.display());
        }
        FileOutcome::Cancelled { input } => {
            println!("{} {}", style.err("cancelled"), input.display());
        }
    }
}

/// End-of-run totals.
pub fn print_summary(style: &ReportStyle, summary: &BatchSummary) {
    println!();
    println!(
        "{} converted, {} remuxed, {} skipped, {} failed",
        summary.converted, summary.remuxed, summary.skipped, summary.failed
    );
    if summary.cancelled > 0 {
        println!("{}", style.err(&format!("{} cancelled", summary.cancelled)));
    }
    if summary.input_bytes > 0 && summary.output_bytes > 0 {
        let pct = summary.output_bytes as f64 / summary.input_bytes as f64 * 100.0;
        println!(
            "{} in, {} out ({pct:.0}% of source)",
            human_size(summary.input_bytes),
            human_size(summary.output_bytes)
        );
    }
}
