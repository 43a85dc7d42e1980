mod cli;
mod processor;
mod report;

use std::io::IsTerminal;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use processor::BatchProcessor;
use report::ReportStyle;
use tm_av::ToolRegistry;
use tm_core::config::Config;
use tm_plan::build_plan;
use tm_probe::probe_file;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "transmog=trace,tm_core=debug,tm_av=debug,tm_probe=debug,tm_plan=debug,tm_engine=trace"
                .to_string()
        } else {
            "transmog=info,tm_engine=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let style = ReportStyle::new(!cli.no_color && std::io::stdout().is_terminal());

    match cli.command {
        Commands::Run {
            input,
            output,
            dry_run,
        } => run_batch(&input, &output, dry_run, cli.config.as_deref(), style).await,
        Commands::Plan { file, output, json } => {
            plan_file(&file, &output, json, cli.config.as_deref(), style).await
        }
        Commands::Probe { file, json } => probe_one(&file, json, cli.config.as_deref()).await,
        Commands::CheckTools => check_tools(cli.config.as_deref(), style),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref(), style)
        }
        Commands::Version => {
            println!("transmog {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>, style: &ReportStyle) -> Config {
    let config = Config::load_or_default(path);
    for warning in config.validate() {
        eprintln!("{} {warning}", style.warn("warning:"));
    }
    config
}

/// Cancel the token on the first Ctrl-C; a second Ctrl-C kills the process.
fn install_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupted; finishing cleanup (Ctrl-C again to force quit)");
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
}

async fn run_batch(
    input: &Path,
    output: &Path,
    dry_run: bool,
    config_path: Option<&Path>,
    style: ReportStyle,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("input does not exist: {}", input.display());
    }

    let config = load_config(config_path, &style);
    let registry = ToolRegistry::discover(&config.tools);
    let ffprobe_missing = registry.require("ffprobe").is_err();
    if ffprobe_missing {
        anyhow::bail!("ffprobe not found; run `transmog check-tools`");
    }

    if dry_run {
        for file in processor::discover(input) {
            match probe_file(&registry, &file).await {
                Ok(info) if info.video.is_some() => {
                    let stem = file
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "output".into());
                    let out = output.join(format!("{stem}.{}", config.output.container.extension()));
                    match build_plan(&info, &config, &out) {
                        Ok(plan) => report::print_plan(&style, &plan),
                        Err(e) => eprintln!("{} {}: {e}", style.err("error:"), file.display()),
                    }
                }
                Ok(_) => println!("{} {} (no video stream)", style.dim("skipped"), file.display()),
                Err(e) => eprintln!("{} {}: {e}", style.err("error:"), file.display()),
            }
        }
        return Ok(());
    }

    let ffmpeg = registry.require("ffmpeg")?.to_path_buf();
    let cancel = CancellationToken::new();
    install_ctrl_c(cancel.clone());

    let batch = BatchProcessor::new(config, ffmpeg, style, cancel);
    let summary = batch.run(input, output).await?;
    report::print_summary(&style, &summary);

    if summary.failed > 0 {
        anyhow::bail!("{} file(s) failed", summary.failed);
    }
    Ok(())
}

async fn plan_file(
    file: &Path,
    output: &Path,
    json: bool,
    config_path: Option<&Path>,
    style: ReportStyle,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("file does not exist: {}", file.display());
    }

    let config = load_config(config_path, &style);
    let registry = ToolRegistry::discover(&config.tools);
    let info = probe_file(&registry, file).await?;

    if info.video.is_none() {
        anyhow::bail!("{}: no video stream; nothing to plan", file.display());
    }

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let out = output.join(format!("{stem}.{}", config.output.container.extension()));
    let plan = build_plan(&info, &config, &out)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        report::print_plan(&style, &plan);
        if let (Some(video), Some(kbps)) = (&info.video, info.source_bitrate_kbps()) {
            let estimate = tm_plan::estimate_bitrate(
                config.output.encoder,
                plan.quality.for_mode(config.output.encoder),
                kbps,
                &video.codec,
                video.pixels(),
            );
            println!(
                "  size:    {:.0}-{:.0}% of source ({}-{} kbps)",
                estimate.low_pct, estimate.high_pct, estimate.low_kbps, estimate.high_kbps
            );
        }
    }

    Ok(())
}

async fn probe_one(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("file does not exist: {}", file.display());
    }

    let config = Config::load_or_default(config_path);
    let registry = ToolRegistry::discover(&config.tools);
    let info = probe_file(&registry, file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", info.path.display());
    println!("Size: {} bytes", info.file_size);
    if let Some(duration) = info.duration_secs {
        let secs = duration as u64;
        println!("Duration: {:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
    }
    if let Some(kbps) = info.bitrate_kbps {
        println!("Bitrate: {kbps} kbps");
    }

    match &info.video {
        Some(v) => {
            print!("\nVideo: {} {}x{}", v.codec, v.width, v.height);
            if let Some(profile) = &v.profile {
                print!(" ({profile})");
            }
            println!();
            if let Some(pix_fmt) = &v.pix_fmt {
                println!("  pix_fmt: {pix_fmt}");
            }
            if v.interlaced() {
                println!("  interlaced");
            }
            if v.is_hdr() {
                println!("  HDR: {}", v.color_transfer.as_deref().unwrap_or("unknown"));
            }
        }
        None => println!("\nVideo: none"),
    }

    println!("\nAudio streams: {}", info.audio_streams.len());
    for (i, a) in info.audio_streams.iter().enumerate() {
        print!("  [{i}] {} {}ch", a.codec, a.channels);
        if let Some(kbps) = a.bitrate_kbps {
            print!(" {kbps} kbps");
        }
        if let Some(lang) = &a.language {
            print!(" ({lang})");
        }
        if a.default {
            print!(" [default]");
        }
        println!();
    }

    println!("\nSubtitle streams: {}", info.subtitle_streams.len());
    for (i, s) in info.subtitle_streams.iter().enumerate() {
        println!(
            "  [{i}] {}{}",
            s.codec,
            if s.bitmap { " [bitmap]" } else { "" }
        );
    }

    if info.attachment_count > 0 {
        println!("\nAttachments: {}", info.attachment_count);
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>, style: ReportStyle) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path);
    let registry = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in registry.check_all() {
        let status = if tool.available {
            style.ok("found")
        } else {
            all_ok = false;
            style.err("missing")
        };
        print!("{status} {}", tool.name);
        if let Some(version) = &tool.version {
            print!(" ({version})");
        }
        if let Some(path) = &tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available.");
        Ok(())
    } else {
        anyhow::bail!("some tools are missing");
    }
}

fn validate_config(path: Option<&Path>, style: ReportStyle) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let contents = std::fs::read_to_string(p)?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, validating defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    for warning in &warnings {
        println!("{} {warning}", style.warn("warning:"));
    }
    if warnings.is_empty() {
        println!("{} configuration is valid", style.ok("ok:"));
    }

    println!("  container: {}", config.output.container);
    println!("  encoder:   {}", config.output.encoder);
    println!("  hdr:       {}", config.output.hdr);
    println!(
        "  quality:   cq {} / crf {} (smart: {})",
        config.quality.nvenc_default, config.quality.x265_default, config.quality.smart
    );
    println!(
        "  audio:     {}ch aac {}k @ {} Hz",
        config.audio.channels, config.audio.bitrate_kbps, config.audio.sample_rate
    );

    Ok(())
}
