//! CLI entry point for batchform
//!
//! Parses command line arguments, prepares the batch of conversion jobs,
//! and drives it to completion.

use batchform::{
    check_ffmpeg_available, derive_pool_size, expand_inputs, init_logging, new_cancel_flag,
    run_status_server, spawn_system_metrics_updater, CompletionWatcher, Job, Scheduler, Settings,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, warn};

/// batchform - admission-controlled batch file conversion with FFmpeg
#[derive(Parser, Debug)]
#[command(name = "batchform")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files or directories to convert
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Preset to convert with (see --list-presets)
    #[arg(short, long)]
    preset: Option<String>,

    /// Path to the settings file (settings.toml)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Maximum concurrent conversions (0 = one per logical CPU)
    #[arg(short, long, default_value = "0")]
    jobs: u32,

    /// Log batchform internals at debug level
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// List the available presets and exit
    #[arg(long, default_value = "false")]
    list_presets: bool,

    /// Skip the FFmpeg availability check. For testing only.
    #[arg(long, default_value = "false")]
    skip_checks: bool,

    /// Keep the process alive after the batch finishes
    #[arg(long, default_value = "false")]
    no_exit: bool,

    /// Serve batch status on http://127.0.0.1:<port>/status
    #[arg(long, default_value = "false")]
    status_server: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose);

    let settings = match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                error!("failed to load settings: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut settings = Settings::default();
            settings.apply_env_overrides();
            settings
        }
    };

    if args.list_presets {
        println!(
            "{:<16} {:<8} {:<28} {}",
            "NAME", "OUTPUT", "INPUTS", "EXCLUSIVE"
        );
        for preset in &settings.presets {
            let inputs = if preset.input_extensions.is_empty() {
                "any".to_string()
            } else {
                preset.input_extensions.join(",")
            };
            let exclusive = if preset.exclusive.is_empty() {
                "-".to_string()
            } else {
                preset.exclusive.join(",")
            };
            println!(
                "{:<16} {:<8} {:<28} {}",
                preset.name, preset.output_extension, inputs, exclusive
            );
        }
        return ExitCode::SUCCESS;
    }

    let preset_name = match &args.preset {
        Some(name) => name.clone(),
        None => {
            error!("no preset given; use --preset (see --list-presets)");
            return ExitCode::FAILURE;
        }
    };

    let preset = match settings.preset(&preset_name) {
        Some(preset) => preset.clone(),
        None => {
            let available: Vec<&str> = settings.presets.iter().map(|p| p.name.as_str()).collect();
            error!(
                preset = %preset_name,
                available = %available.join(", "),
                "unknown preset"
            );
            return ExitCode::FAILURE;
        }
    };

    if args.skip_checks {
        warn!("skipping FFmpeg availability check (--skip-checks enabled)");
    } else {
        match check_ffmpeg_available() {
            Ok(version) => info!(version = %version, "FFmpeg detected"),
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if args.paths.is_empty() {
        error!("no input paths given");
        return ExitCode::FAILURE;
    }

    let inputs = expand_inputs(&args.paths, &preset);
    if inputs.is_empty() {
        error!(preset = %preset.name, "no candidate input files found");
        return ExitCode::FAILURE;
    }

    let mut jobs = Vec::new();
    for input in &inputs {
        match Job::prepare(&preset, input) {
            Ok(job) => jobs.push(job),
            Err(e) => error!(input = %input.display(), "skipping input: {}", e),
        }
    }

    if jobs.is_empty() {
        error!("no jobs could be prepared");
        return ExitCode::FAILURE;
    }

    let configured = if args.jobs > 0 {
        args.jobs
    } else {
        settings.conversion.max_concurrent_jobs
    };
    let pool_size = derive_pool_size(configured);

    info!(
        jobs = jobs.len(),
        workers = pool_size,
        preset = %preset.name,
        "starting batch"
    );

    let scheduler = Scheduler::new(jobs, pool_size);
    let view = scheduler.view();

    let mut server_handle = None;
    if args.status_server || settings.status.enabled {
        spawn_system_metrics_updater(view.clone());
        let port = settings.status.port;
        let status_view = view.clone();
        server_handle = Some(tokio::spawn(async move {
            if let Err(e) = run_status_server(status_view, port).await {
                error!("status server error: {}", e);
            }
        }));
    }

    let summary = scheduler.run().await;

    println!(
        "{} of {} conversions succeeded, {} failed",
        summary.done, summary.total, summary.failed
    );

    if settings.exit.exit_when_done && !args.no_exit {
        // Ctrl-C during the grace period keeps the process alive
        let cancel = new_cancel_flag();
        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.store(true, Ordering::SeqCst);
                }
            });
        }

        let delay = Duration::from_secs_f32(settings.exit.exit_delay_secs.max(0.0).min(86_400.0));
        let watcher = CompletionWatcher::new(delay, cancel);
        let fired = watcher.run(summary, || info!("exiting")).await;
        if fired {
            return ExitCode::SUCCESS;
        }
    }

    // Auto-exit is off, was cancelled, or the batch had failures
    if let Some(handle) = server_handle {
        info!("status server still running, press Ctrl-C to quit");
        tokio::select! {
            _ = handle => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
            }
        }
    }

    if summary.all_done() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
