//! CLI run handler: resolve settings (defaults < config file < flags), run one pipeline, print the result.

use anyhow::{Context, Result};
use kdam::Animation;
use log::{debug, info, warn};
use std::path::Path;
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{ProgressBarConfig, create_progress_bar, spawn_progress_listener};
use crate::pipeline::Orchestrator;
use crate::utils::config::{DemoDefaults, WorkerLimits};
use crate::utils::{apply_file_to_settings, config_path, load_handoff_toml, setup_logging};
use crate::{PipelineOpts, RunReport, WorkItem};

/// Everything the CLI needs for one run.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub opts: PipelineOpts,
    pub items: usize,
    pub verbose: bool,
    pub json: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            opts: PipelineOpts {
                queue_capacity: DemoDefaults::CAPACITY,
                ..PipelineOpts::default()
            },
            items: DemoDefaults::ITEMS,
            verbose: false,
            json: false,
        }
    }
}

/// Overwrite a settings field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $target:expr, $cli_field:ident => $target_field:ident as millis) => {
        if let Some(ms) = $cli.$cli_field {
            $target.$target_field = Duration::from_millis(ms);
        }
    };
    ($cli:expr, $target:expr, $cli_field:ident => $target_field:ident) => {
        if let Some(v) = $cli.$cli_field {
            $target.$target_field = v;
        }
    };
}

/// Apply CLI flags on top of `settings` (only flags that were passed).
pub fn apply_cli_to_settings(cli: &Cli, settings: &mut RunSettings) {
    apply_cli_opt!(cli, settings, items => items);
    apply_cli_opt!(cli, settings, verbose => verbose);
    apply_cli_opt!(cli, settings, json => json);
    let opts = &mut settings.opts;
    apply_cli_opt!(cli, opts, capacity => queue_capacity);
    apply_cli_opt!(cli, opts, producers => num_producers);
    apply_cli_opt!(cli, opts, consumers => num_consumers);
    apply_cli_opt!(cli, opts, production_delay_ms => production_delay as millis);
    apply_cli_opt!(cli, opts, consumption_delay_ms => consumption_delay as millis);
    apply_cli_opt!(cli, opts, put_timeout_ms => put_timeout as millis);
    apply_cli_opt!(cli, opts, get_timeout_ms => get_timeout as millis);
}

/// Build settings from defaults, the config file found from `dir`, then `cli`.
/// A config file that fails to load is returned as the second value so the caller can log it once logging is up.
pub fn resolve_settings(cli: &Cli, dir: &Path) -> (RunSettings, Option<anyhow::Error>) {
    let mut settings = RunSettings::default();
    let path = config_path(cli.config.as_deref(), dir);
    let file_error = match load_handoff_toml(&path) {
        Ok(Some(file)) => {
            apply_file_to_settings(&file, &mut settings);
            None
        }
        Ok(None) => None,
        Err(e) => Some(e),
    };
    apply_cli_to_settings(cli, &mut settings);
    (settings, file_error)
}

/// Keep worker counts within [`WorkerLimits`]; warn when a request is reduced.
pub fn clamp_worker_counts(opts: &mut PipelineOpts, limits: &WorkerLimits) {
    for (label, count) in [
        ("producers", &mut opts.num_producers),
        ("consumers", &mut opts.num_consumers),
    ] {
        let clamped = limits.clamp(*count);
        if clamped != *count {
            warn!("Requested {} {}, using {}", *count, label, clamped);
            *count = clamped;
        }
    }
}

/// Demo input: `count` items with payloads `payload-0..`.
pub fn demo_items(count: usize) -> Vec<WorkItem<String>> {
    (0..count as u64)
        .map(|i| WorkItem::new(i, format!("payload-{i}")))
        .collect()
}

fn print_report(report: &RunReport<String>, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report).context("serialize run report")?;
        println!("{}", out);
        return Ok(());
    }
    println!("Items transferred: {}", report.items.len());
    println!("Final destination contents:");
    for item in &report.items {
        println!("  {}", item);
    }
    if !report.restored.is_empty() {
        println!("Left in source: {}", report.restored.len());
    }
    Ok(())
}

/// Run the demo pipeline once with settings from file and flags.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let _ = dotenvy::dotenv();
    let cwd = std::env::current_dir().context("read current directory")?;
    let (mut settings, file_error) = resolve_settings(cli, &cwd);
    setup_logging(settings.verbose);
    if let Some(e) = file_error {
        warn!("Ignoring config file: {:#}", e);
    }
    clamp_worker_counts(&mut settings.opts, &WorkerLimits::current());
    debug!("{} CONFIG:{:#?}", env!("CARGO_PKG_NAME").to_uppercase(), settings);

    let mut orchestrator = Orchestrator::new(demo_items(settings.items), &settings.opts)?;

    let control = orchestrator.control();
    ctrlc::set_handler(move || control.stop()).context("set Ctrl+C handler")?;
    let control = orchestrator.control();

    let listener = settings.verbose.then(|| {
        let bar = create_progress_bar(ProgressBarConfig::new(
            settings.items,
            "Consuming",
            Animation::Classic,
        ));
        spawn_progress_listener(bar, orchestrator.subscribe())
    });

    let report = orchestrator.run()?;
    if let Some(listener) = listener {
        let seen = listener
            .join()
            .map_err(|_| anyhow::anyhow!("progress thread panicked"))?;
        debug!("progress listener saw {} consumed items", seen);
    }

    print_report(&report, settings.json)?;
    info!(
        "Produced {}, consumed {}, {} workers",
        report.produced,
        report.consumed,
        report.workers.len()
    );

    if control.is_stopped() {
        return Err(anyhow::anyhow!(
            "Run cancelled by user; {} items left in source",
            report.restored.len()
        ));
    }
    Ok(())
}
