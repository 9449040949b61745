mod cli;
mod logging;
mod progress;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use dotenv::dotenv;
use logging::LogTarget;
use progress::CliReporter;
use sd_offload_core::{ExifExtractor, OffloadConfig, OffloadEngine, RunSummary};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Cli::parse();

    let config = sd_offload_core::config::load_configuration(
        args.options.config.as_deref(),
        &args.options.overrides(),
    )
    .context("Error loading configuration")?;

    let _guard = logging::init_logger(&LogTarget {
        file: args.options.log_file.clone(),
        dry_run: config.dry_run,
    });

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => run_offload(config),
        Commands::PrintConfig => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        Commands::CleanSidecars { dir, no_recursive } => {
            let engine = OffloadEngine::new(config);
            let summary = engine
                .clean_sidecars(&dir, !no_recursive)
                .with_context(|| format!("Error cleaning sidecars in {}", dir.display()))?;
            info!(
                "{} zombie sidecar files removed",
                format!("{}", summary.deleted_sidecars).red(),
            );
            report_errors(&summary)
        }
    }
}

fn run_offload(config: OffloadConfig) -> anyhow::Result<()> {
    info!(
        "Offloading {} -> {}",
        config.source_dir.display(),
        config.destination_dir.display()
    );

    let engine = OffloadEngine::new(config);
    let reporter = CliReporter::new();
    let summary = engine
        .run(&ExifExtractor, &reporter)
        .context("Error offloading SD card")?;

    println!();
    info!(
        "Summary: {} copied, {} skipped, {} without capture date, {} removed ({} from source, {} zombie sidecars)",
        format!("{}", summary.copied).green(),
        format!("{}", summary.skipped).yellow(),
        format!("{}", summary.undated).yellow(),
        format!("{}", summary.removed()).red(),
        summary.removed_sources,
        summary.deleted_sidecars,
    );

    report_errors(&summary)
}

fn report_errors(summary: &RunSummary) -> anyhow::Result<()> {
    if summary.errors.is_empty() {
        return Ok(());
    }

    for failure in summary.errors.iter() {
        error!("{}", failure);
    }
    bail!(
        "{} operations failed; affected files remain on the source",
        summary.errors.len()
    )
}
