use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dtsmerge_core::Config;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "dtsmerge")]
#[command(about = "Merge TypeScript declaration files into a single bundle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge discovered .d.ts files into the target declaration file
    Merge(Config),
    /// Print the declaration files the configuration resolves, without merging
    List(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Merge(cfg) => {
            let options = cfg.into_options()?;
            let merger = dtsmerge_core::dts_merger(options)?;
            info!(
                "Running {} against {}",
                merger.name(),
                merger.config().merge_into.display()
            );

            let report = merger.write_bundle()?;
            debug!("Merged {} files", report.entries.len());

            dtsmerge_core::print_merge_summary(&mut stdout, &report)?;

            let elapsed_ms = start.elapsed().as_millis();
            writeln!(
                stdout,
                "\n{} Finished in {}ms on {} files.",
                "●".bright_blue(),
                elapsed_ms.to_string().cyan(),
                report.entries.len().to_string().cyan()
            )?;
            stdout.flush()?;
        }
        Commands::List(cfg) => {
            let options = cfg.into_options()?;
            let merger = dtsmerge_core::dts_merger(options)?;
            let resolution = dtsmerge_core::resolve_files(merger.config())?;
            debug!("Resolved {} files", resolution.files.len());

            dtsmerge_core::print_resolved_files(
                &mut stdout,
                &resolution.files,
                &merger.config().root,
                &resolution.missing,
            )?;

            let elapsed_ms = start.elapsed().as_millis();
            writeln!(
                stdout,
                "\n{} Finished in {}ms.",
                "●".bright_blue(),
                elapsed_ms.to_string().cyan()
            )?;
            stdout.flush()?;
        }
    }

    Ok(())
}
