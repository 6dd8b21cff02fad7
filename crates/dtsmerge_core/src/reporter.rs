use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use colored::Colorize;
use log::debug;

use crate::types::MergeReport;

/// Print the outcome of a merge run: warnings first, then one line per
/// appended file and a closing summary.
pub fn print_merge_summary<W: Write>(writer: &mut W, report: &MergeReport) -> io::Result<()> {
    debug!("Printing merge summary for {} entries", report.entries.len());
    print_missing(writer, &report.missing)?;

    if !report.target_existed {
        writeln!(
            writer,
            "{} Merge target {} does not exist, nothing merged.",
            "⚠".yellow().bold(),
            report.target.display().to_string().yellow()
        )?;
        writer.flush()?;
        return Ok(());
    }

    if report.target_rewritten {
        writeln!(
            writer,
            "{} Rewrote existing content of {}",
            "✓".green().bold(),
            report.target.display()
        )?;
    }

    for entry in &report.entries {
        writeln!(
            writer,
            "{} {} {}",
            "✓".green().bold(),
            entry.path,
            format!("({} bytes)", entry.bytes).dimmed()
        )?;
    }

    if report.entries.is_empty() {
        writeln!(writer, "{} No declaration files found to merge.", "⚠".yellow().bold())?;
    } else {
        writeln!(
            writer,
            "\nMerged {} declaration files into {} ({} bytes appended).",
            report.entries.len().to_string().cyan(),
            report.target.display().to_string().bold(),
            report.total_bytes.to_string().cyan()
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Print the resolved file list, one root-relative path per line.
pub fn print_resolved_files<W: Write>(
    writer: &mut W,
    files: &[PathBuf],
    root: &Path,
    missing: &[PathBuf],
) -> io::Result<()> {
    print_missing(writer, missing)?;

    for file in files {
        let rel = pathdiff::diff_paths(file, root).unwrap_or_else(|| file.clone());
        writeln!(writer, "{}", rel.display())?;
    }
    writeln!(writer, "\n{} file(s) resolved.", files.len().to_string().cyan())?;

    writer.flush()?;
    Ok(())
}

fn print_missing<W: Write>(writer: &mut W, missing: &[PathBuf]) -> io::Result<()> {
    for path in missing {
        writeln!(
            writer,
            "{} Include path does not exist: {}",
            "⚠".yellow().bold(),
            path.display().to_string().yellow()
        )?;
    }
    Ok(())
}
