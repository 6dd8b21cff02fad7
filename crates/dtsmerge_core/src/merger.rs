use std::{
    borrow::Cow,
    fs::{self, OpenOptions},
    io::Write,
};

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};

use crate::{
    config::MergeConfig,
    error::ConfigError,
    options::MergeOptions,
    replacer::Replacer,
    resolver::resolve_files,
    types::{MergeReport, MergedFile},
};

/// Plugin name reported by [`DtsMerger::name`].
pub const PLUGIN_NAME: &str = "dtsmerge";

/// Build a merger from deep-partial options. The configuration is normalized
/// and validated here, once; every shape error surfaces before any file I/O.
pub fn dts_merger(options: MergeOptions) -> Result<DtsMerger, ConfigError> {
    let config = MergeConfig::from_options(options)?;
    Ok(DtsMerger { config })
}

/// The merge orchestrator, shaped as a build-plugin descriptor: a name plus
/// a single hook run once per build after the bundle has been written.
pub struct DtsMerger {
    config: MergeConfig,
}

impl DtsMerger {
    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// The "after bundle write" hook: resolve the file list, run the
    /// replacer, append each file to the merge target in resolution order.
    pub fn write_bundle(&self) -> Result<MergeReport> {
        let cfg = &self.config;
        info!("Merging declaration files into {}", cfg.merge_into.display());

        if !cfg.merge_into.exists() {
            if cfg.fail_on_missing_target {
                return Err(anyhow!("merge target {} does not exist", cfg.merge_into.display()));
            }
            warn!("{}: {} does not exist, skipping", PLUGIN_NAME, cfg.merge_into.display());
            return Ok(MergeReport {
                target: cfg.merge_into.clone(),
                target_existed: false,
                target_rewritten: false,
                entries: Vec::new(),
                total_bytes: 0,
                missing: Vec::new(),
            });
        }

        let replacer = Replacer::compile(&cfg.replace)?;
        let resolution = resolve_files(cfg)?;
        if !resolution.missing.is_empty() {
            let listing = resolution
                .missing
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n");
            warn!("{}: the following include paths do not exist:\n{}", PLUGIN_NAME, listing);
        }

        let mut target_rewritten = false;
        if cfg.replace_target {
            debug!("Applying replacements to pre-existing target content");
            let existing = fs::read_to_string(&cfg.merge_into)
                .with_context(|| format!("failed to read {}", cfg.merge_into.display()))?;
            if let Cow::Owned(rewritten) = replacer.apply(&existing) {
                fs::write(&cfg.merge_into, rewritten.as_bytes())
                    .with_context(|| format!("failed to write {}", cfg.merge_into.display()))?;
                target_rewritten = true;
            }
        }

        let mut out = OpenOptions::new()
            .append(true)
            .open(&cfg.merge_into)
            .with_context(|| format!("failed to open {} for append", cfg.merge_into.display()))?;

        let mut entries = Vec::with_capacity(resolution.files.len());
        let mut total_bytes = 0usize;
        for file in &resolution.files {
            let rel = pathdiff::diff_paths(file, &cfg.root)
                .unwrap_or_else(|| file.clone())
                .to_string_lossy()
                .into_owned();
            let content = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let replaced = replacer.apply(&content);
            let block = format!("\n// # from: {rel}\n{replaced}");
            out.write_all(block.as_bytes())
                .with_context(|| format!("failed to append to {}", cfg.merge_into.display()))?;
            debug!("Appended {} ({} bytes)", rel, block.len());
            total_bytes += block.len();
            entries.push(MergedFile { path: rel, bytes: block.len() });
        }

        info!("Merged {} declaration files ({} bytes appended)", entries.len(), total_bytes);
        Ok(MergeReport {
            target: cfg.merge_into.clone(),
            target_existed: true,
            target_rewritten,
            entries,
            total_bytes,
            missing: resolution.missing,
        })
    }
}
