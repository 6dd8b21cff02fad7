use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::Result;
use globset::GlobMatcher;
use ignore::WalkBuilder;
use log::{debug, trace};

use crate::{
    config::{ExcludeRules, IncludeEntry, MergeConfig},
    constants::DECLARATION_SUFFIX,
    types::FileResolution,
};

/// Expand the configured include entries into the ordered list of `.d.ts`
/// files to merge.
///
/// Order is discovery order: include entries in the order given, directory
/// entries in lexicographic filename order, so the same tree resolves the
/// same way on every platform. Include roots that do not exist land in
/// `missing` instead of failing the run.
pub fn resolve_files(cfg: &MergeConfig) -> Result<FileResolution> {
    debug!("Resolving declaration files under {}", cfg.root.display());
    let mut files: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut missing: Vec<PathBuf> = Vec::new();

    for entry in &cfg.include {
        match entry {
            IncludeEntry::Literal(path) => {
                if !path.exists() {
                    trace!("Include path does not exist: {}", path.display());
                    missing.push(path.clone());
                    continue;
                }
                if path.is_file() {
                    // An explicit file include bypasses traversal; only the
                    // exclude test applies.
                    if is_declaration(path)
                        && !cfg.exclude.is_excluded(path)
                        && seen.insert(path.clone())
                    {
                        trace!("Resolved explicit file include: {}", path.display());
                        files.push(path.clone());
                    }
                } else {
                    walk(path, None, &cfg.exclude, &mut files, &mut seen)?;
                }
            }
            IncludeEntry::Glob { raw, matcher, walk_root } => {
                if !walk_root.exists() {
                    trace!("Walk root for pattern '{}' does not exist: {}", raw, walk_root.display());
                    // Report the pattern as configured, not the derived root.
                    missing.push(PathBuf::from(raw));
                    continue;
                }
                walk(walk_root, Some((matcher, &cfg.root)), &cfg.exclude, &mut files, &mut seen)?;
            }
        }
    }

    debug!("Resolved {} declaration files ({} missing include roots)", files.len(), missing.len());
    Ok(FileResolution { files, missing })
}

fn is_declaration(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(DECLARATION_SUFFIX))
}

fn walk(
    start: &Path,
    matcher: Option<(&GlobMatcher, &Path)>,
    exclude: &ExcludeRules,
    files: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
) -> Result<()> {
    trace!("Walking directory tree from {}", start.display());
    let rules = exclude.clone();
    let walker = WalkBuilder::new(start)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| !rules.is_excluded(entry.path()))
        .build();

    for result in walker {
        let entry = result?;
        let path = entry.path();
        if !path.is_file() || !is_declaration(path) {
            continue;
        }
        if let Some((glob, root)) = matcher {
            let rel = path.strip_prefix(root).unwrap_or(path);
            if !glob.is_match(rel) {
                trace!("Skipping file outside include pattern: {}", path.display());
                continue;
            }
        }
        if seen.insert(path.to_path_buf()) {
            trace!("Found declaration file: {}", path.display());
            files.push(path.to_path_buf());
        }
    }
    Ok(())
}
