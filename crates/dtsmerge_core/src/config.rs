use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use log::debug;
use path_clean::PathClean;
use regex::Regex;
use serde_json::Value;

use crate::{
    constants::{DEFAULT_INCLUDE, DEFAULT_MERGE_INTO},
    error::ConfigError,
    options::{MergeOptions, PathSpec, ReplaceOptions, ReplaceValue, has_glob_meta},
};

/// CLI surface shared by the merge and list subcommands.
#[derive(Debug, Clone, Parser)]
#[command(name = "merge")]
#[command(about = "Merge .d.ts files discovered under include paths into one declaration file")]
pub struct Config {
    /// Root directory of the project (defaults to the current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// JSON options file; other flags overlay its contents
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path or glob pattern to search for .d.ts files (repeatable)
    #[arg(short, long)]
    pub include: Vec<String>,

    /// Path or glob pattern to skip (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Destination declaration file
    #[arg(long)]
    pub merge_into: Option<String>,

    /// Replacement entry; VALUE is parsed as a JSON scalar, else taken
    /// verbatim (repeatable)
    #[arg(long = "set", value_name = "TOKEN=VALUE")]
    pub set: Vec<String>,

    /// Do not rewrite tokens in assignment or type-annotation position
    #[arg(long)]
    pub prevent_assignment: bool,

    /// Also run the replacer over the target's pre-existing content
    #[arg(long)]
    pub replace_target: bool,

    /// Treat a missing merge target as an error instead of a warning
    #[arg(long)]
    pub fail_on_missing_target: bool,
}

impl Config {
    /// Build the effective options: `--config` JSON first, flags overlaid.
    pub fn into_options(self) -> Result<MergeOptions, ConfigError> {
        let mut options = match &self.config {
            Some(path) => {
                debug!("Loading options file: {}", path.display());
                let text = fs::read_to_string(path)
                    .map_err(|source| ConfigError::OptionsIo { path: path.clone(), source })?;
                serde_json::from_str::<MergeOptions>(&text)?
            }
            None => MergeOptions::default(),
        };

        if let Some(root) = self.root {
            options.root = Some(root);
        }
        if !self.include.is_empty() {
            options.include = self.include.into_iter().map(PathSpec::Plain).collect();
        }
        if !self.exclude.is_empty() {
            options.exclude = self.exclude.into_iter().map(PathSpec::Plain).collect();
        }
        if let Some(target) = self.merge_into {
            options.merge_into = Some(PathSpec::Plain(target));
        }
        if self.prevent_assignment {
            options.replace.prevent_assignment = true;
        }
        if self.replace_target {
            options.replace_target = true;
        }
        if self.fail_on_missing_target {
            options.fail_on_missing_target = true;
        }

        for pair in self.set {
            let Some((key, raw)) = pair.split_once('=') else {
                return Err(ConfigError::InvalidSetPair { arg: pair });
            };
            let value = match serde_json::from_str::<Value>(raw) {
                Ok(json) => ReplaceValue::from_json(key, json)?,
                Err(_) => ReplaceValue::Str(raw.to_string()),
            };
            options.replace.values.insert(key.to_string(), value);
        }

        Ok(options)
    }
}

/// One normalized include entry.
#[derive(Debug, Clone)]
pub enum IncludeEntry {
    /// A literal file or directory path, used as a traversal root.
    Literal(PathBuf),
    /// A glob pattern; traversal starts at the pattern's literal prefix.
    Glob { raw: String, matcher: GlobMatcher, walk_root: PathBuf },
}

/// Exclusion rules checked during traversal. A matching directory prunes its
/// whole subtree.
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    root: PathBuf,
    literals: Vec<PathBuf>,
    globs: GlobSet,
}

impl ExcludeRules {
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.literals.iter().any(|lit| path.starts_with(lit)) {
            return true;
        }
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        self.globs.is_match(rel)
    }
}

/// Validated replace block carried by [`MergeConfig`].
#[derive(Debug, Clone, Default)]
pub struct ReplaceConfig {
    /// `[prefix, suffix]` fragments; `None` selects the word-boundary
    /// default with the trailing member-access guard.
    pub delimiters: Option<(String, String)>,
    pub prevent_assignment: bool,
    pub values: BTreeMap<String, ReplaceValue>,
}

/// Normalized, validated configuration. Built once per merger; never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub root: PathBuf,
    pub include: Vec<IncludeEntry>,
    pub exclude: ExcludeRules,
    pub merge_into: PathBuf,
    pub fail_on_missing_target: bool,
    pub replace_target: bool,
    pub replace: ReplaceConfig,
}

impl MergeConfig {
    pub fn from_options(options: MergeOptions) -> Result<Self, ConfigError> {
        let root = match options.root {
            Some(r) => r.canonicalize().unwrap_or(r),
            None => env::current_dir().map_err(ConfigError::NoWorkingDir)?,
        };
        debug!("Using root directory: {}", root.display());

        let include_specs = if options.include.is_empty() {
            vec![PathSpec::from(DEFAULT_INCLUDE)]
        } else {
            options.include
        };

        // Excludes first; the include loop needs the literal set for the
        // overlap check.
        let mut literal_excludes = Vec::new();
        let mut glob_builder = GlobSetBuilder::new();
        for spec in &options.exclude {
            if spec.is_glob() {
                let raw = spec.raw();
                let glob = Glob::new(&raw)
                    .map_err(|source| ConfigError::InvalidPattern { pattern: raw, source })?;
                glob_builder.add(glob);
            } else {
                literal_excludes.push(spec.join(&root));
            }
        }
        let globs = glob_builder.build().map_err(|source| ConfigError::InvalidPattern {
            pattern: "<exclude set>".to_string(),
            source,
        })?;

        let mut include = Vec::with_capacity(include_specs.len());
        for spec in include_specs {
            if spec.is_glob() {
                let raw = spec.raw();
                let matcher = Glob::new(&raw)
                    .map_err(|source| ConfigError::InvalidPattern { pattern: raw.clone(), source })?
                    .compile_matcher();
                let walk_root = glob_walk_root(&root, &raw);
                include.push(IncludeEntry::Glob { raw, matcher, walk_root });
            } else {
                let path = spec.join(&root);
                if literal_excludes.contains(&path) {
                    return Err(ConfigError::IncludeExcludeOverlap { path });
                }
                include.push(IncludeEntry::Literal(path));
            }
        }

        let merge_into = match options.merge_into {
            Some(spec) => spec.join(&root),
            None => DEFAULT_MERGE_INTO.iter().fold(root.clone(), |p, seg| p.join(seg)),
        };
        debug!("Merge target: {}", merge_into.display());

        let replace = normalize_replace(options.replace)?;

        Ok(MergeConfig {
            root: root.clone(),
            include,
            exclude: ExcludeRules { root, literals: literal_excludes, globs },
            merge_into,
            fail_on_missing_target: options.fail_on_missing_target,
            replace_target: options.replace_target,
            replace,
        })
    }
}

/// The longest pattern prefix free of glob metacharacters, joined onto root.
fn glob_walk_root(root: &Path, pattern: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for part in pattern.split('/') {
        if has_glob_meta(part) {
            break;
        }
        out.push(part);
    }
    out.clean()
}

fn normalize_replace(options: ReplaceOptions) -> Result<ReplaceConfig, ConfigError> {
    let delimiters = match options.delimiters {
        Some([prefix, suffix]) => {
            // Probe compile so bad fragments surface at setup, not mid-merge.
            let probe = format!("{prefix}(probe){suffix}");
            if let Err(err) = Regex::new(&probe) {
                return Err(ConfigError::InvalidDelimiters { detail: err.to_string() });
            }
            Some((prefix, suffix))
        }
        None => None,
    };
    Ok(ReplaceConfig {
        delimiters,
        prevent_assignment: options.prevent_assignment,
        values: options.values,
    })
}
