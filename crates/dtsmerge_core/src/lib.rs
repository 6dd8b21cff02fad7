//! Merge TypeScript declaration files into a single bundle.
//!
//! This crate implements the `dtsmerge` build step: it walks configurable
//! include/exclude paths for `.d.ts` files, optionally rewrites configured
//! tokens in their text, and appends each file to a single target
//! declaration file after the bundle has been written.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use dtsmerge_core::{MergeOptions, ReplaceValue, dts_merger};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut options = MergeOptions {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     ..Default::default()
//! };
//! options.replace.values.insert("__VERSION__".to_string(), ReplaceValue::from("1.2.3"));
//!
//! let merger = dts_merger(options)?;
//! let report = merger.write_bundle()?;
//!
//! // Use buffered output for better performance
//! let mut stdout = BufWriter::new(std::io::stdout());
//! dtsmerge_core::print_merge_summary(&mut stdout, &report)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod constants;
mod error;
mod merger;
mod options;
mod replacer;
mod reporter;
mod resolver;
mod types;

// Re-export public API
pub use config::{Config, ExcludeRules, IncludeEntry, MergeConfig, ReplaceConfig};
pub use constants::{DECLARATION_SUFFIX, DEFAULT_INCLUDE, DEFAULT_MERGE_INTO};
pub use error::ConfigError;
pub use merger::{DtsMerger, PLUGIN_NAME, dts_merger};
pub use options::{MergeOptions, PathSpec, ReplaceOptions, ReplaceValue};
pub use replacer::Replacer;
pub use reporter::{print_merge_summary, print_resolved_files};
pub use resolver::resolve_files;
pub use types::{FileResolution, MergeReport, MergedFile};
