use std::{io, path::PathBuf};

use thiserror::Error;

/// Configuration failures, raised synchronously before any merge I/O happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The options JSON did not match the expected shape.
    #[error("invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("failed to read options file {}", path.display())]
    OptionsIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The same literal path appears in both `include` and `exclude`.
    #[error("path {} appears in both include and exclude", path.display())]
    IncludeExcludeOverlap { path: PathBuf },

    #[error("invalid glob pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid replace delimiters: {detail}")]
    InvalidDelimiters { detail: String },

    #[error("unsupported replacement type for key \"{key}\": {kind}")]
    UnsupportedValue { key: String, kind: &'static str },

    #[error("invalid --set argument '{arg}', expected TOKEN=VALUE")]
    InvalidSetPair { arg: String },

    #[error("could not determine the current working directory")]
    NoWorkingDir(#[source] io::Error),
}
