/// Suffix identifying declaration files.
pub const DECLARATION_SUFFIX: &str = ".d.ts";

/// Include entry used when none are configured.
pub const DEFAULT_INCLUDE: &str = "src";

/// Default merge target, joined onto the project root.
pub const DEFAULT_MERGE_INTO: &[&str] = &["dist", "index.d.ts"];
