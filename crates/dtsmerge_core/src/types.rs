use std::path::PathBuf;

/// Output of [`resolve_files`](crate::resolve_files): the ordered file list
/// plus the include entries that were not found on disk (literal paths as
/// joined onto the root, glob entries as configured).
#[derive(Debug, Clone, Default)]
pub struct FileResolution {
    pub files: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// One appended block in the merge report.
#[derive(Debug, Clone)]
pub struct MergedFile {
    /// Source path relative to the project root, as written in the marker.
    pub path: String,
    /// Bytes appended for this file, marker line included.
    pub bytes: usize,
}

/// Result of one merge run.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub target: PathBuf,
    pub target_existed: bool,
    pub target_rewritten: bool,
    pub entries: Vec<MergedFile>,
    pub total_bytes: usize,
    pub missing: Vec<PathBuf>,
}
