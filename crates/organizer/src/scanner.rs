use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    /// Directories skipped whole, matched by trailing path components
    /// (so `node_modules` excludes every directory with that name).
    pub exclude: Vec<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            include_hidden: false,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub size: u64,
}

impl ScannedFile {
    pub fn filename(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Enumeration result: candidate files for classification plus the
/// folders that were skipped whole (surfaced in previews, never
/// recursed into).
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub files: Vec<ScannedFile>,
    pub ignored_dirs: Vec<PathBuf>,
}

impl Scan {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

/// Walk the input directory collecting candidate files and ignored
/// folders. Hidden and excluded entries are skipped; a skipped
/// directory is recorded rather than silently dropped. Entries that
/// error mid-walk (e.g. a permission-denied subtree) are skipped too,
/// so one bad subtree never aborts the scan.
pub fn collect_paths(input: &Path, options: &ScanOptions) -> anyhow::Result<Scan> {
    // A missing or unreadable root is still an error.
    std::fs::metadata(input)?;

    let walker = match options.recursive {
        true => WalkDir::new(input),
        false => WalkDir::new(input).max_depth(1),
    };

    let mut paths = Vec::new();
    let mut ignored_dirs = Vec::new();

    let mut it = walker.into_iter();
    while let Some(entry) = it.next() {
        let Ok(entry) = entry else { continue };
        let path = entry.path();

        if entry.file_type().is_dir() {
            if entry.depth() > 0
                && (is_excluded(path, &options.exclude)
                    || (!options.include_hidden && is_hidden(path)))
            {
                ignored_dirs.push(path.to_path_buf());
                it.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_file() && (options.include_hidden || !is_hidden(path)) {
            paths.push(path.to_path_buf());
        }
    }

    let files = paths
        .par_iter()
        .filter_map(|p| stat_file(p).ok())
        .collect();

    Ok(Scan {
        files,
        ignored_dirs,
    })
}

fn stat_file(path: &Path) -> anyhow::Result<ScannedFile> {
    let metadata = std::fs::metadata(path)?;
    Ok(ScannedFile {
        path: path.to_path_buf(),
        size: metadata.len(),
    })
}

fn is_excluded(path: &Path, exclude: &[PathBuf]) -> bool {
    exclude.iter().any(|ex| path.ends_with(ex))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: &[(u64, &str)] = &[
        (1024 * 1024 * 1024, "GB"),
        (1024 * 1024, "MB"),
        (1024, "KB"),
    ];

    UNITS
        .iter()
        .find(|(threshold, _)| bytes >= *threshold)
        .map(|(threshold, unit)| format!("{:.2} {}", bytes as f64 / *threshold as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}
