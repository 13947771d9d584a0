//! Multi-file analysis
//!
//! A directory argument expands to every regular file below it. Files are
//! analyzed in parallel; results come back in input order.

use crate::analyzer::{Analyzer, Report};
use crate::error::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// `path` itself if it is not a directory, else every file below it (sorted)
///
/// A missing path is returned as-is so that analyzing it reports NotFound.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

/// Analyze every file, calling `progress` as each one finishes
pub fn analyze_all<F>(analyzer: &Analyzer, files: &[PathBuf], progress: F) -> Vec<Result<Report>>
where
    F: Fn(&Path) + Sync,
{
    files
        .par_iter()
        .map(|path| {
            let result = analyzer.analyze(path);
            progress(path);
            result
        })
        .collect()
}
