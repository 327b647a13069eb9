//! Run-directory creation and naming.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};

use crate::error::{Error, Result};
use crate::scan::RUN_DIR_PREFIX;

/// The bookkeeping regions of a freshly created run directory.
#[derive(Debug)]
pub struct RunDirs {
    pub root: PathBuf,
    /// Generated manifests, one per chunk.
    pub csvs: PathBuf,
    /// Recorded launch scripts.
    pub jobs: PathBuf,
    /// Worker stdout/stderr captures; only ever written by the workers.
    pub jobs_out: PathBuf,
}

/// Derives the dated run-directory path for an output name:
/// `<parent>/VS_DB_<name>_<year>_<month>_<day>`. The prefix ties the
/// directory to the artifact names the worker will write into it.
pub fn dated_run_dir(out_dir: &Path) -> PathBuf {
    let name = out_dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let parent = out_dir.parent().unwrap_or_else(|| Path::new(""));

    let now = Local::now();
    parent.join(format!(
        "{RUN_DIR_PREFIX}_{name}_{}_{}_{}",
        now.year(),
        now.month(),
        now.day()
    ))
}

/// Creates a fresh run directory with its `csvs/`, `jobs/` and
/// `jobs_out/` regions. The root must not already exist; the caller is
/// responsible for confirming removal of a conflicting directory first.
pub fn create_run_tree(root: &Path) -> Result<RunDirs> {
    if root.exists() {
        return Err(Error::DirectoryExists {
            path: root.to_path_buf(),
        });
    }

    let dirs = RunDirs {
        root: root.to_path_buf(),
        csvs: root.join("csvs"),
        jobs: root.join("jobs"),
        jobs_out: root.join("jobs_out"),
    };
    for dir in [&dirs.root, &dirs.csvs, &dirs.jobs, &dirs.jobs_out] {
        fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;
    }
    Ok(dirs)
}
