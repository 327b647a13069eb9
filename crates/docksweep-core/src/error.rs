use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while bookkeeping a run directory.
///
/// Configuration errors (`AmbiguousLayout`, `MissingJobTemplate`,
/// `MissingProtein`) are fatal and carry a remediation hint in their
/// message. I/O errors are fatal for the operation that hit them.
/// Malformed artifact names and manifest rows are not errors: scanners
/// skip them with a warning and keep going.
#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "{dir} is not a valid run directory: ambiguous or missing run output, \
         expected exactly one of 'molecules/' or 'complexes/' to exist"
    )]
    AmbiguousLayout { dir: PathBuf },

    #[error(
        "no job script found under {jobs_dir}: a redo needs at least one \
         jobs/job_*.sh from the original run to use as a template"
    )]
    MissingJobTemplate { jobs_dir: PathBuf },

    #[error("job script {path} has no command line to use as a template")]
    InvalidJobTemplate { path: PathBuf },

    #[error(
        "no protein file (*.pdb) found in {dir}: manifests cannot be rebuilt \
         without the run's protein path"
    )]
    MissingProtein { dir: PathBuf },

    #[error("{path} already exists; remove it or choose another output directory")]
    DirectoryExists { path: PathBuf },

    #[error("failed to {action} {path}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scheduler submission failed: {detail}")]
    Submission { detail: String },

    #[error("scheduler did not return a job id (stdout: {stdout:?})")]
    MissingJobId { stdout: String },
}

impl Error {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Error::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
