//! Completion scanning: recovering the set of successfully processed items
//! from a run directory's output layout.
//!
//! A run produces exactly one of two layouts. Screen runs drop one scored
//! `.sdf` per item into a flat `molecules/` directory, with the item name
//! embedded between the run prefix and a rank suffix. Complex runs create
//! one subdirectory per item under `complexes/`. The two strategies are
//! never mixed; a single existence check picks one.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Run-prefix token embedded in run-directory names and screen-layout
/// artifact names. The worker writes it into output filenames, so it is a
/// compatibility surface, not a cosmetic choice.
pub const RUN_DIR_PREFIX: &str = "VS_DB";

/// Screen-layout artifact names: `VS_DB_<id>_rank<digits>...sdf`. The id
/// is everything between the run prefix and the first rank token.
static SCREEN_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^VS_DB_(?P<id>.+?)_rank\d+.*\.sdf$").unwrap());

/// The two mutually exclusive output layouts a run may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Flat `molecules/` directory of per-item result files.
    Screen,
    /// One subdirectory per item under `complexes/`.
    Complex,
}

impl Layout {
    /// Picks the layout by checking which output directory exists. Exactly
    /// one must; anything else means `run_dir` is not a valid run.
    pub fn detect(run_dir: &Path) -> Result<Layout> {
        let molecules = run_dir.join("molecules");
        let complexes = run_dir.join("complexes");
        match (molecules.is_dir(), complexes.is_dir()) {
            (true, false) => Ok(Layout::Screen),
            (false, true) => Ok(Layout::Complex),
            _ => Err(Error::AmbiguousLayout {
                dir: run_dir.to_path_buf(),
            }),
        }
    }

    /// The layout's output directory inside `run_dir`.
    pub fn output_dir(&self, run_dir: &Path) -> PathBuf {
        match self {
            Layout::Screen => run_dir.join("molecules"),
            Layout::Complex => run_dir.join("complexes"),
        }
    }
}

/// Recovers the deduplicated set of item identifiers that finished
/// successfully. Read-only and idempotent: scanning an unchanged run
/// directory twice returns the identical set, at any point between zero
/// and all worker jobs having finished.
pub fn finished_items(run_dir: &Path) -> Result<HashSet<String>> {
    match Layout::detect(run_dir)? {
        Layout::Screen => {
            info!("detected screen mode, checking sdf files in molecules/");
            scan_molecules(&run_dir.join("molecules"))
        }
        Layout::Complex => {
            info!("detected complex mode, checking directories in complexes/");
            scan_complexes(&run_dir.join("complexes"))
        }
    }
}

fn scan_molecules(molecules: &Path) -> Result<HashSet<String>> {
    let entries = fs::read_dir(molecules).map_err(|e| Error::io("read", molecules, e))?;

    let mut finished = HashSet::new();
    for entry in entries.filter_map(|entry| entry.ok()) {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if let Some(caps) = SCREEN_ARTIFACT.captures(name) {
            finished.insert(caps["id"].to_string());
        } else if name.ends_with(".sdf") {
            warn!(artifact = name, "skipping result file with unrecognized name");
        }
    }
    Ok(finished)
}

fn scan_complexes(complexes: &Path) -> Result<HashSet<String>> {
    let entries = fs::read_dir(complexes).map_err(|e| Error::io("read", complexes, e))?;

    let mut finished = HashSet::new();
    for entry in entries.filter_map(|entry| entry.ok()) {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            finished.insert(name.to_string());
        }
    }
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn detect_requires_exactly_one_layout() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Layout::detect(dir.path()),
            Err(Error::AmbiguousLayout { .. })
        ));

        fs::create_dir(dir.path().join("molecules")).unwrap();
        assert_eq!(Layout::detect(dir.path()).unwrap(), Layout::Screen);

        fs::create_dir(dir.path().join("complexes")).unwrap();
        assert!(matches!(
            Layout::detect(dir.path()),
            Err(Error::AmbiguousLayout { .. })
        ));
    }

    #[test]
    fn screen_mode_extracts_ids_between_prefix_and_rank() {
        let dir = tempdir().unwrap();
        let molecules = dir.path().join("molecules");
        fs::create_dir(&molecules).unwrap();
        for name in [
            "VS_DB_LIG001_rank1_lddt0.80_affinity-7.5.sdf",
            "VS_DB_LIG001_rank2_lddt0.71_affinity-6.9.sdf",
            "VS_DB_LIG042_rank1.sdf",
            "random_file.txt",
            "unrecognized.sdf",
        ] {
            fs::write(molecules.join(name), b"").unwrap();
        }

        let finished = finished_items(dir.path()).unwrap();
        let mut ids: Vec<&str> = finished.iter().map(String::as_str).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["LIG001", "LIG042"]);
    }

    #[test]
    fn complex_mode_takes_subdirectory_names() {
        let dir = tempdir().unwrap();
        let complexes = dir.path().join("complexes");
        fs::create_dir(&complexes).unwrap();
        fs::create_dir(complexes.join("LIG001")).unwrap();
        fs::create_dir(complexes.join("LIG002")).unwrap();
        fs::write(complexes.join("stray.log"), b"").unwrap();

        let finished = finished_items(dir.path()).unwrap();
        let mut ids: Vec<&str> = finished.iter().map(String::as_str).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["LIG001", "LIG002"]);
    }

    #[test]
    fn scan_is_idempotent() {
        let dir = tempdir().unwrap();
        let molecules = dir.path().join("molecules");
        fs::create_dir(&molecules).unwrap();
        fs::write(molecules.join("VS_DB_A_rank1.sdf"), b"").unwrap();
        fs::write(molecules.join("VS_DB_B_rank1.sdf"), b"").unwrap();

        let first = finished_items(dir.path()).unwrap();
        let second = finished_items(dir.path()).unwrap();
        assert_eq!(first, second);
    }
}
