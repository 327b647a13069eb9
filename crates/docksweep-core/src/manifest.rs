//! Work items and the per-chunk manifest files handed to the worker.
//!
//! A manifest is a small `;`-delimited table, one per chunk, written under
//! `csvs/` in the run directory. The worker consumes it verbatim; this
//! module also reads manifests back to reconstruct what a previous run
//! submitted.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Error, Result};

/// Fixed manifest header. Column order is part of the worker's wire format.
pub const MANIFEST_HEADER: &str = "name;protein_path;ligand";

/// One unit of docking work: a single ligand docked against the run's
/// shared protein.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Identifier, derived from the ligand file's base name. Expected to be
    /// unique within a run; collisions are an upstream concern.
    pub name: String,
    /// Path to the ligand structure file.
    pub ligand: PathBuf,
}

impl WorkItem {
    /// Derives an item from a ligand path. The name is the base name up to
    /// the first `.`, so `LIG123.mol2` and `LIG123.sdf` both map to
    /// `LIG123`.
    pub fn from_ligand(ligand: PathBuf) -> Self {
        let name = ligand
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        Self { name, ligand }
    }
}

/// Lists the ligand structure files (`.sdf`, `.mol2`) directly under `dir`
/// and derives one [`WorkItem`] per file, sorted by path so repeated
/// invocations partition identically.
pub fn discover_ligands(dir: &Path) -> Result<Vec<WorkItem>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io("read", dir, e))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("sdf") | Some("mol2")
                )
        })
        .collect();
    paths.sort();

    Ok(paths.into_iter().map(WorkItem::from_ligand).collect())
}

/// Writes one chunk's manifest to `dest`: the fixed header plus one row per
/// item in chunk order. The write goes through a scoped temp file in the
/// destination directory and is renamed into place, so a failed write never
/// leaves a partial manifest behind.
///
/// Referenced paths are not validated; their existence is the worker's
/// concern at execution time.
pub fn write_manifest(dest: &Path, protein: &Path, items: &[WorkItem]) -> Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io("create", dest, e))?;
    writeln!(tmp, "{MANIFEST_HEADER}").map_err(|e| Error::io("write", dest, e))?;
    for item in items {
        writeln!(
            tmp,
            "{};{};{}",
            item.name,
            protein.display(),
            item.ligand.display()
        )
        .map_err(|e| Error::io("write", dest, e))?;
    }
    tmp.persist(dest)
        .map_err(|e| Error::io("write", dest, e.error))?;
    Ok(())
}

/// Reads back every manifest under `csvs_dir` and returns the submitted
/// items in a deterministic order: manifests in sorted path order, rows in
/// file order. Rows that do not parse are skipped with a warning rather
/// than aborting the read.
pub fn read_manifests(csvs_dir: &Path) -> Result<Vec<WorkItem>> {
    let entries = fs::read_dir(csvs_dir).map_err(|e| Error::io("read", csvs_dir, e))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("csv"))
        .collect();
    paths.sort();

    let mut items = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path).map_err(|e| Error::io("read", &path, e))?;
        for line in content.lines().skip(1) {
            match parse_row(line) {
                Some(item) => items.push(item),
                None => {
                    if !line.trim().is_empty() {
                        warn!(manifest = %path.display(), row = line, "skipping malformed manifest row");
                    }
                }
            }
        }
    }
    Ok(items)
}

/// Parses one manifest row. The name is the first field and the ligand the
/// last, which tolerates manifests whose middle columns grew over time.
fn parse_row(line: &str) -> Option<WorkItem> {
    let fields: Vec<&str> = line.trim().split(';').collect();
    if fields.len() < 3 {
        return None;
    }
    let name = fields[0].trim();
    let ligand = fields[fields.len() - 1].trim();
    if name.is_empty() || ligand.is_empty() {
        return None;
    }
    Some(WorkItem {
        name: name.to_string(),
        ligand: PathBuf::from(ligand),
    })
}
